//! Scheduler elements and per-handle lists (§3 "Scheduler list", §4.4).

use pvfs_types::tag::OpClass;
use std::collections::VecDeque;

/// Unique id for one posted request, allocated by the scheduler's own generator.
/// Distinct from a job-engine `JobId`: a scheduler entry may outlive several job
/// postings while it waits for its turn on the handle's list.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ScheduleId(pub u64);

/// A scheduler element's state is exactly one of these four (§3). `Timing` is used
/// only by timer elements, which live in the timer queue rather than a handle list.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ElementState {
    Queued,
    ReadyToSchedule,
    Scheduled,
    Timing,
}

/// One pending or running request against a handle.
pub struct Element {
    pub id: ScheduleId,
    pub op: OpClass,
    pub state: ElementState,
}

/// The ordered list kept per pending handle (§3): head is executing or
/// ready-to-execute, the rest are queued behind it.
pub struct HandleList {
    pub entries: VecDeque<Element>,
}

impl HandleList {
    pub fn new() -> HandleList {
        HandleList { entries: VecDeque::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if every entry from the head up to and including `upto` is I/O-style,
    /// i.e. the concurrent I/O relaxation (§3 invariant) applies through that point.
    fn contiguous_io_through(&self, upto: usize) -> bool {
        self.entries.iter().take(upto + 1).all(|e| e.op.io_style)
    }

    /// Whether a new request for this handle may run immediately: the list is empty,
    /// or the new request is I/O and every entry already at the head is also I/O.
    pub fn admits_immediately(&self, incoming_io: bool) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        incoming_io && self.entries.iter().all(|e| e.op.io_style && e.state == ElementState::Scheduled)
    }

    /// After the head (or a contiguous I/O run at the head) releases, promotes the
    /// next eligible run to `ReadyToSchedule` and returns their ids.
    pub fn promote_next_ready(&mut self) -> Vec<ScheduleId> {
        let mut promoted = Vec::new();
        let mut i = 0;
        while let Some(entry) = self.entries.get(i) {
            if entry.state != ElementState::Queued {
                break;
            }
            let is_io = entry.op.io_style;
            if i == 0 || (is_io && self.contiguous_io_through(i)) {
                promoted.push(entry.id);
                i += 1;
                if !is_io {
                    break;
                }
            } else {
                break;
            }
        }
        for id in &promoted {
            if let Some(e) = self.entries.iter_mut().find(|e| e.id == *id) {
                e.state = ElementState::ReadyToSchedule;
            }
        }
        promoted
    }

    pub fn remove(&mut self, id: ScheduleId) -> Option<Element> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        self.entries.remove(pos)
    }

    pub fn find_mut(&mut self, id: ScheduleId) -> Option<&mut Element> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}
