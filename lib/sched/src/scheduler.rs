//! The request scheduler (C4, §4.4): one FIFO list per pending handle, a global
//! ready queue, a mode gate and a timer queue, behind a single `Scheduler` value.

use crate::element::{Element, ElementState, HandleList, ScheduleId};
use crate::mode::{ModeGate, ServerMode};
use crate::timer::TimerQueue;
use pvfs_support::logging::Logger;
use pvfs_support::time::Deadline;
use pvfs_types::tag::OpClass;
use pvfs_types::{Handle, PvfsError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Whether a post must wait behind a handle's pending list, or may run immediately
/// regardless of it (§4.4's "policy is bypass").
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AccessPolicy {
    Normal,
    Bypass,
}

/// Both variants carry the id: even an immediately-runnable element must later be
/// `release`d so its handle list's successor can be promoted (§4.4). `Immediate`
/// only tells the caller it need not wait for `testworld` before acting on it.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PostOutcome {
    Immediate(ScheduleId),
    Posted(ScheduleId),
}

impl PostOutcome {
    pub fn id(self) -> ScheduleId {
        match self {
            PostOutcome::Immediate(id) => id,
            PostOutcome::Posted(id) => id,
        }
    }
}

struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    fn new() -> IdGenerator {
        IdGenerator { next: AtomicU64::new(1) }
    }

    fn next(&self) -> ScheduleId {
        ScheduleId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// The single process-wide scheduler value. Every handle's list, the global ready
/// queue, the mode gate and the timer queue live behind this one owner, mirroring
/// the job engine's "one Mutex-guarded state" shape (`pvfs_job::engine::Engine`) —
/// callers in the threaded daemon wrap a `Scheduler` in their own `Mutex`.
pub struct Scheduler {
    ids: IdGenerator,
    lists: hashbrown::HashMap<Handle, HandleList>,
    locations: hashbrown::HashMap<ScheduleId, Handle>,
    ready_queue: VecDeque<ScheduleId>,
    mode: ModeGate,
    timers: TimerQueue,
    scheduled_total: usize,
    log: Logger,
}

impl Scheduler {
    pub fn new(log: Logger) -> Scheduler {
        Scheduler {
            ids: IdGenerator::new(),
            lists: hashbrown::HashMap::new(),
            locations: hashbrown::HashMap::new(),
            ready_queue: VecDeque::new(),
            mode: ModeGate::new(),
            timers: TimerQueue::new(),
            scheduled_total: 0,
            log,
        }
    }

    pub fn mode(&self) -> ServerMode {
        self.mode.mode()
    }

    /// `post(op, fsid, handle, access, policy, user_ptr)` (§4.4). `user_ptr` is left
    /// to the caller (the state-machine driver stashes its own frame pointer keyed
    /// by the returned id); this crate only ever hands ids back.
    pub fn post(&mut self, op: OpClass, policy: AccessPolicy) -> Result<PostOutcome, PvfsError> {
        if self.mode.admin_pending_or_effective() && !op.read_only && !op.admin_permitted {
            return Err(PvfsError::NotPermitted);
        }

        let id = self.ids.next();
        let list = self.lists.entry(op.handle).or_insert_with(HandleList::new);
        let immediate = policy == AccessPolicy::Bypass || list.admits_immediately(op.io_style);

        let state = if immediate { ElementState::Scheduled } else { ElementState::Queued };
        list.entries.push_back(Element { id, op, state });
        self.locations.insert(id, op.handle);

        if immediate {
            self.scheduled_total += 1;
            Ok(PostOutcome::Immediate(id))
        } else {
            Ok(PostOutcome::Posted(id))
        }
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    /// `release(id)`: drops a scheduled element, promotes its handle list's next
    /// eligible run into the ready queue, and checks whether a parked admin
    /// transition can now complete.
    pub fn release(&mut self, id: ScheduleId) -> Result<Vec<ScheduleId>, PvfsError> {
        let handle = self.locations.remove(&id).ok_or(PvfsError::InvalidArgument)?;
        let list = self.lists.get_mut(&handle).ok_or(PvfsError::InvalidArgument)?;
        let element = list.remove(id).ok_or(PvfsError::InvalidArgument)?;
        if element.state == ElementState::Scheduled {
            self.scheduled_total -= 1;
        }

        let promoted = list.promote_next_ready();
        if list.is_empty() {
            self.lists.remove(&handle);
        }
        for &p in &promoted {
            self.ready_queue.push_back(p);
        }

        let mut out = promoted;
        if let Some(admin_id) = self.mode.try_complete(self.scheduled_total) {
            self.ready_queue.push_back(admin_id);
            out.push(admin_id);
        }
        Ok(out)
    }

    /// `unpost(id)`: withdraws a request that has not yet completed. Removes it from
    /// the ready queue if it was waiting there; if it was head-of-line its successor
    /// is promoted by the same rule `release` uses.
    pub fn unpost(&mut self, id: ScheduleId) -> Result<(), PvfsError> {
        let handle = self.locations.remove(&id).ok_or(PvfsError::InvalidArgument)?;
        self.ready_queue.retain(|&r| r != id);

        let list = self.lists.get_mut(&handle).ok_or(PvfsError::InvalidArgument)?;
        let element = list.remove(id).ok_or(PvfsError::InvalidArgument)?;
        if element.state == ElementState::Scheduled {
            self.scheduled_total -= 1;
        }

        let promoted = list.promote_next_ready();
        for &p in &promoted {
            self.ready_queue.push_back(p);
        }
        if list.is_empty() {
            self.lists.remove(&handle);
        }
        Ok(())
    }

    /// `testworld(max)`: drains the ready queue first, then expired timers, up to
    /// `max` combined entries. Elements drained from the ready queue transition to
    /// `Scheduled`.
    pub fn testworld(&mut self, max: usize, now: Instant) -> Vec<ScheduleId> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.ready_queue.pop_front() {
                Some(id) => {
                    if let Some(handle) = self.locations.get(&id) {
                        if let Some(list) = self.lists.get_mut(handle) {
                            if let Some(e) = list.find_mut(id) {
                                e.state = ElementState::Scheduled;
                                self.scheduled_total += 1;
                            }
                        }
                    }
                    out.push(id);
                }
                None => break,
            }
        }
        let remaining = max - out.len();
        if remaining > 0 {
            out.extend(self.timers.drain_expired(now, remaining));
        }
        out
    }

    /// `post_timer(msecs) → Posted(id)`: always posted, never immediate.
    pub fn post_timer(&mut self, after: Deadline) -> ScheduleId {
        let id = self.ids.next();
        self.timers.post(id, after);
        id
    }

    pub fn unpost_timer(&mut self, id: ScheduleId) {
        self.timers.remove(id);
    }

    /// Requests a transition to *admin* mode. Parks on the mode queue until every
    /// scheduled element has released if the engine is not already idle.
    pub fn request_admin_mode(&mut self) -> PostOutcome {
        let id = self.ids.next();
        match self.mode.request_admin(id, self.scheduled_total) {
            None => PostOutcome::Immediate(id),
            Some(id) => PostOutcome::Posted(id),
        }
    }

    /// Requests a transition to *normal* mode; always applies immediately (§4.4).
    pub fn request_normal_mode(&mut self) {
        self.mode.to_normal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::tag::RequestTag;
    use pvfs_types::FsId;
    use std::time::Duration;

    fn op(tag: RequestTag, handle: Handle) -> OpClass {
        OpClass::new(tag, handle, FsId(1), false)
    }

    #[test]
    fn second_request_on_same_handle_is_posted_not_immediate() {
        let mut sched = Scheduler::new(pvfs_support::logging::discard());
        let h = Handle::new(5);

        let first = sched.post(op(RequestTag::GetAttr, h), AccessPolicy::Normal).unwrap();
        assert!(matches!(first, PostOutcome::Immediate(_)));

        let second = sched.post(op(RequestTag::SetAttr, h), AccessPolicy::Normal).unwrap();
        assert!(matches!(second, PostOutcome::Posted(_)));
    }

    #[test]
    fn release_promotes_successor_into_ready_queue() {
        let mut sched = Scheduler::new(pvfs_support::logging::discard());
        let h = Handle::new(5);

        let first_id = sched.post(op(RequestTag::GetAttr, h), AccessPolicy::Normal).unwrap().id();
        let second_id = sched.post(op(RequestTag::SetAttr, h), AccessPolicy::Normal).unwrap().id();

        let promoted = sched.release(first_id).unwrap();
        assert_eq!(promoted, vec![second_id]);

        let drained = sched.testworld(10, Instant::now());
        assert_eq!(drained, vec![second_id]);
    }

    #[test]
    fn timer_drains_in_deadline_order() {
        let mut sched = Scheduler::new(pvfs_support::logging::discard());
        let a = sched.post_timer(Deadline::after(Duration::from_millis(20)));
        let b = sched.post_timer(Deadline::after(Duration::from_millis(5)));

        let later = Instant::now() + Duration::from_millis(30);
        let drained = sched.testworld(10, later);
        assert_eq!(drained, vec![b, a]);
    }

    #[test]
    fn admin_mode_gate_rejects_non_admin_write_while_pending() {
        let mut sched = Scheduler::new(pvfs_support::logging::discard());
        let h = Handle::new(1);
        sched.post(op(RequestTag::GetAttr, h), AccessPolicy::Normal).unwrap();

        let outcome = sched.request_admin_mode();
        assert!(matches!(outcome, PostOutcome::Posted(_)));

        let rejected = sched.post(op(RequestTag::SetAttr, Handle::new(2)), AccessPolicy::Normal);
        assert_eq!(rejected, Err(PvfsError::NotPermitted));
    }
}
