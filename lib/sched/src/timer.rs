//! The global timer queue (§4.4 "Timer"): scheduler entries ordered by absolute
//! deadline, independent of any handle's list.

use crate::element::ScheduleId;
use pvfs_support::time::Deadline;
use std::time::Instant;

struct TimerEntry {
    id: ScheduleId,
    deadline: Deadline,
}

/// Sorted-insertion timer queue, mirroring `pvfs_job::timeout::TimeoutManager`'s
/// shape but keyed by `ScheduleId` rather than `JobId` since scheduler timers are
/// not job-engine jobs.
pub struct TimerQueue {
    entries: Vec<TimerEntry>,
}

impl TimerQueue {
    pub fn new() -> TimerQueue {
        TimerQueue { entries: Vec::new() }
    }

    pub fn post(&mut self, id: ScheduleId, deadline: Deadline) {
        let pos = self
            .entries
            .iter()
            .position(|e| e.deadline.instant() > deadline.instant())
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, TimerEntry { id, deadline });
    }

    pub fn remove(&mut self, id: ScheduleId) {
        self.entries.retain(|e| e.id != id);
    }

    /// Removes and returns every timer whose deadline has passed `now`, in deadline
    /// order, up to `max`.
    pub fn drain_expired(&mut self, now: Instant, max: usize) -> Vec<ScheduleId> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.entries.first() {
                Some(first) if first.deadline.is_expired(now) => out.push(self.entries.remove(0).id),
                _ => break,
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn drains_in_deadline_order_and_respects_max() {
        let mut q = TimerQueue::new();
        let base = Instant::now();
        q.post(ScheduleId(1), Deadline::after(Duration::from_millis(30)));
        q.post(ScheduleId(2), Deadline::after(Duration::from_millis(10)));
        q.post(ScheduleId(3), Deadline::after(Duration::from_millis(20)));

        let later = base + Duration::from_millis(40);
        let drained = q.drain_expired(later, 2);
        assert_eq!(drained, vec![ScheduleId(2), ScheduleId(3)]);
        assert_eq!(q.drain_expired(later, 10), vec![ScheduleId(1)]);
        assert!(q.is_empty());
    }
}
