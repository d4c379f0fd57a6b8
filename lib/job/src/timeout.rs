use crate::descriptor::JobId;
use pvfs_support::time::Deadline;
use std::time::Instant;

/// One tracked network/flow job with a deadline (§4.3.3).
struct TimeoutEntry {
    id: JobId,
    deadline: Deadline,
}

/// Monotonic-time-ordered queue of outstanding deadlines, drained by the pump
/// (§5 "Cancellation & timeouts"). Kept as a sorted `Vec` rather than a `BinaryHeap`
/// since `reset_timeout` and cancellation need to find and remove an arbitrary
/// entry by id, which a heap does not support directly.
pub struct TimeoutManager {
    entries: Vec<TimeoutEntry>,
}

impl TimeoutManager {
    pub fn new() -> TimeoutManager {
        TimeoutManager { entries: Vec::new() }
    }

    /// Starts tracking `id` against `deadline`. Insertion keeps `entries` sorted by
    /// deadline so `expired` only has to scan from the front.
    pub fn track(&mut self, id: JobId, deadline: Deadline) {
        let pos = self
            .entries
            .iter()
            .position(|e| e.deadline.instant() > deadline.instant())
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, TimeoutEntry { id, deadline });
    }

    /// Removes `id` from tracking, e.g. because it completed normally.
    pub fn untrack(&mut self, id: JobId) {
        self.entries.retain(|e| e.id != id);
    }

    /// Resets `id`'s deadline in place, re-sorting its position (§4.3.3:
    /// "the mutex is acquired around the id lookup and list surgery").
    pub fn reset(&mut self, id: JobId, deadline: Deadline) {
        self.untrack(id);
        self.track(id, deadline);
    }

    /// Returns every id whose deadline has passed `now`, removing them from tracking.
    pub fn expired(&mut self, now: Instant) -> Vec<JobId> {
        let mut out = Vec::new();
        while let Some(first) = self.entries.first() {
            if first.deadline.is_expired(now) {
                out.push(self.entries.remove(0).id);
            } else {
                break;
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
    fn expired_returns_entries_in_deadline_order() {
        let mut mgr = TimeoutManager::new();
        let base = Instant::now();
        mgr.track(JobId(1), Deadline::after(Duration::from_millis(20)));
        mgr.track(JobId(2), Deadline::after(Duration::from_millis(5)));

        let later = base + Duration::from_millis(30);
        let expired = mgr.expired(later);
        assert_eq!(expired, vec![JobId(2), JobId(1)]);
        assert!(mgr.is_empty());
    }

    #[test]
    fn untrack_removes_pending_entry() {
        let mut mgr = TimeoutManager::new();
        mgr.track(JobId(1), Deadline::after(Duration::from_millis(1)));
        mgr.untrack(JobId(1));
        assert!(mgr.is_empty());
    }
}
