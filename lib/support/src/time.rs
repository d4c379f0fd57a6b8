use std::time::{Duration, Instant, SystemTime};

/// Returns the current unix timestamp (seconds elapsed since 1970-01-01).
#[inline]
pub fn timestamp_secs() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("Closed timelike curve, reality compromised")
        .as_secs() as i64
}

/// A monotonic deadline, used by the job engine's timeout manager and the scheduler's
/// timer queue. Wraps `Instant` rather than a raw duration so that `reset` cannot produce
/// a deadline earlier than "now" by surprise.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Deadline(Instant);

impl Deadline {
    #[inline]
    pub fn after(duration: Duration) -> Deadline {
        Deadline(Instant::now() + duration)
    }

    /// A deadline that never expires, for jobs posted with an infinite timeout.
    #[inline]
    pub fn infinite() -> Deadline {
        Deadline(Instant::now() + Duration::from_secs(60 * 60 * 24 * 365 * 100))
    }

    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.0
    }

    #[inline]
    pub fn instant(&self) -> Instant {
        self.0
    }
}
