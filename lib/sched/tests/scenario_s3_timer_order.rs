//! S3 — timer order (§4.4, §8 scenario S3).

use pvfs_sched::Scheduler;
use pvfs_support::time::Deadline;
use std::time::{Duration, Instant};

#[test]
fn shorter_timer_posted_second_still_fires_first() {
    let mut sched = Scheduler::new(pvfs_support::logging::discard());

    let t1 = sched.post_timer(Deadline::after(Duration::from_millis(1500)));
    let t2 = sched.post_timer(Deadline::after(Duration::from_millis(1000)));

    let far_future = Instant::now() + Duration::from_millis(2000);
    let drained = sched.testworld(usize::MAX, far_future);
    assert_eq!(drained, vec![t2, t1]);
}
