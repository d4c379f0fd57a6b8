//! S1 — per-handle FIFO ordering (§4.4, §8 scenario S1).

use pvfs_sched::{AccessPolicy, PostOutcome, Scheduler};
use pvfs_types::tag::{OpClass, RequestTag};
use pvfs_types::{FsId, Handle};

fn op(tag: RequestTag, handle: Handle) -> OpClass {
    OpClass::new(tag, handle, FsId(1), false)
}

#[test]
fn fifo_ordering_on_one_handle_with_an_unrelated_handle_interleaved() {
    let mut sched = Scheduler::new(pvfs_support::logging::discard());
    let h5 = Handle::new(5);
    let h6 = Handle::new(6);

    let post1 = sched.post(op(RequestTag::GetAttr, h5), AccessPolicy::Normal).unwrap();
    assert!(matches!(post1, PostOutcome::Immediate(_)));
    let id1 = post1.id();

    let post2 = sched.post(op(RequestTag::SetAttr, h5), AccessPolicy::Normal).unwrap();
    assert!(matches!(post2, PostOutcome::Posted(_)));
    let id2 = post2.id();

    let post3 = sched.post(op(RequestTag::GetAttr, h6), AccessPolicy::Normal).unwrap();
    assert!(matches!(post3, PostOutcome::Immediate(_)));
    let id3 = post3.id();

    let post4 = sched.post(op(RequestTag::SetAttr, h5), AccessPolicy::Normal).unwrap();
    assert!(matches!(post4, PostOutcome::Posted(_)));
    let id4 = post4.id();

    let ready_now = sched.testworld(10, std::time::Instant::now());
    assert!(!ready_now.contains(&id2), "id2 must not be ready before id1 releases");

    let promoted = sched.release(id1).unwrap();
    assert_eq!(promoted, vec![id2]);
    let ready_after = sched.testworld(10, std::time::Instant::now());
    assert_eq!(ready_after, vec![id2]);

    sched.release(id3).unwrap();
    sched.release(id2).unwrap();
    sched.release(id4).unwrap();
}
