//! S2 — concurrent I/O relaxation (§4.4, §8 scenario S2).
//!
//! The Invariants section states the relaxation with no cap: "all such contiguous
//! I/O elements may be scheduled simultaneously". This crate follows that rule
//! rather than the illustrative scenario text's two-at-a-time framing (see
//! DESIGN.md's Open Question resolution) — every contiguous run of I/O-style
//! elements posted at a handle's head, with no non-I/O element breaking it, is
//! admitted immediately.

use pvfs_sched::{AccessPolicy, PostOutcome, Scheduler};
use pvfs_types::tag::{OpClass, RequestTag};
use pvfs_types::{FsId, Handle};

fn io_op(handle: Handle) -> OpClass {
    OpClass::new(RequestTag::Io, handle, FsId(1), false)
}

#[test]
fn contiguous_io_run_is_all_admitted_immediately() {
    let mut sched = Scheduler::new(pvfs_support::logging::discard());
    let h = Handle::new(5);

    for _ in 0..4 {
        let outcome = sched.post(io_op(h), AccessPolicy::Normal).unwrap();
        assert!(matches!(outcome, PostOutcome::Immediate(_)), "contiguous I/O must not wait");
    }
}

#[test]
fn a_non_io_element_breaks_the_contiguous_run() {
    let mut sched = Scheduler::new(pvfs_support::logging::discard());
    let h = Handle::new(5);

    let first = sched.post(io_op(h), AccessPolicy::Normal).unwrap();
    assert!(matches!(first, PostOutcome::Immediate(_)));

    let write = sched.post(OpClass::new(RequestTag::SetAttr, h, FsId(1), false), AccessPolicy::Normal).unwrap();
    assert!(matches!(write, PostOutcome::Posted(_)));

    let next_io = sched.post(io_op(h), AccessPolicy::Normal).unwrap();
    assert!(matches!(next_io, PostOutcome::Posted(_)), "must queue behind the non-I/O element ahead of it");

    let promoted = sched.release(first.id()).unwrap();
    assert_eq!(promoted, vec![write.id()]);
}
