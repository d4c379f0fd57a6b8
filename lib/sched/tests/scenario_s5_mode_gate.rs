//! S5 — mode gate (§4.4, §8 scenario S5).

use pvfs_sched::{AccessPolicy, PostOutcome, ServerMode, Scheduler};
use pvfs_types::tag::{OpClass, RequestTag};
use pvfs_types::{FsId, Handle, PvfsError};

fn write(handle: Handle, admin_permitted: bool) -> OpClass {
    OpClass::new(RequestTag::SetAttr, handle, FsId(1), admin_permitted)
}

#[test]
fn admin_transition_waits_for_both_writes_and_rejects_interim_writes() {
    let mut sched = Scheduler::new(pvfs_support::logging::discard());
    let h1 = Handle::new(1);
    let h2 = Handle::new(2);

    let w1 = sched.post(write(h1, false), AccessPolicy::Normal).unwrap();
    let w2 = sched.post(write(h2, false), AccessPolicy::Normal).unwrap();
    assert!(matches!(w1, PostOutcome::Immediate(_)));
    assert!(matches!(w2, PostOutcome::Immediate(_)));

    let admin_change = sched.request_admin_mode();
    assert!(matches!(admin_change, PostOutcome::Posted(_)));
    assert_eq!(sched.mode(), ServerMode::Normal);

    let rejected = sched.post(write(Handle::new(3), false), AccessPolicy::Normal);
    assert_eq!(rejected, Err(PvfsError::NotPermitted));

    let permitted = sched.post(write(Handle::new(3), true), AccessPolicy::Normal).unwrap();
    assert!(matches!(permitted, PostOutcome::Immediate(_)));
    sched.release(permitted.id()).unwrap();

    sched.release(w1.id()).unwrap();
    assert_eq!(sched.mode(), ServerMode::Normal);

    let ready = sched.release(w2.id()).unwrap();
    assert_eq!(ready, vec![admin_change.id()]);
    assert_eq!(sched.mode(), ServerMode::Admin);
}
