//! The job engine (C3) and the thread-manager shims (C2): a uniform post/test API
//! over network, storage and flow completions, plus precreate-pool handle management.

pub mod context;
pub mod descriptor;
pub mod engine;
pub mod precreate;
pub mod shim;
pub mod timeout;
pub mod transport;

pub use context::{ContextTable, MAX_CONTEXTS};
pub use descriptor::{ContextId, JobDescriptor, JobId, JobKindTag, JobStatus};
pub use engine::{Engine, EngineMode, PostOutcome};
pub use precreate::PoolCursor;
pub use shim::ThreadManager;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::{StubFlow, StubNetwork, StubStorage};
    use pvfs_support::time::Deadline;
    use pvfs_types::{FsId, Handle};
    use std::time::Duration;

    fn single_threaded_engine() -> Engine {
        Engine::new(
            EngineMode::SingleThreaded,
            Box::new(StubNetwork::new()),
            Box::new(StubStorage::new()),
            Box::new(StubFlow::new()),
            pvfs_support::logging::discard(),
        )
    }

    #[test]
    fn post_null_completes_immediately() {
        let engine = single_threaded_engine();
        let ctx = engine.open_context().unwrap();
        let id = engine.post_null(0, 42, ctx).unwrap();
        let completed = engine.test(id, ctx, Duration::from_millis(50)).unwrap().unwrap();
        assert!(completed.completed);
        assert_eq!(completed.user_tag, 42);
    }

    #[test]
    fn network_send_completes_through_stub_pump() {
        let engine = single_threaded_engine();
        let ctx = engine.open_context().unwrap();
        let id = engine.post_network_send("peer", 128, 0, ctx, Deadline::infinite()).unwrap();
        let completed = engine.test(id, ctx, Duration::from_millis(200)).unwrap();
        assert!(completed.is_some());
    }

    #[test]
    fn testsome_waits_for_every_id() {
        let engine = single_threaded_engine();
        let ctx = engine.open_context().unwrap();
        let a = engine.post_null(0, 1, ctx).unwrap();
        let b = engine.post_network_recv(16, 2, ctx, Deadline::infinite()).unwrap();

        let batch = engine.testsome(&[a, b], ctx, Duration::from_millis(200)).unwrap();
        let batch = batch.expect("both jobs should complete within the timeout");
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn cancel_is_idempotent_after_completion() {
        let engine = single_threaded_engine();
        let ctx = engine.open_context().unwrap();
        let id = engine.post_null(0, 0, ctx).unwrap();
        engine.test(id, ctx, Duration::from_millis(50)).unwrap();
        assert!(engine.cancel(id).is_ok());
    }

    #[test]
    fn pool_get_handle_parks_until_filled() {
        let engine = single_threaded_engine();
        let ctx = engine.open_context().unwrap();
        let fsid = FsId(1);
        let pool_handle = Handle::new(0x10);

        let (outcome, handle) = engine.pool_get_handle(fsid, pool_handle, ctx).unwrap();
        assert!(matches!(outcome, PostOutcome::Posted(_)));
        assert!(handle.is_none());

        engine.pool_fill(pool_handle, fsid, &[Handle::new(1)], ctx).unwrap();

        let (outcome2, handle2) = engine.pool_get_handle(fsid, pool_handle, ctx).unwrap();
        assert_eq!(outcome2, PostOutcome::Immediate);
        assert!(handle2.is_some());
    }
}
