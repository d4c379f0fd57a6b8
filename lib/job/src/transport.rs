//! The out-of-scope collaborators (§1, §4.2): network transport, storage backend and
//! flow engine are modeled as trait objects. Each owns exactly one completion channel,
//! mirroring `net::endpoint::Endpoint`'s single-owner poll loop, generalized from
//! epoll-style readiness to channel-style completions, since BMI/
//! Trove/the flow protocol are collaborators this crate does not reimplement.

use crate::descriptor::JobId;
use pvfs_types::Handle;
use std::sync::mpsc::Receiver;

/// Outcome of a network send/recv completion (§4.2).
#[derive(Copy, Clone, Debug)]
pub struct NetworkCompletion {
    pub id: JobId,
    pub error_code: i32,
    pub actual_size: u64,
}

/// Outcome of a storage operation completion (§4.2).
#[derive(Copy, Clone, Debug)]
pub struct StorageCompletion {
    pub id: JobId,
    pub error_code: i32,
    pub vtag: u64,
    pub handle: Option<Handle>,
    pub count: u64,
}

/// Outcome of a flow completion (§4.2). `mutex_already_held` mirrors the source's
/// cancel-thread callback convention: when a flow is torn down by the cancel path the
/// completion mutex is already held by the caller, so the shim must not try to
/// re-acquire it.
#[derive(Copy, Clone, Debug)]
pub struct FlowCompletion {
    pub id: JobId,
    pub error_code: i32,
    pub bytes_transferred: u64,
    pub mutex_already_held: bool,
}

/// Posts network send/recv operations and surrenders their outcome on `completions`.
/// Cancel-by-id is supported; a canceled op always completes through the callback
/// path (§4.2) — `cancel` only requests it, it does not complete the job itself.
pub trait NetworkTransport: Send {
    fn post_send(&self, id: JobId, dest: &str, size: u64);
    fn post_recv(&self, id: JobId, size: u64);
    fn post_unexpected_recv(&self, id: JobId);
    fn cancel(&self, id: JobId);
    fn completions(&self) -> &Receiver<NetworkCompletion>;
    /// Single-threaded build's pump hook: drives one unit of progress without blocking.
    fn poll_once(&self);
}

/// Posts storage operations (§4.2: byte-stream, keyval, dataspace, collection ops are
/// all folded into one completion shape here since this crate models the backend's
/// call surface, not its on-disk format per the Non-goals).
pub trait StorageBackend: Send {
    fn post_read(&self, id: JobId, handle: Handle, size: u64);
    fn post_write(&self, id: JobId, handle: Handle, size: u64);
    fn post_dspace_create(&self, id: JobId);
    fn post_dspace_remove(&self, id: JobId, handle: Handle);
    fn post_dspace_getattr(&self, id: JobId, handle: Handle);
    fn post_dspace_setattr(&self, id: JobId, handle: Handle);
    fn cancel(&self, id: JobId);
    fn completions(&self) -> &Receiver<StorageCompletion>;
    fn poll_once(&self);
}

/// Posts a flow descriptor; completion reports final error code and bytes
/// transferred (§4.2).
pub trait FlowEngine: Send {
    fn post_flow(&self, id: JobId, size: u64);
    fn cancel(&self, id: JobId);
    fn completions(&self) -> &Receiver<FlowCompletion>;
    fn poll_once(&self);
}

pub mod stub {
    //! In-process stand-ins used by tests and by the admin/runner binaries: every post
    //! completes immediately (or on the next `poll_once`) with success, since this
    //! crate's job is to exercise the C3 engine's bookkeeping, not to talk to a real
    //! transport. `poll_once` must still be pumped by whatever drives the engine
    //! (`Engine::pump_transports`, called from both the threaded drain thread and
    //! `wait_or_pump`'s single-threaded arm) — that's what moves a post from `pending`
    //! onto the completion channel.

    use super::*;
    use std::sync::mpsc::{channel, Sender};
    use std::sync::Mutex;

    pub struct StubNetwork {
        tx: Sender<NetworkCompletion>,
        rx: Receiver<NetworkCompletion>,
        pending: Mutex<Vec<(JobId, u64)>>,
    }

    impl StubNetwork {
        pub fn new() -> StubNetwork {
            let (tx, rx) = channel();
            StubNetwork { tx, rx, pending: Mutex::new(Vec::new()) }
        }

        fn queue(&self, id: JobId, size: u64) {
            self.pending.lock().expect("stub network mutex poisoned").push((id, size));
        }
    }

    impl NetworkTransport for StubNetwork {
        fn post_send(&self, id: JobId, _dest: &str, size: u64) {
            self.queue(id, size);
        }

        fn post_recv(&self, id: JobId, size: u64) {
            self.queue(id, size);
        }

        fn post_unexpected_recv(&self, id: JobId) {
            self.queue(id, 0);
        }

        fn cancel(&self, id: JobId) {
            let _ = self.tx.send(NetworkCompletion { id, error_code: -8, actual_size: 0 });
        }

        fn completions(&self) -> &Receiver<NetworkCompletion> {
            &self.rx
        }

        fn poll_once(&self) {
            let mut pending = self.pending.lock().expect("stub network mutex poisoned");
            for (id, size) in pending.drain(..) {
                let _ = self.tx.send(NetworkCompletion { id, error_code: 0, actual_size: size });
            }
        }
    }

    pub struct StubStorage {
        tx: Sender<StorageCompletion>,
        rx: Receiver<StorageCompletion>,
        pending: Mutex<Vec<JobId>>,
    }

    impl StubStorage {
        pub fn new() -> StubStorage {
            let (tx, rx) = channel();
            StubStorage { tx, rx, pending: Mutex::new(Vec::new()) }
        }

        fn queue(&self, id: JobId) {
            self.pending.lock().expect("stub storage mutex poisoned").push(id);
        }
    }

    impl StorageBackend for StubStorage {
        fn post_read(&self, id: JobId, _handle: Handle, _size: u64) {
            self.queue(id);
        }

        fn post_write(&self, id: JobId, _handle: Handle, _size: u64) {
            self.queue(id);
        }

        fn post_dspace_create(&self, id: JobId) {
            self.queue(id);
        }

        fn post_dspace_remove(&self, id: JobId, _handle: Handle) {
            self.queue(id);
        }

        fn post_dspace_getattr(&self, id: JobId, _handle: Handle) {
            self.queue(id);
        }

        fn post_dspace_setattr(&self, id: JobId, _handle: Handle) {
            self.queue(id);
        }

        fn cancel(&self, id: JobId) {
            let _ = self.tx.send(StorageCompletion { id, error_code: -8, vtag: 0, handle: None, count: 0 });
        }

        fn completions(&self) -> &Receiver<StorageCompletion> {
            &self.rx
        }

        fn poll_once(&self) {
            let mut pending = self.pending.lock().expect("stub storage mutex poisoned");
            for id in pending.drain(..) {
                let _ = self.tx.send(StorageCompletion { id, error_code: 0, vtag: 0, handle: None, count: 0 });
            }
        }
    }

    pub struct StubFlow {
        tx: Sender<FlowCompletion>,
        rx: Receiver<FlowCompletion>,
        pending: Mutex<Vec<(JobId, u64)>>,
    }

    impl StubFlow {
        pub fn new() -> StubFlow {
            let (tx, rx) = channel();
            StubFlow { tx, rx, pending: Mutex::new(Vec::new()) }
        }
    }

    impl FlowEngine for StubFlow {
        fn post_flow(&self, id: JobId, size: u64) {
            self.pending.lock().expect("stub flow mutex poisoned").push((id, size));
        }

        fn cancel(&self, id: JobId) {
            let _ = self.tx.send(FlowCompletion { id, error_code: -8, bytes_transferred: 0, mutex_already_held: false });
        }

        fn completions(&self) -> &Receiver<FlowCompletion> {
            &self.rx
        }

        fn poll_once(&self) {
            let mut pending = self.pending.lock().expect("stub flow mutex poisoned");
            for (id, size) in pending.drain(..) {
                let _ = self.tx.send(FlowCompletion { id, error_code: 0, bytes_transferred: size, mutex_already_held: false });
            }
        }
    }
}
