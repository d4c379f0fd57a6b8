use crate::context::ContextTable;
use crate::descriptor::{ContextId, JobDescriptor, JobId, JobIdGenerator, JobKindTag, JobStatus};
use crate::precreate::{PoolCursor, PrecreatePool};
use crate::transport::{FlowEngine, NetworkTransport, StorageBackend};
use hashbrown::HashMap;
use pvfs_support::logging::Logger;
use pvfs_support::time::Deadline;
use crate::timeout::TimeoutManager;
use pvfs_types::{FsId, Handle, PvfsError};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Build-time concurrency toggle, selected at `Engine::new` (§4.3.1's "compile-time or
/// init-time toggle" — init-time here, so both modes are testable in one binary).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EngineMode {
    Threaded,
    SingleThreaded,
}

/// What a `post_*` call hands back immediately (§4.3.1).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PostOutcome {
    Immediate,
    Posted(JobId),
}

struct EngineState {
    contexts: ContextTable,
    timeouts: TimeoutManager,
    pools: PrecreatePool,
    /// Jobs posted but not yet completed, keyed by id so a completion from any shim
    /// can be routed back to its context.
    inflight: HashMap<JobId, JobDescriptor>,
    live: bool,
}

/// The process-wide engine value the "Global mutable state" Design Note asks for: one
/// value owns the completion-queue array, the precreate-pool directory and the
/// initialized flag, instead of scattered process-global tables.
pub struct Engine {
    state: Mutex<EngineState>,
    completed: Condvar,
    ids: JobIdGenerator,
    mode: EngineMode,
    network: Box<dyn NetworkTransport>,
    storage: Box<dyn StorageBackend>,
    flow: Box<dyn FlowEngine>,
    log: Logger,
}

impl Engine {
    pub fn new(
        mode: EngineMode,
        network: Box<dyn NetworkTransport>,
        storage: Box<dyn StorageBackend>,
        flow: Box<dyn FlowEngine>,
        log: Logger,
    ) -> Engine {
        Engine {
            state: Mutex::new(EngineState {
                contexts: ContextTable::new(),
                timeouts: TimeoutManager::new(),
                pools: PrecreatePool::new(),
                inflight: HashMap::new(),
                live: true,
            }),
            completed: Condvar::new(),
            ids: JobIdGenerator::new(),
            mode,
            network,
            storage,
            flow,
            log,
        }
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn open_context(&self) -> Result<ContextId, PvfsError> {
        self.state.lock().expect("engine mutex poisoned").contexts.open_context()
    }

    pub fn close_context(&self, ctx: ContextId) -> Result<(), PvfsError> {
        self.state.lock().expect("engine mutex poisoned").contexts.close_context(ctx)
    }

    /// Finalize: marks the engine dead so late shim callbacks after this point become
    /// no-ops (§5's "initialized flag mutex"), per the Design Note's drain order
    /// (flows, network, storage, context queues, id generator) — the context drop is
    /// left to the caller dropping the `Engine` value itself.
    pub fn finalize(&self) {
        self.state.lock().expect("engine mutex poisoned").live = false;
    }

    /// Places an already-completed descriptor on `ctx`'s queue immediately (§4.3.5).
    pub fn post_null(&self, error_code: i32, user_tag: u64, ctx: ContextId) -> Result<JobId, PvfsError> {
        let id = self.ids.next();
        let mut descriptor = JobDescriptor::new(id, JobKindTag::Null, ctx, user_tag);
        descriptor.complete(JobStatus::Null { error_code });
        let mut state = self.state.lock().expect("engine mutex poisoned");
        state.contexts.slot_mut(ctx)?.push(descriptor);
        drop(state);
        self.completed.notify_all();
        Ok(id)
    }

    pub fn post_network_send(&self, dest: &str, size: u64, user_tag: u64, ctx: ContextId, timeout: Deadline) -> Result<JobId, PvfsError> {
        let id = self.ids.next();
        self.register_inflight(id, JobKindTag::NetworkSend, ctx, user_tag, Some(timeout))?;
        self.network.post_send(id, dest, size);
        Ok(id)
    }

    pub fn post_network_recv(&self, size: u64, user_tag: u64, ctx: ContextId, timeout: Deadline) -> Result<JobId, PvfsError> {
        let id = self.ids.next();
        self.register_inflight(id, JobKindTag::NetworkRecv, ctx, user_tag, Some(timeout))?;
        self.network.post_recv(id, size);
        Ok(id)
    }

    pub fn post_unexpected_recv(&self, user_tag: u64, ctx: ContextId) -> Result<JobId, PvfsError> {
        let id = self.ids.next();
        self.register_inflight(id, JobKindTag::UnexpectedRecv, ctx, user_tag, None)?;
        self.network.post_unexpected_recv(id);
        Ok(id)
    }

    pub fn post_storage_read(&self, handle: Handle, size: u64, user_tag: u64, ctx: ContextId) -> Result<JobId, PvfsError> {
        let id = self.ids.next();
        self.register_inflight(id, JobKindTag::Storage, ctx, user_tag, None)?;
        self.storage.post_read(id, handle, size);
        Ok(id)
    }

    pub fn post_storage_write(&self, handle: Handle, size: u64, user_tag: u64, ctx: ContextId) -> Result<JobId, PvfsError> {
        let id = self.ids.next();
        self.register_inflight(id, JobKindTag::Storage, ctx, user_tag, None)?;
        self.storage.post_write(id, handle, size);
        Ok(id)
    }

    pub fn post_flow(&self, size: u64, user_tag: u64, ctx: ContextId, timeout: Deadline) -> Result<JobId, PvfsError> {
        let id = self.ids.next();
        self.register_inflight(id, JobKindTag::Flow, ctx, user_tag, Some(timeout))?;
        self.flow.post_flow(id, size);
        Ok(id)
    }

    fn register_inflight(
        &self,
        id: JobId,
        kind: JobKindTag,
        ctx: ContextId,
        user_tag: u64,
        timeout: Option<Deadline>,
    ) -> Result<(), PvfsError> {
        let descriptor = JobDescriptor::new(id, kind, ctx, user_tag);
        let mut state = self.state.lock().expect("engine mutex poisoned");
        // Validate the context exists before the shim is ever told about the job.
        state.contexts.slot(ctx)?;
        if let Some(deadline) = timeout {
            state.timeouts.track(id, deadline);
        }
        state.inflight.insert(id, descriptor);
        Ok(())
    }

    /// Precreate-pool jobs (§4.3.6). `pool_fill` writes a batch of handles and wakes
    /// any satisfied waiters via `post_null` on their own contexts.
    pub fn pool_fill(&self, pool_handle: Handle, fsid: FsId, handles: &[Handle], ctx: ContextId) -> Result<JobId, PvfsError> {
        let satisfied = {
            let mut state = self.state.lock().expect("engine mutex poisoned");
            state.contexts.slot(ctx)?;
            state.pools.fill(pool_handle, fsid, handles)
        };
        for (waiter_id, waiter_ctx) in satisfied {
            let mut descriptor = JobDescriptor::new(waiter_id, JobKindTag::PrecreatePool, waiter_ctx, 0);
            descriptor.complete(JobStatus::PrecreatePool { error_code: 0, position: 0 });
            let mut state = self.state.lock().expect("engine mutex poisoned");
            state.contexts.slot_mut(waiter_ctx)?.push(descriptor);
        }
        self.completed.notify_all();
        self.post_null(0, 0, ctx)
    }

    /// Pulls one handle from the pool, or parks on the wait list if empty (§4.3.6).
    /// Returns the handle directly when it can be served immediately; a parked caller
    /// gets its handle later as the `PrecreatePool` status on the job it was given. A
    /// successful pull can also drop the count below a parked `check_level`'s
    /// threshold; any such waiters are completed here the same way `pool_fill`
    /// completes its own waiters.
    pub fn pool_get_handle(&self, fsid: FsId, pool_handle: Handle, ctx: ContextId) -> Result<(PostOutcome, Option<Handle>), PvfsError> {
        let id = self.ids.next();
        let (handle, woken) = {
            let mut state = self.state.lock().expect("engine mutex poisoned");
            state.contexts.slot(ctx)?;
            state.pools.get_handle(fsid, pool_handle, id, ctx)
        };

        for (waiter_id, waiter_ctx) in woken {
            let mut descriptor = JobDescriptor::new(waiter_id, JobKindTag::PrecreatePool, waiter_ctx, 0);
            descriptor.complete(JobStatus::PrecreatePool { error_code: 0, position: 0 });
            let mut state = self.state.lock().expect("engine mutex poisoned");
            state.contexts.slot_mut(waiter_ctx)?.push(descriptor);
        }
        self.completed.notify_all();

        match handle {
            Some(handle) => Ok((PostOutcome::Immediate, Some(handle))),
            None => Ok((PostOutcome::Posted(id), None)),
        }
    }

    pub fn pool_check_level(&self, fsid: FsId, pool_handle: Handle, threshold: u64, ctx: ContextId) -> Result<PostOutcome, PvfsError> {
        let id = self.ids.next();
        let mut state = self.state.lock().expect("engine mutex poisoned");
        state.contexts.slot(ctx)?;
        if state.pools.check_level(fsid, pool_handle, threshold, id, ctx) {
            Ok(PostOutcome::Immediate)
        } else {
            Ok(PostOutcome::Posted(id))
        }
    }

    pub fn pool_fill_signal_error(&self, fsid: FsId, pool_handle: Handle, err: PvfsError) -> Result<(), PvfsError> {
        let woken = self.state.lock().expect("engine mutex poisoned").pools.signal_error(fsid, pool_handle);
        let code = err.to_wire_code();
        for (waiter_id, waiter_ctx) in woken {
            let mut descriptor = JobDescriptor::new(waiter_id, JobKindTag::PrecreatePool, waiter_ctx, 0);
            descriptor.complete(JobStatus::PrecreatePool { error_code: code, position: 0 });
            self.state.lock().expect("engine mutex poisoned").contexts.slot_mut(waiter_ctx)?.push(descriptor);
        }
        self.completed.notify_all();
        Ok(())
    }

    pub fn pool_iterate_handles(&self, fsid: FsId, cursor: PoolCursor, max: usize) -> Result<(Vec<Handle>, PoolCursor), PvfsError> {
        self.state.lock().expect("engine mutex poisoned").pools.iterate(fsid, cursor, max)
    }

    /// Pumps every shim's `poll_once()` once. In the single-threaded build this already
    /// happens inline in `wait_or_pump`; the threaded build's background drain thread
    /// (`ThreadManager`, shim.rs) calls this before `drain_shims()` since a shim's
    /// `poll_once()` is what moves a posted job onto its completion channel in the
    /// first place — without it `drain_shims()` has nothing to drain.
    pub fn pump_transports(&self) {
        self.network.poll_once();
        self.storage.poll_once();
        self.flow.poll_once();
    }

    /// Drains every shim's completion channel once, moving finished jobs from
    /// `inflight` to their context queues and removing them from the timeout manager.
    /// This is the single site (besides the shim itself) that acquires the completion
    /// mutex from the pump's perspective (§5).
    pub fn drain_shims(&self) {
        while let Ok(c) = self.network.completions().try_recv() {
            self.finish(c.id, JobStatus::Network { error_code: c.error_code, actual_size: c.actual_size });
        }
        while let Ok(c) = self.storage.completions().try_recv() {
            self.finish(
                c.id,
                JobStatus::Storage { error_code: c.error_code, vtag: c.vtag, handle: c.handle, count: c.count },
            );
        }
        while let Ok(c) = self.flow.completions().try_recv() {
            self.finish(c.id, JobStatus::Flow { error_code: c.error_code, bytes_transferred: c.bytes_transferred });
        }
    }

    fn finish(&self, id: JobId, status: JobStatus) {
        let mut state = self.state.lock().expect("engine mutex poisoned");
        if !state.live {
            return;
        }
        if let Some(mut descriptor) = state.inflight.remove(&id) {
            state.timeouts.untrack(id);
            descriptor.complete(status);
            let ctx = descriptor.context;
            if let Ok(slot) = state.contexts.slot_mut(ctx) {
                slot.push(descriptor);
            }
        }
        drop(state);
        self.completed.notify_all();
    }

    /// Expires timed-out jobs by requesting a cancel from the owning shim; the
    /// completion still arrives through the normal callback path (§4.3.3, §5).
    pub fn expire_timeouts(&self, now: Instant) {
        let expired = self.state.lock().expect("engine mutex poisoned").timeouts.expired(now);
        for id in expired {
            self.cancel_inner(id);
        }
    }

    pub fn reset_timeout(&self, id: JobId, secs: u64) -> Result<(), PvfsError> {
        let mut state = self.state.lock().expect("engine mutex poisoned");
        if !state.inflight.contains_key(&id) {
            return Err(PvfsError::InvalidArgument);
        }
        state.timeouts.reset(id, Deadline::after(Duration::from_secs(secs)));
        Ok(())
    }

    /// Idempotent, race-safe against a concurrent completion (§4.3.4): under the
    /// completion mutex, if the job already completed this is a no-op success;
    /// otherwise cancel is requested from the owning shim and the job still
    /// completes through the normal callback path.
    pub fn cancel(&self, id: JobId) -> Result<(), PvfsError> {
        self.cancel_inner(id);
        Ok(())
    }

    fn cancel_inner(&self, id: JobId) {
        let kind = {
            let state = self.state.lock().expect("engine mutex poisoned");
            match state.inflight.get(&id) {
                Some(d) => d.kind,
                None => return,
            }
        };
        match kind {
            JobKindTag::NetworkSend | JobKindTag::NetworkRecv | JobKindTag::UnexpectedRecv => self.network.cancel(id),
            JobKindTag::Storage => self.storage.cancel(id),
            JobKindTag::Flow => self.flow.cancel(id),
            JobKindTag::Timer | JobKindTag::SchedulerEntry | JobKindTag::Null | JobKindTag::PrecreatePool => {}
        }
    }

    /// Polls a single job to completion or timeout, pumping the single-threaded shims
    /// or waiting on the completion condvar in the threaded build.
    pub fn test(&self, id: JobId, ctx: ContextId, timeout: Duration) -> Result<Option<JobDescriptor>, PvfsError> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut state = self.state.lock().expect("engine mutex poisoned");
                if state.contexts.slot(ctx)?.find_completed(id) {
                    return Ok(state.contexts.slot_mut(ctx)?.take(id));
                }
            }
            if !self.wait_or_pump(deadline) {
                return Ok(None);
            }
        }
    }

    /// Polls every listed job; reports completion only once *all* are complete
    /// (§4.3.1, invariant 6), returning them as one batch.
    pub fn testsome(&self, ids: &[JobId], ctx: ContextId, timeout: Duration) -> Result<Option<Vec<JobDescriptor>>, PvfsError> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut state = self.state.lock().expect("engine mutex poisoned");
                let slot = state.contexts.slot_mut(ctx)?;
                if ids.iter().all(|id| slot.find_completed(*id)) {
                    let mut out = Vec::with_capacity(ids.len());
                    for id in ids {
                        out.push(slot.take(*id).expect("checked completed above"));
                    }
                    return Ok(Some(out));
                }
            }
            if !self.wait_or_pump(deadline) {
                return Ok(None);
            }
        }
    }

    /// Returns any completed jobs from `ctx`, up to `max`.
    pub fn testcontext(&self, ctx: ContextId, timeout: Duration, max: usize) -> Result<Vec<JobDescriptor>, PvfsError> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut state = self.state.lock().expect("engine mutex poisoned");
                let slot = state.contexts.slot_mut(ctx)?;
                if slot.len() > 0 {
                    let mut out = Vec::new();
                    while out.len() < max {
                        match slot.pop_ready() {
                            Some(d) => out.push(d),
                            None => break,
                        }
                    }
                    return Ok(out);
                }
            }
            if !self.wait_or_pump(deadline) {
                return Ok(vec![]);
            }
        }
    }

    /// Blocks on the completion condvar (threaded build) or pumps every shim once and
    /// checks expired timeouts (single-threaded build). Returns `false` once
    /// `deadline` has passed with nothing new to report.
    fn wait_or_pump(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        match self.mode {
            EngineMode::Threaded => {
                let state = self.state.lock().expect("engine mutex poisoned");
                let (_, timed_out) = self
                    .completed
                    .wait_timeout(state, deadline - now)
                    .expect("engine mutex poisoned");
                self.pump_transports();
                self.drain_shims();
                !timed_out.timed_out()
            }
            EngineMode::SingleThreaded => {
                self.network.poll_once();
                self.storage.poll_once();
                self.flow.poll_once();
                self.drain_shims();
                self.expire_timeouts(Instant::now());
                if Instant::now() >= deadline {
                    false
                } else {
                    std::thread::sleep(Duration::from_millis(1).min(deadline - Instant::now()));
                    true
                }
            }
        }
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }
}
