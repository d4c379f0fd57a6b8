//! Precreate-pool jobs (§4.3.6), grounded in `original_source/src/io/job/job.h`'s
//! cursor convention: a 64-bit iteration cursor packs the pool index into the high
//! 32 bits and the storage cursor into the low 32 bits.

use crate::descriptor::{ContextId, JobId};
use pvfs_types::{FsId, Handle, PvfsError};
use std::collections::VecDeque;

/// Sentinel marking the start of an iteration, on both the storage-cursor and
/// pool-index axes.
pub const START: u32 = 0;
/// Sentinel marking the end of an iteration, on both axes.
pub const END: u32 = u32::MAX;

/// A 64-bit iteration position: high 32 bits are the pool index within the fs, low
/// 32 bits are the storage-backend cursor.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PoolCursor(pub u64);

impl PoolCursor {
    pub fn encode(pool_index: u32, storage_cursor: u32) -> PoolCursor {
        PoolCursor(((pool_index as u64) << 32) | storage_cursor as u64)
    }

    pub fn pool_index(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn storage_cursor(self) -> u32 {
        self.0 as u32
    }

    pub fn start() -> PoolCursor {
        PoolCursor::encode(START, START)
    }

    pub fn end() -> PoolCursor {
        PoolCursor::encode(END, END)
    }
}

/// A consumer parked on `pool_get_handle` or `pool_check_level` because the pool's
/// count didn't satisfy it yet. The two wait lists read `threshold` in opposite
/// directions: a `get_handle` waiter (always `threshold == 1`) wakes once the count
/// rises to at least that; a `check_level` waiter wakes once the count falls below it.
struct Waiter {
    job: JobId,
    context: ContextId,
    threshold: u64,
}

/// Per-(fsid, pool handle) state: the in-memory count mirroring the storage-backed
/// key-value pool, and consumers waiting on it from either direction. Kept as two
/// separate lists so a `check_level` waiter that never becomes satisfied can't sit at
/// the front of `get_handle`'s queue and starve it (and vice versa).
struct PoolState {
    handles: VecDeque<Handle>,
    get_waiters: VecDeque<Waiter>,
    level_waiters: Vec<Waiter>,
}

impl PoolState {
    fn new() -> PoolState {
        PoolState { handles: VecDeque::new(), get_waiters: VecDeque::new(), level_waiters: Vec::new() }
    }

    fn count(&self) -> u64 {
        self.handles.len() as u64
    }
}

/// Guards pool counts, wait lists and per-fs pool directories (§5's "Precreate-pool
/// mutex"). A single `PrecreatePool` instance is shared by the engine; callers take
/// the engine's own completion mutex before touching it, per the documented lock
/// order (precreate-pool → completion is the ordering named in §5; here the table is
/// simply owned by the engine and accessed under its one mutex rather than a second
/// nested lock, since every pool operation is short).
pub struct PrecreatePool {
    pools: hashbrown::HashMap<(FsId, Handle), PoolState>,
}

impl PrecreatePool {
    pub fn new() -> PrecreatePool {
        PrecreatePool { pools: hashbrown::HashMap::new() }
    }

    fn pool_mut(&mut self, fsid: FsId, pool_handle: Handle) -> &mut PoolState {
        self.pools.entry((fsid, pool_handle)).or_insert_with(PoolState::new)
    }

    /// Writes a batch of handles into the pool, bumping its in-memory count. Returns
    /// the ids of any `get_handle` waiters now satisfied, so the engine can complete
    /// their jobs. `check_level` waiters never wake from a rising count, so they're
    /// left untouched here.
    pub fn fill(&mut self, pool_handle: Handle, fsid: FsId, handles: &[Handle]) -> Vec<(JobId, ContextId)> {
        let pool = self.pool_mut(fsid, pool_handle);
        pool.handles.extend(handles.iter().copied());

        let mut satisfied = Vec::new();
        while let Some(front) = pool.get_waiters.front() {
            if pool.count() >= front.threshold {
                let waiter = pool.get_waiters.pop_front().unwrap();
                satisfied.push((waiter.job, waiter.context));
            } else {
                break;
            }
        }
        satisfied
    }

    /// Pulls one handle if available, else parks the caller on the `get_handle` wait
    /// list. A successful pull drops the count, so this also wakes (and returns) every
    /// `check_level` waiter whose threshold the new, lower count now falls below
    /// (§4.3.6 — a parked `check_level` job wakes once a consumer drives the count
    /// below its threshold).
    pub fn get_handle(&mut self, fsid: FsId, pool_handle: Handle, job: JobId, context: ContextId) -> (Option<Handle>, Vec<(JobId, ContextId)>) {
        let pool = self.pool_mut(fsid, pool_handle);
        let handle = match pool.handles.pop_front() {
            Some(handle) => handle,
            None => {
                pool.get_waiters.push_back(Waiter { job, context, threshold: 1 });
                return (None, Vec::new());
            }
        };

        let count = pool.count();
        let mut woken = Vec::new();
        let mut still_waiting = Vec::with_capacity(pool.level_waiters.len());
        for waiter in pool.level_waiters.drain(..) {
            if count < waiter.threshold {
                woken.push((waiter.job, waiter.context));
            } else {
                still_waiting.push(waiter);
            }
        }
        pool.level_waiters = still_waiting;

        (Some(handle), woken)
    }

    /// `pool_check_level`: true immediately if `count < threshold`, else parks on the
    /// level wait list until a `get_handle` drains the count below `threshold`.
    pub fn check_level(&mut self, fsid: FsId, pool_handle: Handle, threshold: u64, job: JobId, context: ContextId) -> bool {
        let pool = self.pool_mut(fsid, pool_handle);
        if pool.count() < threshold {
            true
        } else {
            pool.level_waiters.push(Waiter { job, context, threshold });
            false
        }
    }

    /// Wakes every parked consumer on `pool_handle` with `err`, e.g. because the pool
    /// can no longer be refilled.
    pub fn signal_error(&mut self, fsid: FsId, pool_handle: Handle) -> Vec<(JobId, ContextId)> {
        let pool = self.pool_mut(fsid, pool_handle);
        let mut woken: Vec<(JobId, ContextId)> = pool.get_waiters.drain(..).map(|w| (w.job, w.context)).collect();
        woken.extend(pool.level_waiters.drain(..).map(|w| (w.job, w.context)));
        woken
    }

    /// Streams pool members by cursor. `cursor.pool_index() == START` begins at the
    /// first pool registered for `fsid`; `END` on either axis means "no more data".
    pub fn iterate(&self, fsid: FsId, cursor: PoolCursor, max: usize) -> Result<(Vec<Handle>, PoolCursor), PvfsError> {
        if cursor.pool_index() == END || cursor.storage_cursor() == END {
            return Ok((vec![], PoolCursor::end()));
        }

        let mut pool_handles: Vec<&Handle> = Vec::new();
        let mut pools: Vec<(&(FsId, Handle), &PoolState)> = self.pools.iter().filter(|((f, _), _)| *f == fsid).collect();
        pools.sort_by_key(|(k, _)| k.1 .0);

        let pool_index = cursor.pool_index() as usize;
        if pool_index >= pools.len() {
            return Ok((vec![], PoolCursor::end()));
        }
        let (_, state) = pools[pool_index];

        let start = cursor.storage_cursor() as usize;
        let end = (start + max).min(state.handles.len());
        for handle in state.handles.iter().skip(start).take(end.saturating_sub(start)) {
            pool_handles.push(handle);
        }
        let out: Vec<Handle> = pool_handles.into_iter().copied().collect();

        let next = if end >= state.handles.len() {
            if pool_index + 1 >= pools.len() {
                PoolCursor::end()
            } else {
                PoolCursor::encode((pool_index + 1) as u32, START)
            }
        } else {
            PoolCursor::encode(pool_index as u32, end as u32)
        };
        Ok((out, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_packs_pool_index_and_storage_cursor() {
        let c = PoolCursor::encode(3, 7);
        assert_eq!(c.pool_index(), 3);
        assert_eq!(c.storage_cursor(), 7);
        assert_eq!(PoolCursor::start().0, 0);
        assert_eq!(PoolCursor::end().pool_index(), END);
        assert_eq!(PoolCursor::end().storage_cursor(), END);
    }

    #[test]
    fn get_handle_parks_when_pool_empty_then_serves_after_fill() {
        let mut pool = PrecreatePool::new();
        let fsid = FsId(1);
        let handle = Handle::new(0xAB);

        let (got, woken) = pool.get_handle(fsid, handle, JobId(1), ContextId(0));
        assert!(got.is_none());
        assert!(woken.is_empty());

        let satisfied = pool.fill(handle, fsid, &[Handle::new(1), Handle::new(2)]);
        assert_eq!(satisfied, vec![(JobId(1), ContextId(0))]);

        let (got, _) = pool.get_handle(fsid, handle, JobId(2), ContextId(0));
        assert!(got.is_some());
    }

    #[test]
    fn signal_error_wakes_all_waiters() {
        let mut pool = PrecreatePool::new();
        let fsid = FsId(1);
        let handle = Handle::new(1);
        pool.get_handle(fsid, handle, JobId(1), ContextId(0));
        pool.get_handle(fsid, handle, JobId(2), ContextId(0));

        let woken = pool.signal_error(fsid, handle);
        assert_eq!(woken.len(), 2);
    }

    #[test]
    fn check_level_parks_above_threshold_then_wakes_when_get_handle_drops_below_it() {
        let mut pool = PrecreatePool::new();
        let fsid = FsId(1);
        let handle = Handle::new(1);

        pool.fill(handle, fsid, &[Handle::new(10), Handle::new(11), Handle::new(12)]);

        // count == 3, not below threshold 2: parks instead of completing immediately.
        assert!(!pool.check_level(fsid, handle, 2, JobId(1), ContextId(0)));

        // a get_handle that leaves the count at 2 (still not below threshold) must not wake it.
        let (got, woken) = pool.get_handle(fsid, handle, JobId(2), ContextId(0));
        assert!(got.is_some());
        assert!(woken.is_empty());

        // the next get_handle drops the count to 1, below threshold 2: wakes it.
        let (got, woken) = pool.get_handle(fsid, handle, JobId(3), ContextId(0));
        assert!(got.is_some());
        assert_eq!(woken, vec![(JobId(1), ContextId(0))]);
    }

    #[test]
    fn check_level_completes_immediately_when_already_below_threshold() {
        let mut pool = PrecreatePool::new();
        let fsid = FsId(1);
        let handle = Handle::new(1);
        pool.fill(handle, fsid, &[Handle::new(10)]);

        assert!(pool.check_level(fsid, handle, 5, JobId(1), ContextId(0)));
    }
}
