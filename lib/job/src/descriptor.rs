use pvfs_types::{FsId, Handle};
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique id for one outstanding job, allocated by a process-wide generator (§3's
/// "Job descriptor"). Stays valid until the job's completion is consumed.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct JobId(pub u64);

/// Index of one of the small fixed set of contexts (~16, §4.3.2).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ContextId(pub u32);

pub struct JobIdGenerator {
    next: AtomicU64,
}

impl JobIdGenerator {
    pub fn new() -> JobIdGenerator {
        JobIdGenerator { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> JobId {
        JobId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Discriminates a job descriptor's kind without carrying its payload; used for
/// introspection and logging (the job engine keeps full per-kind state in
/// `JobStatus`, preferring tagged variants over virtual dispatch, per the "context
/// with pre-registered callbacks" Design Note).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum JobKindTag {
    NetworkSend,
    NetworkRecv,
    UnexpectedRecv,
    Storage,
    Flow,
    Timer,
    SchedulerEntry,
    Null,
    PrecreatePool,
}

/// Per-kind outputs filled in on completion (§4.3.7 "Completion filling").
#[derive(Clone, Debug)]
pub enum JobStatus {
    Network { error_code: i32, actual_size: u64 },
    Storage { error_code: i32, vtag: u64, handle: Option<Handle>, count: u64 },
    Flow { error_code: i32, bytes_transferred: u64 },
    Timer,
    SchedulerEntry,
    Null { error_code: i32 },
    PrecreatePool { error_code: i32, position: u64 },
}

/// One outstanding asynchronous operation (§3). Owned by the job engine from post to
/// completion; freed after the caller consumes its fill status, except scheduler
/// entries which are retained for a matching `release`.
pub struct JobDescriptor {
    pub id: JobId,
    pub kind: JobKindTag,
    pub context: ContextId,
    pub user_tag: u64,
    pub completed: bool,
    pub status: Option<JobStatus>,
}

impl JobDescriptor {
    pub fn new(id: JobId, kind: JobKindTag, context: ContextId, user_tag: u64) -> JobDescriptor {
        JobDescriptor {
            id,
            kind,
            context,
            user_tag,
            completed: false,
            status: None,
        }
    }

    pub fn complete(&mut self, status: JobStatus) {
        self.completed = true;
        self.status = Some(status);
    }
}

/// The well-known (fsid, handle) pair a request targets — reused by the precreate-pool
/// jobs to key the pool table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PoolKey {
    pub fsid: FsId,
    pub pool_handle: Handle,
}
