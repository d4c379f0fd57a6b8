use crate::descriptor::{ContextId, JobDescriptor, JobId};
use pvfs_types::PvfsError;
use std::collections::VecDeque;

/// Maximum number of contexts that may coexist process-wide (§4.3.2: "at most ~16").
pub const MAX_CONTEXTS: usize = 16;

/// A capacity-bounded, integer-indexed slot with its own completion queue. All
/// completions for a descriptor route to the context that posted it.
pub struct ContextSlot {
    queue: VecDeque<JobDescriptor>,
}

impl ContextSlot {
    fn new() -> ContextSlot {
        ContextSlot { queue: VecDeque::new() }
    }

    /// Pushes a completed descriptor. The queue never contains duplicates of the same
    /// descriptor (§3 invariant): a descriptor is pushed exactly once, by construction,
    /// since `push` is only ever called from the completion path.
    pub fn push(&mut self, descriptor: JobDescriptor) {
        self.queue.push_back(descriptor);
    }

    pub fn pop_ready(&mut self) -> Option<JobDescriptor> {
        self.queue.pop_front()
    }

    pub fn find_completed(&self, id: JobId) -> bool {
        self.queue.iter().any(|d| d.id == id && d.completed)
    }

    pub fn take(&mut self, id: JobId) -> Option<JobDescriptor> {
        let pos = self.queue.iter().position(|d| d.id == id)?;
        self.queue.remove(pos)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// The fixed table of at most `MAX_CONTEXTS` slots. Indices are stable for the
/// lifetime of the process; `open_context`/`close_context` just mark slots live/free.
pub struct ContextTable {
    slots: Vec<Option<ContextSlot>>,
}

impl ContextTable {
    pub fn new() -> ContextTable {
        let mut slots = Vec::with_capacity(MAX_CONTEXTS);
        slots.resize_with(MAX_CONTEXTS, || None);
        ContextTable { slots }
    }

    /// Allocates the first free slot. `Busy` when the table is full (§7).
    pub fn open_context(&mut self) -> Result<ContextId, PvfsError> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(ContextSlot::new());
                return Ok(ContextId(i as u32));
            }
        }
        Err(PvfsError::Busy)
    }

    /// Drains and frees the queue for `ctx`.
    pub fn close_context(&mut self, ctx: ContextId) -> Result<(), PvfsError> {
        let slot = self.slot_mut(ctx)?;
        slot.queue.clear();
        self.slots[ctx.0 as usize] = None;
        Ok(())
    }

    pub fn slot_mut(&mut self, ctx: ContextId) -> Result<&mut ContextSlot, PvfsError> {
        self.slots
            .get_mut(ctx.0 as usize)
            .and_then(|s| s.as_mut())
            .ok_or(PvfsError::InvalidArgument)
    }

    pub fn slot(&self, ctx: ContextId) -> Result<&ContextSlot, PvfsError> {
        self.slots
            .get(ctx.0 as usize)
            .and_then(|s| s.as_ref())
            .ok_or(PvfsError::InvalidArgument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{JobKindTag, JobStatus};

    #[test]
    fn open_context_reuses_closed_slots() {
        let mut table = ContextTable::new();
        let mut opened = Vec::new();
        for _ in 0..MAX_CONTEXTS {
            opened.push(table.open_context().unwrap());
        }
        assert!(table.open_context().is_err());

        table.close_context(opened[0]).unwrap();
        assert!(table.open_context().is_ok());
    }

    #[test]
    fn completion_queue_is_fifo() {
        let mut table = ContextTable::new();
        let ctx = table.open_context().unwrap();
        let slot = table.slot_mut(ctx).unwrap();

        let mut a = JobDescriptor::new(JobId(1), JobKindTag::Null, ctx, 0);
        a.complete(JobStatus::Null { error_code: 0 });
        let mut b = JobDescriptor::new(JobId(2), JobKindTag::Null, ctx, 0);
        b.complete(JobStatus::Null { error_code: 0 });
        slot.push(a);
        slot.push(b);

        assert_eq!(slot.pop_ready().unwrap().id, JobId(1));
        assert_eq!(slot.pop_ready().unwrap().id, JobId(2));
        assert!(slot.pop_ready().is_none());
    }
}
