//! The state-machine control block (SMCB) and compiled state graphs (§3, §4.5).

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a compiled state graph (one per operation, plus one per reusable
/// nested machine such as the message-pair array).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct MachineId(pub u32);

/// A unique id for one executing SMCB, allocated by a process-wide generator.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct OpId(pub u64);

pub struct OpIdGenerator {
    next: AtomicU64,
}

impl OpIdGenerator {
    pub fn new() -> OpIdGenerator {
        OpIdGenerator { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> OpId {
        OpId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a state function returns (§4.5): `Error(<0)` is just a `Complete` carrying a
/// negative status, since the edge table treats it exactly like any other status.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ActionResult {
    Complete(i32),
    Deferred,
}

pub type StateFn = Box<dyn FnMut(&mut Smcb) -> ActionResult + Send>;

/// One record in a compiled state graph (§4.5): a terminal return, an action state
/// with its status-to-next-state edges, or a jump into a nested machine.
pub enum StateRecord {
    Return,
    Action { func: StateFn, edges: Vec<(i32, usize)> },
    NestedMachine { machine: MachineId },
}

/// A flat array of state records, addressed by index (§4.5: "a flat array of state
/// records").
pub struct StateGraph {
    pub states: Vec<StateRecord>,
}

impl StateGraph {
    pub fn new(states: Vec<StateRecord>) -> StateGraph {
        StateGraph { states }
    }
}

const MAX_PC_STACK_DEPTH: usize = 3;

/// One executing instance of a state graph (§3 "State-machine control block"). Frames
/// are type-erased since nested machines carry different scratch shapes than their
/// parent (unlike the job engine's fixed `JobStatus` per-kind enum, the frame shape
/// here is open-ended — one per operation/nested-machine kind).
pub struct Smcb {
    pub op_id: OpId,
    pub op_code: MachineId,
    pub current_machine: MachineId,
    pub pc: usize,
    pc_stack: Vec<(MachineId, usize)>,
    frames: Vec<Box<dyn Any + Send>>,
    pub completed: bool,
    pub cancel: bool,
    pub last_status: i32,
    pub user_ptr: Option<Box<dyn Any + Send>>,
}

impl Smcb {
    pub fn new(op_id: OpId, op_code: MachineId) -> Smcb {
        Smcb {
            op_id,
            op_code,
            current_machine: op_code,
            pc: 0,
            pc_stack: Vec::new(),
            frames: Vec::new(),
            completed: false,
            cancel: false,
            last_status: 0,
            user_ptr: None,
        }
    }

    pub fn cancel(&mut self) {
        self.cancel = true;
    }

    /// Depth of the saved-PC stack; callers enforce `MAX_PC_STACK_DEPTH` before
    /// pushing (the driver, at a `NestedMachine` record).
    pub fn pc_stack_depth(&self) -> usize {
        self.pc_stack.len()
    }

    pub(crate) fn push_return_pc(&mut self, machine: MachineId, pc: usize) -> bool {
        if self.pc_stack.len() >= MAX_PC_STACK_DEPTH {
            return false;
        }
        self.pc_stack.push((machine, pc));
        true
    }

    pub(crate) fn pop_return_pc(&mut self) -> Option<(MachineId, usize)> {
        self.pc_stack.pop()
    }

    /// Pushes per-operation scratch onto the frame stack (§4.5 "Frames").
    pub fn push_frame<T: Send + 'static>(&mut self, frame: T) {
        self.frames.push(Box::new(frame));
    }

    /// Pops the top frame, expecting type `T`. Panics on a type mismatch: that is a
    /// programming error in the machine that pushed it, not a recoverable condition.
    pub fn pop_frame<T: Send + 'static>(&mut self) -> T {
        let boxed = self.frames.pop().expect("pop_frame on an empty frame stack");
        *boxed.downcast::<T>().expect("frame type mismatch")
    }

    pub fn current_frame<T: Send + 'static>(&mut self) -> &mut T {
        self.frames.last_mut().expect("current_frame on an empty frame stack").downcast_mut::<T>().expect("frame type mismatch")
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }
}
