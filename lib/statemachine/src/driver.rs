//! Executes compiled state graphs over an SMCB (§4.5 "Execution rule").

use crate::smcb::{ActionResult, MachineId, Smcb, StateGraph, StateRecord};
use pvfs_types::PvfsError;

/// Outcome of one `step` call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum StepOutcome {
    /// The SMCB transitioned to another state and may be stepped again immediately.
    Continue,
    /// The current action posted at least one job and is waiting on the SMCB's
    /// context queue; the caller resumes it from `testworld`/the job engine's test
    /// family once that job appears.
    Deferred,
    /// Reached the outermost machine's terminal return state.
    Completed(i32),
}

/// Outcome of driving an SMCB to completion or its next suspension point.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RunOutcome {
    Deferred,
    Completed(i32),
}

/// Owns every compiled graph, keyed by `MachineId` — "a function that maps op codes
/// to machine descriptors" (§3), realized as a lookup table.
pub struct Driver {
    machines: hashbrown::HashMap<MachineId, StateGraph>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver { machines: hashbrown::HashMap::new() }
    }

    pub fn register(&mut self, id: MachineId, graph: StateGraph) {
        self.machines.insert(id, graph);
    }

    /// Advances `smcb` by exactly one state record (§4.5 rules 1-5).
    pub fn step(&mut self, smcb: &mut Smcb) -> Result<StepOutcome, PvfsError> {
        if smcb.completed {
            return Ok(StepOutcome::Completed(smcb.last_status));
        }
        let machine = smcb.current_machine;
        let graph = self.machines.get_mut(&machine).ok_or(PvfsError::InvalidArgument)?;
        let record = graph.states.get_mut(smcb.pc).ok_or(PvfsError::Protocol)?;

        match record {
            StateRecord::Return => match smcb.pop_return_pc() {
                Some((caller_machine, return_pc)) => {
                    smcb.current_machine = caller_machine;
                    smcb.pc = return_pc;
                    Ok(StepOutcome::Continue)
                }
                None => {
                    smcb.completed = true;
                    Ok(StepOutcome::Completed(smcb.last_status))
                }
            },
            StateRecord::NestedMachine { machine: target } => {
                let target = *target;
                if !self.machines.contains_key(&target) {
                    return Err(PvfsError::InvalidArgument);
                }
                if !smcb.push_return_pc(machine, smcb.pc + 1) {
                    return Err(PvfsError::Fatal);
                }
                smcb.current_machine = target;
                smcb.pc = 0;
                Ok(StepOutcome::Continue)
            }
            StateRecord::Action { func, edges } => match func(smcb) {
                ActionResult::Deferred => Ok(StepOutcome::Deferred),
                ActionResult::Complete(status) => {
                    let next = edges
                        .iter()
                        .find(|(code, _)| *code == status)
                        .map(|(_, next)| *next)
                        .ok_or(PvfsError::Protocol)?;
                    smcb.last_status = status;
                    smcb.pc = next;
                    Ok(StepOutcome::Continue)
                }
            },
        }
    }

    /// Steps `smcb` until it suspends (`Deferred`) or reaches the outermost return.
    pub fn run(&mut self, smcb: &mut Smcb) -> Result<RunOutcome, PvfsError> {
        loop {
            match self.step(smcb)? {
                StepOutcome::Continue => continue,
                StepOutcome::Deferred => return Ok(RunOutcome::Deferred),
                StepOutcome::Completed(status) => return Ok(RunOutcome::Completed(status)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smcb::{OpId, OpIdGenerator};

    fn action(status: i32, edges: Vec<(i32, usize)>) -> StateRecord {
        StateRecord::Action { func: Box::new(move |_smcb| ActionResult::Complete(status)), edges }
    }

    #[test]
    fn runs_a_linear_graph_to_completion() {
        let mut driver = Driver::new();
        driver.register(
            MachineId(1),
            StateGraph::new(vec![action(0, vec![(0, 1)]), action(0, vec![(0, 2)]), StateRecord::Return]),
        );

        let ids = OpIdGenerator::new();
        let mut smcb = Smcb::new(ids.next(), MachineId(1));
        let outcome = driver.run(&mut smcb).unwrap();
        assert_eq!(outcome, RunOutcome::Completed(0));
        assert!(smcb.completed);
    }

    #[test]
    fn deferred_action_suspends_and_resumes() {
        let mut driver = Driver::new();
        driver.register(
            MachineId(1),
            StateGraph::new(vec![
                StateRecord::Action { func: Box::new(|_| ActionResult::Deferred), edges: vec![(0, 1)] },
                StateRecord::Return,
            ]),
        );

        let ids = OpIdGenerator::new();
        let mut smcb = Smcb::new(ids.next(), MachineId(1));
        assert_eq!(driver.run(&mut smcb).unwrap(), RunOutcome::Deferred);
        assert!(!smcb.completed);

        // Resume: the driver re-invokes the same action; swap the graph's function
        // for one that now completes, mirroring a job having finished in the interim.
        driver.register(
            MachineId(1),
            StateGraph::new(vec![action(0, vec![(0, 1)]), StateRecord::Return]),
        );
        assert_eq!(driver.run(&mut smcb).unwrap(), RunOutcome::Completed(0));
    }

    #[test]
    fn nested_machine_jump_returns_to_caller() {
        let mut driver = Driver::new();
        driver.register(
            MachineId(1),
            StateGraph::new(vec![StateRecord::NestedMachine { machine: MachineId(2) }, StateRecord::Return]),
        );
        driver.register(MachineId(2), StateGraph::new(vec![action(7, vec![(7, 1)]), StateRecord::Return]));

        let ids = OpIdGenerator::new();
        let mut smcb = Smcb::new(ids.next(), MachineId(1));
        let outcome = driver.run(&mut smcb).unwrap();
        assert_eq!(outcome, RunOutcome::Completed(7));
        assert_eq!(smcb.pc_stack_depth(), 0);
    }
}
