//! Wires C1-C5 into one process-wide value: the job engine, request scheduler and
//! state-machine driver behind a single `Server`, plus the drain/dispatch loop a real
//! server main runs every tick (§2, §9 Design Note "drain order").

use pvfs_job::transport::{FlowEngine, NetworkTransport, StorageBackend};
use pvfs_job::{Engine, EngineMode, ThreadManager};
use pvfs_sched::{AccessPolicy, PostOutcome as SchedOutcome, ScheduleId, Scheduler};
use pvfs_statemachine::{Driver, MachineId, OpId, OpIdGenerator, Smcb, StateGraph, StepOutcome};
use pvfs_support::config::EngineConfig;
use pvfs_support::logging::{o, warn, Logger};
use pvfs_types::tag::OpClass;
use pvfs_types::PvfsError;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// The per-process server value (§2): owns the job engine, the request scheduler and
/// the state-machine driver, and admits/drives operations across them. Concrete
/// per-operation state graphs are registered by the caller (`register_machine`); this
/// crate supplies the dispatch plumbing, not the filesystem operations themselves
/// (§1's Non-goals: "internals we do not reimplement byte-for-byte").
pub struct Server {
    engine: Arc<Engine>,
    scheduler: Mutex<Scheduler>,
    driver: Mutex<Driver>,
    ids: OpIdGenerator,
    running: Mutex<Vec<(ScheduleId, Smcb)>>,
    waiting: Mutex<hashbrown::HashMap<ScheduleId, Smcb>>,
    results: Mutex<hashbrown::HashMap<OpId, i32>>,
    threads: ThreadManager,
    config: EngineConfig,
    log: Logger,
}

impl Server {
    pub fn new(
        config: EngineConfig,
        network: Box<dyn NetworkTransport>,
        storage: Box<dyn StorageBackend>,
        flow: Box<dyn FlowEngine>,
        log: Logger,
    ) -> Server {
        pvfs_wire::self_test();

        let engine = Arc::new(Engine::new(EngineMode::Threaded, network, storage, flow, log.new(o!("component" => "job"))));
        let threads = ThreadManager::spawn(engine.clone());

        Server {
            engine,
            scheduler: Mutex::new(Scheduler::new(log.new(o!("component" => "sched")))),
            driver: Mutex::new(Driver::new()),
            ids: OpIdGenerator::new(),
            running: Mutex::new(Vec::new()),
            waiting: Mutex::new(hashbrown::HashMap::new()),
            results: Mutex::new(hashbrown::HashMap::new()),
            threads,
            config,
            log,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    pub fn register_machine(&self, id: MachineId, graph: StateGraph) {
        self.driver.lock().expect("driver mutex poisoned").register(id, graph);
    }

    /// Takes the final status of a completed op, if `tick` has already released it.
    /// Returns `None` while the op is still admitted or waiting.
    pub fn take_result(&self, op_id: OpId) -> Option<i32> {
        self.results.lock().expect("results mutex poisoned").remove(&op_id)
    }

    /// Admits one operation into the scheduler and starts (or parks) its SMCB,
    /// following §2's split: the scheduler gates admission, the driver runs the
    /// admitted machine.
    pub fn submit(&self, op: OpClass, policy: AccessPolicy, machine: MachineId) -> Result<OpId, PvfsError> {
        let op_id = self.ids.next();
        let smcb = Smcb::new(op_id, machine);
        let outcome = self.scheduler.lock().expect("scheduler mutex poisoned").post(op, policy)?;
        match outcome {
            SchedOutcome::Immediate(schedule_id) => {
                self.running.lock().expect("running mutex poisoned").push((schedule_id, smcb));
            }
            SchedOutcome::Posted(schedule_id) => {
                self.waiting.lock().expect("waiting mutex poisoned").insert(schedule_id, smcb);
            }
        }
        Ok(op_id)
    }

    /// One iteration of the drain/dispatch loop: drain the shims, expire timeouts,
    /// promote newly-ready scheduler entries into the running set, then step every
    /// admitted SMCB until it suspends or completes.
    pub fn tick(&self) {
        self.engine.drain_shims();
        self.engine.expire_timeouts(Instant::now());

        let ready = self.scheduler.lock().expect("scheduler mutex poisoned").testworld(64, Instant::now());
        if !ready.is_empty() {
            let mut waiting = self.waiting.lock().expect("waiting mutex poisoned");
            let mut running = self.running.lock().expect("running mutex poisoned");
            for schedule_id in ready {
                if let Some(smcb) = waiting.remove(&schedule_id) {
                    running.push((schedule_id, smcb));
                }
            }
        }

        let mut released = Vec::new();
        let mut finished = Vec::new();
        {
            let mut running = self.running.lock().expect("running mutex poisoned");
            let mut still_running = Vec::with_capacity(running.len());
            let mut driver = self.driver.lock().expect("driver mutex poisoned");
            for (schedule_id, mut smcb) in running.drain(..) {
                loop {
                    match driver.step(&mut smcb) {
                        Ok(StepOutcome::Continue) => continue,
                        Ok(StepOutcome::Deferred) => {
                            still_running.push((schedule_id, smcb));
                            break;
                        }
                        Ok(StepOutcome::Completed(status)) => {
                            finished.push((smcb.op_id, status));
                            released.push(schedule_id);
                            break;
                        }
                        Err(err) => {
                            warn!(self.log, "state machine step failed"; "error" => ?err);
                            finished.push((smcb.op_id, err.to_wire_code()));
                            released.push(schedule_id);
                            break;
                        }
                    }
                }
            }
            *running = still_running;
        }

        if !finished.is_empty() {
            let mut results = self.results.lock().expect("results mutex poisoned");
            for (op_id, status) in finished {
                results.insert(op_id, status);
            }
        }

        if !released.is_empty() {
            let mut scheduler = self.scheduler.lock().expect("scheduler mutex poisoned");
            for schedule_id in released {
                let _ = scheduler.release(schedule_id);
            }
        }
    }

    /// Shuts the server down in the Design Note's drain order (flows, network,
    /// storage, context queues, id generator): mark the engine dead first so no late
    /// shim completion is acted on, then stop the drain threads.
    pub fn finalize(self) {
        self.engine.finalize();
        self.threads.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_job::transport::stub::{StubFlow, StubNetwork, StubStorage};
    use pvfs_statemachine::{ActionResult, StateRecord};
    use pvfs_types::tag::RequestTag;
    use pvfs_types::FsId;
    use std::time::Duration;

    fn server() -> Server {
        Server::new(
            EngineConfig::default(),
            Box::new(StubNetwork::new()),
            Box::new(StubStorage::new()),
            Box::new(StubFlow::new()),
            pvfs_support::logging::discard(),
        )
    }

    #[test]
    fn submitting_a_trivial_machine_completes_and_releases_its_handle() {
        let srv = server();
        srv.register_machine(MachineId(1), StateGraph::new(vec![StateRecord::Return]));

        let handle = pvfs_types::Handle::new(1);
        let op = OpClass::new(RequestTag::GetAttr, handle, FsId(1), false);
        srv.submit(op, AccessPolicy::Normal, MachineId(1)).unwrap();
        srv.tick();

        assert!(srv.running.lock().unwrap().is_empty());
        assert!(srv.waiting.lock().unwrap().is_empty());
    }

    #[test]
    fn a_second_op_on_the_same_handle_only_runs_after_the_first_releases() {
        let srv = server();
        srv.register_machine(MachineId(1), StateGraph::new(vec![StateRecord::Return]));
        srv.register_machine(
            MachineId(2),
            StateGraph::new(vec![StateRecord::Action { func: Box::new(|_| ActionResult::Complete(0)), edges: vec![(0, 1)] }, StateRecord::Return]),
        );

        let handle = pvfs_types::Handle::new(7);
        srv.submit(OpClass::new(RequestTag::GetAttr, handle, FsId(1), false), AccessPolicy::Normal, MachineId(1)).unwrap();
        srv.submit(OpClass::new(RequestTag::SetAttr, handle, FsId(1), false), AccessPolicy::Normal, MachineId(2)).unwrap();

        // First tick: the GETATTR machine (immediate) returns and releases, promoting
        // the SETATTR machine into the ready queue but not yet running it.
        srv.tick();
        assert_eq!(srv.waiting.lock().unwrap().len(), 1);

        // Second tick: the promoted op is drained from the ready queue and run.
        srv.tick();
        assert!(srv.waiting.lock().unwrap().is_empty());
        assert!(srv.running.lock().unwrap().is_empty());
    }

    #[test]
    fn finalize_stops_the_drain_threads_without_panicking() {
        let srv = server();
        std::thread::sleep(Duration::from_millis(5));
        srv.finalize();
    }
}
