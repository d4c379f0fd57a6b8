//! Shared plumbing for the admin binaries (`gencred`, `touch`, `rmit`): an in-process
//! server stood up over the same stand-ins `daemon/runner` uses, and a one-shot
//! message-pair machine that drives a single request/reply exchange to completion
//! (§3, §6 [SUPPLEMENT]).

use pvfs_job::transport::stub::{StubFlow, StubNetwork, StubStorage};
use pvfs_job::{JobId, JobStatus};
use pvfs_sched::AccessPolicy;
use pvfs_statemachine::{ActionResult, MachineId, StateGraph, StateRecord};
use pvfs_support::config::EngineConfig;
use pvfs_types::tag::{OpClass, RequestTag};
use pvfs_types::{FsId, Handle, PvfsError};
use std::sync::Arc;
use std::time::Duration;

/// `MachineId` the one-shot round-trip machine below is registered under.
pub const ROUND_TRIP_MACHINE: MachineId = MachineId(9000);

struct RoundTripFrame {
    send_job: Option<JobId>,
    recv_job: Option<JobId>,
}

/// Builds a server wired to the in-process stand-ins and registers the round-trip
/// machine every admin binary drives a single operation through.
pub fn standalone_server(log: pvfs_support::logging::Logger) -> daemon_core::Server {
    let srv = daemon_core::Server::new(
        EngineConfig::default(),
        Box::new(StubNetwork::new()),
        Box::new(StubStorage::new()),
        Box::new(StubFlow::new()),
        log,
    );
    srv.register_machine(ROUND_TRIP_MACHINE, round_trip_graph(srv.engine().clone()));
    srv
}

/// One state: post a request/reply pair to `target`, poll it across ticks, and
/// complete with the reply's wire error code. Mirrors `message_pair::run`'s shape
/// (send, recv, classify) without its retry loop, since admin tools make one attempt
/// and report the result rather than retrying transparently.
fn round_trip_graph(engine: Arc<pvfs_job::Engine>) -> StateGraph {
    let ctx = engine.open_context().expect("admin context");
    let func = Box::new(move |smcb: &mut pvfs_statemachine::Smcb| -> ActionResult {
        if smcb.frame_depth() == 0 {
            smcb.push_frame(RoundTripFrame { send_job: None, recv_job: None });
        }
        let needs_post = smcb.current_frame::<RoundTripFrame>().send_job.is_none();
        if needs_post {
            let target = "admin-target";
            let send_job = match engine.post_network_send(target, 64, smcb.op_id.0, ctx, pvfs_support::time::Deadline::after(Duration::from_secs(30))) {
                Ok(job) => job,
                Err(_) => return ActionResult::Complete(PvfsError::TransientIo.to_wire_code()),
            };
            let recv_job = match engine.post_network_recv(64, smcb.op_id.0, ctx, pvfs_support::time::Deadline::after(Duration::from_secs(30))) {
                Ok(job) => job,
                Err(_) => return ActionResult::Complete(PvfsError::TransientIo.to_wire_code()),
            };
            let frame = smcb.current_frame::<RoundTripFrame>();
            frame.send_job = Some(send_job);
            frame.recv_job = Some(recv_job);
            return ActionResult::Deferred;
        }

        let frame = smcb.current_frame::<RoundTripFrame>();
        let ids = [frame.send_job.unwrap(), frame.recv_job.unwrap()];
        match engine.testsome(&ids, ctx, Duration::from_millis(0)) {
            Ok(Some(descriptors)) => {
                let recv_error_code = descriptors
                    .iter()
                    .find(|d| Some(d.id) == frame.recv_job)
                    .and_then(|d| match &d.status {
                        Some(JobStatus::Network { error_code, .. }) => Some(*error_code),
                        _ => None,
                    })
                    .unwrap_or(PvfsError::Protocol.to_wire_code());
                smcb.pop_frame::<RoundTripFrame>();
                ActionResult::Complete(recv_error_code)
            }
            Ok(None) => ActionResult::Deferred,
            Err(err) => {
                smcb.pop_frame::<RoundTripFrame>();
                ActionResult::Complete(err.to_wire_code())
            }
        }
    });
    StateGraph::new(vec![StateRecord::Action { func, edges: (-64..=0).map(|code| (code, 1)).collect() }, StateRecord::Return])
}

/// Submits a single operation against the round-trip machine and drives ticks until
/// it completes, returning the reply's wire status code (or `PvfsError::Timeout`'s
/// code if it never does within the tick budget).
pub fn run_one_shot(srv: &daemon_core::Server, tag: RequestTag, handle: Handle, fsid: FsId) -> i32 {
    let op = OpClass::new(tag, handle, fsid, false);
    let op_id = srv.submit(op, AccessPolicy::Normal, ROUND_TRIP_MACHINE).expect("scheduler admission");
    for _ in 0..256 {
        srv.tick();
        if let Some(status) = srv.take_result(op_id) {
            return status;
        }
    }
    PvfsError::Timeout.to_wire_code()
}
