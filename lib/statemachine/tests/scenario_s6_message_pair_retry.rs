//! S6 — message-pair retry (§4.5, §8 scenario S6).

use pvfs_job::transport::stub::{StubFlow, StubStorage};
use pvfs_job::transport::{NetworkCompletion, NetworkTransport};
use pvfs_job::{Engine, EngineMode, JobId};
use pvfs_sched::Scheduler;
use pvfs_statemachine::{Classification, MessagePair, ReplyClassifier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Completes every send at once, but alternates the receive's error code: the first
/// reply is transient (`-9`), the second is success (`0`), so the message pair must
/// retry exactly once. Counters live behind `Arc` handles cloned before the network
/// is handed to the engine, since the engine owns it from then on.
struct FlakyNetwork {
    tx: Sender<NetworkCompletion>,
    rx: Receiver<NetworkCompletion>,
    pending_sends: Mutex<Vec<JobId>>,
    pending_recvs: Mutex<Vec<JobId>>,
    sends_posted: Arc<AtomicUsize>,
    recvs_posted: Arc<AtomicUsize>,
    recv_attempt: AtomicUsize,
}

impl FlakyNetwork {
    fn new(sends_posted: Arc<AtomicUsize>, recvs_posted: Arc<AtomicUsize>) -> FlakyNetwork {
        let (tx, rx) = channel();
        FlakyNetwork {
            tx,
            rx,
            pending_sends: Mutex::new(Vec::new()),
            pending_recvs: Mutex::new(Vec::new()),
            sends_posted,
            recvs_posted,
            recv_attempt: AtomicUsize::new(0),
        }
    }
}

impl NetworkTransport for FlakyNetwork {
    fn post_send(&self, id: JobId, _dest: &str, _size: u64) {
        self.sends_posted.fetch_add(1, Ordering::SeqCst);
        self.pending_sends.lock().unwrap().push(id);
    }

    fn post_recv(&self, id: JobId, _size: u64) {
        self.recvs_posted.fetch_add(1, Ordering::SeqCst);
        self.pending_recvs.lock().unwrap().push(id);
    }

    fn post_unexpected_recv(&self, _id: JobId) {}

    fn cancel(&self, _id: JobId) {}

    fn completions(&self) -> &Receiver<NetworkCompletion> {
        &self.rx
    }

    fn poll_once(&self) {
        for id in self.pending_sends.lock().unwrap().drain(..) {
            let _ = self.tx.send(NetworkCompletion { id, error_code: 0, actual_size: 64 });
        }
        for id in self.pending_recvs.lock().unwrap().drain(..) {
            let attempt = self.recv_attempt.fetch_add(1, Ordering::SeqCst);
            let error_code = if attempt == 0 { -9 } else { 0 };
            let _ = self.tx.send(NetworkCompletion { id, error_code, actual_size: 64 });
        }
    }
}

struct TransientThenOk;

impl ReplyClassifier for TransientThenOk {
    fn classify(&self, recv_error_code: i32) -> Classification {
        match recv_error_code {
            0 => Classification::Ok,
            -9 => Classification::Retry,
            _ => Classification::Fail,
        }
    }
}

#[test]
fn retries_once_on_a_transient_reply_then_succeeds() {
    let sends_posted = Arc::new(AtomicUsize::new(0));
    let recvs_posted = Arc::new(AtomicUsize::new(0));
    let network = FlakyNetwork::new(sends_posted.clone(), recvs_posted.clone());

    let engine = Engine::new(
        EngineMode::SingleThreaded,
        Box::new(network),
        Box::new(StubStorage::new()),
        Box::new(StubFlow::new()),
        pvfs_support::logging::discard(),
    );
    let ctx = engine.open_context().unwrap();
    let mut scheduler = Scheduler::new(pvfs_support::logging::discard());

    let mut pair = MessagePair::new("peer-a".into(), 0, 42, 2, Duration::from_millis(10));
    let result = pvfs_statemachine::message_pair::run(&mut pair, &engine, &mut scheduler, ctx, 128, 128, &TransientThenOk);

    assert_eq!(result.unwrap(), Classification::Ok);
    assert_eq!(pair.retry_count, 1);
    assert_eq!(sends_posted.load(Ordering::SeqCst), 2);
    assert_eq!(recvs_posted.load(Ordering::SeqCst), 2);
}
