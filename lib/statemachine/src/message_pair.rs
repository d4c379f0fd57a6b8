//! Message-pair arrays (§4.5 "Message-pair arrays", §3 "Message-pair state"): the
//! canonical nested machine that fans a request/reply exchange out to one peer,
//! retrying on a transient reply up to a configured limit.

use pvfs_job::{ContextId, Engine};
use pvfs_sched::Scheduler;
use pvfs_support::time::Deadline;
use pvfs_types::PvfsError;
use std::time::{Duration, Instant};

/// The classification a post-reply completion function computes from the reply
/// status (§3).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Classification {
    Ok,
    Retry,
    Fail,
}

/// Maps a completed receive's error code to a classification. Implemented per
/// operation by the parent machine, which knows how to read its own reply payload.
pub trait ReplyClassifier {
    fn classify(&self, recv_error_code: i32) -> Classification;
}

/// One round-trip to one peer server (§3). `target`/`replica_index` identify the
/// destination, `session_tag` correlates request and reply, `retry_limit`/
/// `retry_delay` bound the retry loop below.
pub struct MessagePair {
    pub target: String,
    pub replica_index: u32,
    pub session_tag: u64,
    pub retry_limit: u32,
    pub retry_delay: Duration,
    pub retry_count: u32,
    pub send_job: Option<pvfs_job::JobId>,
    pub recv_job: Option<pvfs_job::JobId>,
}

impl MessagePair {
    pub fn new(target: String, replica_index: u32, session_tag: u64, retry_limit: u32, retry_delay: Duration) -> MessagePair {
        MessagePair {
            target,
            replica_index,
            session_tag,
            retry_limit,
            retry_delay,
            retry_count: 0,
            send_job: None,
            recv_job: None,
        }
    }
}

/// Drives one message-pair exchange to a final classification, retrying transient
/// replies per §4.5: "On retry, the pair re-posts up to a configured retry limit
/// with a configured delay (implemented as a timer post)". This is a hand-written
/// nested machine rather than a compiled `StateGraph` (unlike §4.5's general rule):
/// its shape is fixed and always the same four steps (send, recv, classify, maybe
/// retry-timer), so it is simpler to read as a loop than as a graph with one state
/// per step. `driver::Driver`/`StateGraph` stay the vehicle for machines whose shape
/// actually varies by operation.
pub fn run(
    pair: &mut MessagePair,
    engine: &Engine,
    scheduler: &mut Scheduler,
    ctx: ContextId,
    request_size: u64,
    recv_size: u64,
    classifier: &dyn ReplyClassifier,
) -> Result<Classification, PvfsError> {
    loop {
        let send_job = engine.post_network_send(&pair.target, request_size, pair.session_tag, ctx, Deadline::infinite())?;
        let recv_job = engine.post_network_recv(recv_size, pair.session_tag, ctx, Deadline::infinite())?;
        pair.send_job = Some(send_job);
        pair.recv_job = Some(recv_job);

        let completions = engine
            .testsome(&[send_job, recv_job], ctx, Duration::from_secs(30))?
            .ok_or(PvfsError::Timeout)?;
        let recv_error_code = completions
            .iter()
            .find(|d| d.id == recv_job)
            .and_then(|d| match &d.status {
                Some(pvfs_job::JobStatus::Network { error_code, .. }) => Some(*error_code),
                _ => None,
            })
            .unwrap_or(-1);

        match classifier.classify(recv_error_code) {
            Classification::Ok => return Ok(Classification::Ok),
            Classification::Fail => return Ok(Classification::Fail),
            Classification::Retry => {
                if pair.retry_count >= pair.retry_limit {
                    return Ok(Classification::Fail);
                }
                pair.retry_count += 1;
                wait_retry_delay(scheduler, pair.retry_delay)?;
            }
        }
    }
}

/// Parks behind a scheduler timer for `delay`, draining `testworld` until it fires.
fn wait_retry_delay(scheduler: &mut Scheduler, delay: Duration) -> Result<(), PvfsError> {
    let timer_id = scheduler.post_timer(Deadline::after(delay));
    let deadline = Instant::now() + delay + Duration::from_secs(5);
    loop {
        let fired = scheduler.testworld(16, Instant::now());
        if fired.contains(&timer_id) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(PvfsError::Timeout);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}
