//! The thread-manager shim (C2, §4.2): in the threaded build, one dedicated OS thread
//! repeatedly pumps every shim's `poll_once()` and drains its completions into the
//! engine. In the single-threaded build nothing is spawned; `Engine::test*` pumps
//! `poll_once()`/`drain_shims()` itself on the caller's thread.

use crate::engine::{Engine, EngineMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Owns the background drain threads for the threaded build. Dropping it (or calling
/// `shutdown`) stops them; it is the only thing permitted to join them, mirroring the
/// shim's role as the single entity that touches an I/O thread's lifetime.
pub struct ThreadManager {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl ThreadManager {
    /// Spawns the drain loop. A no-op (returns an empty manager) for
    /// `EngineMode::SingleThreaded`, since that build pumps from `test*` instead.
    pub fn spawn(engine: Arc<Engine>) -> ThreadManager {
        if engine.mode() != EngineMode::Threaded {
            return ThreadManager { stop: Arc::new(AtomicBool::new(false)), handles: Vec::new() };
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                engine.pump_transports();
                engine.drain_shims();
                engine.expire_timeouts(std::time::Instant::now());
                thread::sleep(Duration::from_millis(1));
            }
        });

        ThreadManager { stop, handles: vec![handle] }
    }

    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadManager {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
