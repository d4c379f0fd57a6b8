//! The request scheduler (C4): per-handle FIFO lists with a concurrent I/O
//! relaxation, a global ready queue, a mode gate and a timer queue.

pub mod element;
pub mod mode;
pub mod scheduler;
pub mod timer;

pub use element::ScheduleId;
pub use mode::ServerMode;
pub use scheduler::{AccessPolicy, PostOutcome, Scheduler};
