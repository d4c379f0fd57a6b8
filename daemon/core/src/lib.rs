//! The per-process server value: wires the job engine (C3), request scheduler (C4)
//! and state-machine driver (C5) together behind one dispatch loop (§2).

pub mod server;

pub use server::Server;
