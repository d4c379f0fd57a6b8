use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide configuration, loaded from a TOML file in `game/core/config.rs`'s
/// style (`serdeconv::from_toml_file`, with a `Default` impl
/// covering every field so a missing config file is never a hard failure for tools
/// that only need a subset of it).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EngineConfig {
    pub listen_address: String,
    pub context_count: usize,
    pub retry_limit: u32,
    pub retry_delay_ms: u64,
    pub protocol_release: u32,
}

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:3334";
pub const DEFAULT_CONTEXT_COUNT: usize = 16;
pub const DEFAULT_RETRY_LIMIT: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;
pub const DEFAULT_PROTOCOL_RELEASE: u32 = 1;

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            context_count: DEFAULT_CONTEXT_COUNT,
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            protocol_release: DEFAULT_PROTOCOL_RELEASE,
        }
    }
}

impl EngineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> EngineConfig {
        serdeconv::from_toml_file(path).expect("Error loading server configuration file")
    }
}
