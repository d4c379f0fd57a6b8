pub mod credential;
pub mod error;
pub mod handle;
pub mod tag;

pub use credential::{Capability, Credential};
pub use error::{PvfsError, PvfsResult};
pub use handle::{Extent, ExtentArray, FsId, Handle, Reference, Sid, SidArray};
pub use tag::{OpClass, RequestTag};

/// Size limits enforced by decoders (§6). Over-limit inputs are a `PvfsError::Protocol`.
pub mod limits {
    pub const MAX_PATH: usize = 4096;
    pub const MAX_SEGMENT: usize = 256;
    pub const MAX_HANDLES: usize = 1024;
    pub const MAX_SIDS: usize = MAX_HANDLES * 3;
    pub const MAX_EATTR_KEY: usize = 256;
    pub const MAX_EATTR_VALUE: usize = 8192;
    pub const MAX_KEYVAL_LIST: usize = 32;
    pub const MAX_DIRENTS: usize = 512;
    pub const MAX_PERF_SAMPLES: usize = 16;
    pub const MAX_SIGNATURE: usize = 256;
    pub const MAX_GROUPS: usize = 32;
    pub const MAX_CERTIFICATE: usize = 16384;
}
