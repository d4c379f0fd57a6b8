use thiserror::Error;

/// The single error sum for the engine (§7). Wire-level code negates the matching
/// discriminant to distinguish it from positive in-band status codes, mirroring the
/// convention `original_source` uses throughout `job.h`/`pvfs2-req-proto.h`.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum PvfsError {
    #[error("protocol error: invalid framing or unknown tag")]
    Protocol,
    #[error("unsupported protocol: release={observed_release}, encoding={observed_encoding}")]
    Unsupported {
        observed_release: u32,
        observed_encoding: u32,
    },
    #[error("allocation failed")]
    NoMemory,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("operation not permitted while admin mode is pending or effective")]
    NotPermitted,
    #[error("context table full")]
    Busy,
    #[error("operation timed out")]
    Timeout,
    #[error("operation cancelled")]
    Cancelled,
    #[error("transient I/O error")]
    TransientIo,
    #[error("fatal engine invariant violation")]
    Fatal,
}

impl PvfsError {
    /// Maps each variant to a small negative wire code, stable across releases, in the
    /// order §7 lists them.
    pub fn to_wire_code(self) -> i32 {
        -(match self {
            PvfsError::Protocol => 1,
            PvfsError::Unsupported { .. } => 2,
            PvfsError::NoMemory => 3,
            PvfsError::InvalidArgument => 4,
            PvfsError::NotPermitted => 5,
            PvfsError::Busy => 6,
            PvfsError::Timeout => 7,
            PvfsError::Cancelled => 8,
            PvfsError::TransientIo => 9,
            PvfsError::Fatal => 10,
        })
    }
}

impl From<std::io::Error> for PvfsError {
    fn from(err: std::io::Error) -> PvfsError {
        match err.kind() {
            std::io::ErrorKind::TimedOut => PvfsError::Timeout,
            std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::InvalidData => PvfsError::Protocol,
            std::io::ErrorKind::OutOfMemory => PvfsError::NoMemory,
            _ => PvfsError::TransientIo,
        }
    }
}

pub type PvfsResult<T> = Result<T, PvfsError>;
