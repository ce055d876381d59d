// shared/src/lib.rs
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Key absent or expired. Expected during normal operation.
    #[error("not found")]
    NotFound,
    #[error("encode: {0}")]
    Encode(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("backend unavailable ({backend}): {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),
}

impl Error {
    pub fn unavailable(backend: &'static str, reason: impl ToString) -> Self {
        Error::BackendUnavailable {
            backend,
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Time-to-live in whole seconds. Zero selects the backend's configured default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TtlSecs(pub u64);

impl TtlSecs {
    pub const BACKEND_DEFAULT: TtlSecs = TtlSecs(0);

    pub fn is_backend_default(&self) -> bool {
        self.0 == 0
    }

    /// Resolve against a backend default. The default itself is never zero.
    pub fn or_default(self, default: TtlSecs) -> TtlSecs {
        if self.is_backend_default() {
            default
        } else {
            self
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl From<Duration> for TtlSecs {
    fn from(value: Duration) -> Self {
        TtlSecs(value.as_secs())
    }
}

pub mod config;
