use serde::Serialize;
use shared::Error;
use std::fmt;
use std::str::FromStr;

pub mod response {
    use super::Backend;
    use serde_json::Value;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    pub struct GetResponse {
        pub value: Value,
    }

    impl GetResponse {
        pub fn new(value: Value) -> Self {
            Self { value }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct GetWithTtlResponse {
        pub value: Value,
        /// Zero when the backend holds the key without an expiry.
        pub ttl_remaining: Duration,
    }

    impl GetWithTtlResponse {
        pub fn new(value: Value, ttl_remaining: Duration) -> Self {
            Self {
                value,
                ttl_remaining,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct SetResponse {
        /// The expiration actually requested from the backend, after default resolution.
        pub applied_ttl: Duration,
    }

    impl SetResponse {
        pub fn new(applied_ttl: Duration) -> Self {
            Self { applied_ttl }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct DeleteResponse {
        pub deleted: bool,
    }

    impl DeleteResponse {
        pub fn new(deleted: bool) -> Self {
            Self { deleted }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct ClearResponse {
        pub backend: Backend,
    }

    impl ClearResponse {
        pub fn new(backend: Backend) -> Self {
            Self { backend }
        }
    }
}

/// Logical backend names accepted on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Redis,
    Memcache,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Redis, Backend::Memcache];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Redis => "redis",
            Backend::Memcache => "memcache",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redis" => Ok(Backend::Redis),
            "memcache" => Ok(Backend::Memcache),
            other => Err(Error::UnsupportedBackend(other.to_string())),
        }
    }
}
