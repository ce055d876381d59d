use crate::TtlSecs;
use std::time::Duration;
use tracing::warn;

/// Connection settings for one cache backend.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub url: String,
    /// Applied when a write asks for a TTL of zero. Never zero itself.
    pub default_ttl: TtlSecs,
    /// Upper bound on connecting and on each command round-trip.
    pub timeout: Duration,
}

impl BackendConfig {
    /// URL scheme that selects the in-process backend instead of a network client.
    pub const IN_PROCESS_SCHEME: &str = "memory://";

    pub fn is_in_process(&self) -> bool {
        self.url.starts_with(Self::IN_PROCESS_SCHEME)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub redis: BackendConfig,
    pub memcache: BackendConfig,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_HOST: &str = "127.0.0.1";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";
    const DEFAULT_MEMCACHE_URL: &str = "memcache://localhost:11211";
    const DEFAULT_TTL_SECS: u64 = 60;
    const DEFAULT_TIMEOUT_SECS: u64 = 2;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let http_port = lookup("CACHEGATE_HTTP_PORT")
            .and_then(|raw| match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!(
                        "CACHEGATE_HTTP_PORT={} is not a valid port, using {}",
                        raw,
                        Self::DEFAULT_HTTP_PORT
                    );
                    None
                }
            })
            .unwrap_or(Self::DEFAULT_HTTP_PORT);

        Self {
            host: lookup("CACHEGATE_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port,
            redis: BackendConfig {
                url: lookup("CACHEGATE_REDIS_URL")
                    .unwrap_or_else(|| Self::DEFAULT_REDIS_URL.to_string()),
                default_ttl: default_ttl(&lookup, "CACHEGATE_REDIS_DEFAULT_TTL_SECS"),
                timeout: timeout(&lookup, "CACHEGATE_REDIS_TIMEOUT_SECS"),
            },
            memcache: BackendConfig {
                url: lookup("CACHEGATE_MEMCACHE_URL")
                    .unwrap_or_else(|| Self::DEFAULT_MEMCACHE_URL.to_string()),
                default_ttl: default_ttl(&lookup, "CACHEGATE_MEMCACHE_DEFAULT_TTL_SECS"),
                timeout: timeout(&lookup, "CACHEGATE_MEMCACHE_TIMEOUT_SECS"),
            },
            allowed_origins: lookup("CACHEGATE_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn default_ttl(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> TtlSecs {
    // A zero default would turn "use the default" into "never expire".
    TtlSecs(positive_secs(lookup, name, Config::DEFAULT_TTL_SECS))
}

fn timeout(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Duration {
    Duration::from_secs(positive_secs(lookup, name, Config::DEFAULT_TIMEOUT_SECS))
}

fn positive_secs(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> u64 {
    let Some(raw) = lookup(name) else {
        return default;
    };

    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        Ok(_) => {
            warn!("{} must be greater than zero, using {}s", name, default);
            default
        }
        Err(_) => {
            warn!(
                "{}={} is not a number of seconds, using {}s",
                name, raw, default
            );
            default
        }
    }
}
