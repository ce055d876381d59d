use cachegate::Backend;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// === Query Parameters ===

/// `?cache=redis|memcache` on every cache route
#[derive(Debug, Deserialize)]
pub struct CacheQuery {
    pub cache: Option<String>,
}

// === Cache Operation Models ===

#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    /// Whole seconds; 0 or absent selects the backend default
    #[serde(default)]
    pub ttl: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetWithTtlRequest {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct GetWithTtlResponse {
    pub key: String,
    pub value: Value,
    pub ttl: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub backends: Vec<Backend>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
