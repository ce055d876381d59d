use crate::error::ApiError;
use crate::models::{
    CacheQuery, DeleteResponse, GetResponse, GetWithTtlResponse, SetRequest, SetWithTtlRequest,
    StatusResponse,
};
use crate::state::AppState;
use crate::validation;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use cachegate::CacheOperations;
use serde_json::Value;
use shared::TtlSecs;
use tracing::info;

/// GET /cache/{key}?cache=
pub async fn get_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<GetResponse>, ApiError> {
    let cache = validation::cache_type(query.cache.as_deref())?;
    validation::key(&key)?;
    info!("GET: cache={}, key={}", cache, key);

    let found = state.dispatcher.get(cache, &key).await?;
    Ok(Json(GetResponse {
        key,
        value: found.value,
    }))
}

/// GET /cache/{key}/ttl?cache=
pub async fn get_value_with_ttl(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<GetWithTtlResponse>, ApiError> {
    let cache = validation::cache_type(query.cache.as_deref())?;
    validation::key(&key)?;
    info!("GET TTL: cache={}, key={}", cache, key);

    let found = state.dispatcher.get_with_ttl(cache, &key).await?;
    Ok(Json(GetWithTtlResponse {
        key,
        value: found.value,
        ttl: found.ttl_remaining.as_secs(),
    }))
}

/// POST /cache?cache=
///
/// Body: {"key": "...", "value": <any JSON>, "ttl": <seconds, optional>}
pub async fn set_value(
    State(state): State<AppState>,
    Query(query): Query<CacheQuery>,
    body: Result<Json<SetRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let cache = validation::cache_type(query.cache.as_deref())?;
    let Json(req) = body?;
    let ttl = validation::ttl(req.ttl)?;

    store(&state, cache, &req.key, &req.value, ttl).await
}

/// POST /cache/ttl/{ttl}?cache=
///
/// Body: {"key": "...", "value": <any JSON>}
pub async fn set_value_with_ttl(
    State(state): State<AppState>,
    Path(ttl): Path<String>,
    Query(query): Query<CacheQuery>,
    body: Result<Json<SetWithTtlRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let ttl = validation::ttl_segment(&ttl)?;
    let cache = validation::cache_type(query.cache.as_deref())?;
    let Json(req) = body?;

    store(&state, cache, &req.key, &req.value, ttl).await
}

async fn store(
    state: &AppState,
    cache: &str,
    key: &str,
    value: &Value,
    ttl: TtlSecs,
) -> Result<Json<StatusResponse>, ApiError> {
    let key = validation::key(key)?;
    info!("SET: cache={}, key={}, ttl={}s", cache, key, ttl.0);

    state.dispatcher.set(cache, key, value, ttl).await?;
    Ok(Json(StatusResponse::ok()))
}

/// DELETE /cache/{key}?cache=
pub async fn delete_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let cache = validation::cache_type(query.cache.as_deref())?;
    validation::key(&key)?;
    info!("DELETE: cache={}, key={}", cache, key);

    let result = state.dispatcher.delete(cache, &key).await?;
    Ok(Json(DeleteResponse {
        status: "ok",
        deleted: result.deleted,
    }))
}

/// PUT /cache/clear?cache=
///
/// Flushes the whole backend, not just keys written through this server.
pub async fn clear_all(
    State(state): State<AppState>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let cache = validation::cache_type(query.cache.as_deref())?;
    info!("CLEAR: cache={}", cache);

    state.dispatcher.clear_all(cache).await?;
    Ok(Json(StatusResponse::ok()))
}
