use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use shared::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Cache operation routes, backend chosen with ?cache=redis|memcache
        .route("/cache", post(handlers::set_value))
        .route("/cache/clear", put(handlers::clear_all))
        .route("/cache/ttl/{ttl}", post(handlers::set_value_with_ttl))
        .route(
            "/cache/{key}",
            get(handlers::get_value).delete(handlers::delete_value),
        )
        .route("/cache/{key}/ttl", get(handlers::get_value_with_ttl))
        // Middleware
        .layer(cors_layer(&config.allowed_origins))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use storage_engine::UnifiedStorageFactory;
    use tower::ServiceExt; // for `oneshot`

    async fn test_app() -> Router {
        let config = Config::from_lookup(|name| match name {
            "CACHEGATE_REDIS_URL" | "CACHEGATE_MEMCACHE_URL" => Some("memory://".to_string()),
            _ => None,
        });
        let state = AppState::from_config(&config, &UnifiedStorageFactory)
            .await
            .unwrap();
        build_router(state, &config)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_lists_configured_backends() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "OK", "backends": ["memcache", "redis"] }));
    }

    #[tokio::test]
    async fn full_lifecycle_on_both_backends() {
        let app = test_app().await;

        for cache in ["redis", "memcache"] {
            let (status, body) = send(
                &app,
                "POST",
                &format!("/cache?cache={}", cache),
                Some(json!({ "key": "user:1", "value": { "name": "a" }, "ttl": 60 })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "status": "ok" }));

            let (status, body) =
                send(&app, "GET", &format!("/cache/user:1?cache={}", cache), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "key": "user:1", "value": { "name": "a" } }));

            let (status, body) =
                send(&app, "GET", &format!("/cache/user:1/ttl?cache={}", cache), None).await;
            assert_eq!(status, StatusCode::OK);
            let ttl = body["ttl"].as_u64().unwrap();
            assert!(ttl > 0 && ttl <= 60, "{} reported ttl {}", cache, ttl);

            let (status, _) =
                send(&app, "PUT", &format!("/cache/clear?cache={}", cache), None).await;
            assert_eq!(status, StatusCode::OK);

            let (status, body) =
                send(&app, "GET", &format!("/cache/user:1?cache={}", cache), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "error": "Cache miss" }));
        }
    }

    #[tokio::test]
    async fn backends_are_independent() {
        let app = test_app().await;
        let entry = json!({ "key": "shared", "value": [1, 2, 3] });

        send(&app, "POST", "/cache?cache=redis", Some(entry.clone())).await;
        send(&app, "POST", "/cache?cache=memcache", Some(entry)).await;
        send(&app, "PUT", "/cache/clear?cache=redis", None).await;

        let (status, _) = send(&app, "GET", "/cache/shared?cache=redis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "GET", "/cache/shared?cache=memcache", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn set_with_ttl_in_path() {
        let app = test_app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/cache/ttl/30?cache=redis",
            Some(json!({ "key": "session", "value": "abc" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", "/cache/session/ttl?cache=redis", None).await;
        let ttl = body["ttl"].as_u64().unwrap();
        assert!(ttl <= 30);

        let (status, _) = send(
            &app,
            "POST",
            "/cache/ttl/soon?cache=redis",
            Some(json!({ "key": "session", "value": "abc" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn zero_ttl_gets_the_backend_default() {
        let app = test_app().await;

        send(
            &app,
            "POST",
            "/cache?cache=memcache",
            Some(json!({ "key": "k", "value": true })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/cache/k/ttl?cache=memcache", None).await;
        assert_eq!(status, StatusCode::OK);
        let ttl = body["ttl"].as_u64().unwrap();
        assert!((59..=60).contains(&ttl), "expected the 60s default, got {}", ttl);
    }

    #[tokio::test]
    async fn unsupported_or_missing_cache_type_is_rejected() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/cache/k?cache=bogus", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Unsupported cache type" }));

        let (status, body) = send(&app, "PUT", "/cache/clear", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Cache type is missing" }));
    }

    #[tokio::test]
    async fn bad_payloads_are_rejected() {
        let app = test_app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/cache?cache=redis",
            Some(json!({ "key": "k", "value": 1, "ttl": -5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/cache?cache=redis",
            Some(json!({ "value": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid JSON payload" }));

        let (status, _) = send(
            &app,
            "POST",
            "/cache?cache=redis",
            Some(json!({ "key": "", "value": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn keys_shadowed_by_static_routes_are_refused() {
        let app = test_app().await;

        for key in ["clear", "ttl"] {
            let (status, body) = send(
                &app,
                "POST",
                "/cache?cache=redis",
                Some(json!({ "key": key, "value": 1 })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "key '{}' was accepted", key);
            assert_eq!(
                body,
                json!({ "error": format!("Key '{}' is reserved by the cache routes", key) })
            );
        }

        let (status, _) = send(&app, "PUT", "/cache/clear?cache=redis", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_ttls_are_caller_errors() {
        let app = test_app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/cache?cache=redis",
            Some(json!({ "key": "k", "value": 1, "ttl": i64::MAX })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/cache/ttl/9223372036854775807?cache=memcache",
            Some(json!({ "key": "k", "value": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/cache/k?cache=redis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_a_missing_key_succeeds() {
        let app = test_app().await;

        let (status, body) = send(&app, "DELETE", "/cache/ghost?cache=memcache", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "deleted": false }));
    }
}
