use crate::models::ErrorResponse;
use crate::validation::ValidationError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

/// Everything a cache handler can fail with, mapped to a status and `{"error": ...}`
#[derive(Debug)]
pub enum ApiError {
    Cache(shared::Error),
    Validation(ValidationError),
    InvalidJson(JsonRejection),
}

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        ApiError::Cache(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::InvalidJson(err)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Cache(shared::Error::NotFound) => {
                (StatusCode::NOT_FOUND, "Cache miss".to_string())
            }
            ApiError::Cache(shared::Error::UnsupportedBackend(_)) => {
                (StatusCode::BAD_REQUEST, "Unsupported cache type".to_string())
            }
            ApiError::Cache(shared::Error::BackendUnavailable { backend, .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Cache backend '{}' is unavailable", backend),
            ),
            ApiError::Cache(shared::Error::Encode(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode value".to_string(),
            ),
            ApiError::Cache(shared::Error::Decode(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to decode cached value".to_string(),
            ),
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::InvalidJson(_) => {
                (StatusCode::BAD_REQUEST, "Invalid JSON payload".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            ApiError::Cache(err) if status.is_server_error() => {
                error!("Cache operation failed: {}", err)
            }
            ApiError::InvalidJson(rejection) => debug!("Rejected body: {}", rejection),
            _ => debug!("Request failed with {}: {}", status, message),
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_statuses() {
        let cases = [
            (ApiError::from(shared::Error::NotFound), StatusCode::NOT_FOUND),
            (
                ApiError::from(shared::Error::UnsupportedBackend("bogus".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(shared::Error::unavailable("redis", "refused")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(shared::Error::Decode("eof".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(ValidationError::EmptyKey),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
