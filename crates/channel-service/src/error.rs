use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("scene already loaded; reload is not supported")]
    SceneReloadUnsupported,

    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("compute timed out")]
    ComputeTimeout,

    #[error(transparent)]
    Compute(#[from] channel_compute::ComputeError),

    #[error(transparent)]
    Model(#[from] channel_model::ModelError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServiceError::SceneReloadUnsupported => (StatusCode::CONFLICT, self.to_string()),
            ServiceError::EngineUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ServiceError::ComputeTimeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            ServiceError::Compute(channel_compute::ComputeError::SceneNotLoaded) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServiceError::Compute(channel_compute::ComputeError::SceneReloadUnsupported) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ServiceError::Compute(channel_compute::ComputeError::EngineUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ServiceError::Compute(channel_compute::ComputeError::ComputeTimeout) => {
                (StatusCode::GATEWAY_TIMEOUT, self.to_string())
            }
            ServiceError::Compute(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServiceError::Model(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
