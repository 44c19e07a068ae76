use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} environment variable not set error")]
    EnvironmentVariableNotSetError(String),
    #[error("Validation error, {0}")]
    ValidationError(String),
    #[error("Job submission rejected, {0}")]
    SubmissionError(String),
    #[error("No pod found for job {0}")]
    PodNotFound(String),
    #[error("Pod {0} failed")]
    PodFailed(String),
    #[error("Log stream error, {0}")]
    StreamError(String),
    #[error("Persistence error, {0}")]
    PersistenceError(String),
    #[error("Notification error, {0}")]
    NotificationError(String),
    #[error("Deployment run timed out after {0}s")]
    RunTimeout(u64),
    #[error("{0}")]
    NotFoundError(String),
    #[error("Internal error, {0}")]
    InternalError(String),
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),
    #[error("Kube error, {0}")]
    KubeError(#[from] kube::Error),
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Serde json error, {0}")]
    SerdejsonError(#[from] serde_json::Error),
    #[error("IO error, {0}")]
    IoError(#[from] std::io::Error),
    #[error("Validation errors, {0}")]
    ValidatorValidationErrors(#[from] validator::ValidationErrors),
    #[error("InClusterError, {0}")]
    InClusterError(#[from] kube_client::config::InClusterError),
    #[error("KubeconfigError, {0}")]
    KubeconfigError(#[from] kube_client::config::KubeconfigError),
    #[error("InferConfigError, {0}")]
    InferConfigError(#[from] kube_client::config::InferConfigError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::EnvironmentVariableNotSetError(field) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{field} environment variable not set error"),
            ),
            Self::ValidationError(e) => (StatusCode::UNPROCESSABLE_ENTITY, e),
            Self::ValidatorValidationErrors(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Self::SubmissionError(e) => (
                StatusCode::BAD_GATEWAY,
                format!("Job submission rejected, {e}"),
            ),
            Self::PodNotFound(job) => (
                StatusCode::BAD_GATEWAY,
                format!("No pod found for job {job}"),
            ),
            Self::PodFailed(pod) => (StatusCode::BAD_GATEWAY, format!("Pod {pod} failed")),
            Self::StreamError(e) => (StatusCode::BAD_GATEWAY, format!("Log stream error, {e}")),
            Self::PersistenceError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Persistence error, {e}"),
            ),
            Self::NotificationError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Notification error, {e}"),
            ),
            Self::RunTimeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Deployment run timed out after {secs}s"),
            ),
            Self::NotFoundError(e) => (StatusCode::NOT_FOUND, e),
            Self::InternalError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
            Self::RedisError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::KubeError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Request(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::SerdejsonError(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Self::IoError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::InClusterError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::KubeconfigError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::InferConfigError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(json!({"error": error_message}));

        (status, body).into_response()
    }
}
