use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_files::FilesError;
use serde_json::json;

/// Handler failures, rendered as `{ "message": ... }` with a matching status.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error")]
    Internal(String),
}

pub type StubResult<T> = Result<T, StubError>;

impl StubError {
    pub fn status(&self) -> StatusCode {
        match self {
            StubError::Unauthorized => StatusCode::UNAUTHORIZED,
            StubError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StubError::NotFound(_) => StatusCode::NOT_FOUND,
            StubError::Conflict(_) => StatusCode::CONFLICT,
            StubError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        if let StubError::Internal(detail) = &self {
            tracing::error!("Stub handler error: {}", detail);
        }
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<FilesError> for StubError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::NotAnImage => StubError::BadRequest("Only image uploads are allowed".into()),
            FilesError::InvalidPath(path) => StubError::BadRequest(format!("Invalid file path: {path}")),
            other => StubError::Internal(other.to_string()),
        }
    }
}
