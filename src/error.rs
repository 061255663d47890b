use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid QR code format. Expected: STUDENT:{{id}}")]
    MalformedToken,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Student is not enrolled in this session")]
    Enrollment,

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Conflict(_) => "ConflictError",
            AppError::MalformedToken => "MalformedTokenError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::Enrollment => "EnrollmentError",
            AppError::Store(_) => "StoreError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedToken | AppError::Enrollment => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!("Store failure: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "error": self.kind(),
            "message": message,
        });

        (self.status(), Json(body)).into_response()
    }
}
