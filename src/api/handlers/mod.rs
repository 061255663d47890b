pub mod attendance;
pub mod registry;
pub mod sessions;
pub mod teachers;

use crate::error::AppError;
use axum::http::Uri;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn not_found(path: Uri) -> AppError {
    tracing::debug!("No route for {}", path);
    AppError::NotFound("Route")
}
