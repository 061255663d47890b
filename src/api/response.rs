use crate::error::AppError;
use axum::{Json, extract::FromRequest, http::StatusCode};
use serde::Serialize;

/// JSON request body whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, Serialize)]
pub struct Success<T> {
    success: bool,
    message: &'static str,
    data: T,
}

pub type Payload<T> = Result<(StatusCode, Json<Success<T>>), AppError>;

pub fn ok<T: Serialize>(message: &'static str, data: T) -> Payload<T> {
    respond(StatusCode::OK, message, data)
}

pub fn created<T: Serialize>(message: &'static str, data: T) -> Payload<T> {
    respond(StatusCode::CREATED, message, data)
}

fn respond<T: Serialize>(status: StatusCode, message: &'static str, data: T) -> Payload<T> {
    Ok((
        status,
        Json(Success {
            success: true,
            message,
            data,
        }),
    ))
}
