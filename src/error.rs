use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// A lifecycle guard failed: wrong state, wrong caller, or a bid that
    /// is not on the order.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A bid admission rule failed.
    #[error("bid rejected: {0}")]
    AdmissionRejected(String),

    /// The payment gateway rejected or erred; the order state has already
    /// been reverted when this surfaces.
    #[error("payment failed: {0}")]
    Payment(String),

    /// A receipt mail could not be sent. The state transition it follows
    /// stays committed.
    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::AdmissionRejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Payment(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Mail(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
