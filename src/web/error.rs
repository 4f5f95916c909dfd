// src/web/error.rs - HTTP mapping of library errors
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::error::TopoError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Topo(#[from] TopoError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A fixed message with an explicit status, used where the frontend
    /// matches on the message text
    #[error("{1}")]
    Message(StatusCode, String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Message(status, _) => *status,
            ApiError::Topo(e) => match e {
                TopoError::NotFound(_) => StatusCode::NOT_FOUND,
                TopoError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let message = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Message(_, msg) => msg,
            ApiError::Topo(e) => e.to_string(),
        };
        let body = Json(serde_json::json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
