//! Facade error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deploy_api::ErrorResponse;
use tracing::error;

use crate::errors::DeployError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        match err {
            e if e.is_input_error() => ApiError::BadRequest(e.to_string()),
            e @ DeployError::NoNodesAvailable => ApiError::Unavailable(e.to_string()),
            e @ DeployError::NotFound(_) => ApiError::NotFound(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unavailable(msg)
            | ApiError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
