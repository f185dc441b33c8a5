use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

use crate::{models::ServiceResponse, services::downstream::ServiceError};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Downstream(#[from] ServiceError),

    #[error("Request validation failed")]
    Validation { message: String, details: Value },

    #[error("Resource not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            details: json!([{ "msg": message.clone() }]),
            message,
        }
    }

    fn to_service_response(&self) -> ServiceResponse {
        match self {
            AppError::Downstream(e) => e.to_response(),
            AppError::Validation { details, .. } => ServiceResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                self.to_string(),
                Some(json!({ "errors": details })),
            ),
            AppError::NotFound => {
                ServiceResponse::new(StatusCode::NOT_FOUND, self.to_string(), None)
            }
            AppError::Internal(msg) => ServiceResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred",
                Some(json!({ "error": msg })),
            ),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(msg) = &self {
            tracing::error!(error = %msg, "Request failed");
        }

        self.to_service_response().into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
