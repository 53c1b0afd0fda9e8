//! JSON error responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{EngineError, ErrorCategory};

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// An error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.body.code
    }
}

/// HTTP status for an engine error.
pub fn status_for(error: &EngineError) -> StatusCode {
    match (error.category(), error.code()) {
        (ErrorCategory::Validation, "vhost-already-exists" | "alias-already-exists") => {
            StatusCode::CONFLICT
        }
        (ErrorCategory::Validation, "primary-domain-protected") => StatusCode::FORBIDDEN,
        (ErrorCategory::Validation, _) => StatusCode::BAD_REQUEST,
        (ErrorCategory::Dependency, "service-directory-unavailable") => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        (ErrorCategory::Dependency, _) => StatusCode::NOT_FOUND,
        (ErrorCategory::Integrity, _) => StatusCode::UNPROCESSABLE_ENTITY,
        (ErrorCategory::Os, _) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        Self {
            status: status_for(&error),
            body: ErrorBody {
                code: error.code().to_string(),
                message: error.chain(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                code: "invalid-request".to_string(),
                message: rejection.body_text(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
