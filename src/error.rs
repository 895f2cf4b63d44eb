// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Control-plane errors surfaced to API callers

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors returned by start/stop/snapshot/config operations.
///
/// Transient device and network failures inside the monitor loop never
/// become one of these; they are logged where they happen.
#[derive(Error, Debug)]
pub enum ExamError {
    #[error("Exam already active")]
    AlreadyActive,

    #[error("No active exam")]
    NotActive,

    #[error("Camera device not reachable: {0}")]
    DeviceUnreachable(String),

    #[error("Failed to capture frame: {0}")]
    CaptureFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ExamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExamError::AlreadyActive => StatusCode::BAD_REQUEST,
            ExamError::NotActive => StatusCode::BAD_REQUEST,
            ExamError::DeviceUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ExamError::CaptureFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ExamError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ExamError::AlreadyActive => "ALREADY_ACTIVE",
            ExamError::NotActive => "NOT_ACTIVE",
            ExamError::DeviceUnreachable(_) => "DEVICE_UNREACHABLE",
            ExamError::CaptureFailed(_) => "CAPTURE_FAILED",
            ExamError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

impl IntoResponse for ExamError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::info!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ExamError::AlreadyActive.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ExamError::NotActive.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ExamError::DeviceUnreachable("timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ExamError::CaptureFailed("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
