use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub const SUBMIT_FAILED: &str = "Failed to mark attendance. Please try again.";
pub const FETCH_FAILED: &str = "Failed to fetch attendance data.";

/// Rejections raised before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Subdomain not found, check the URL.")]
    UnresolvedTenant,

    #[error("Enter the RFID")]
    EmptyToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckInError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A submission is already in progress")]
    Busy,

    /// Carries the backend's message when it sent one.
    #[error("{0}")]
    Transport(String),
}

impl ResponseError for CheckInError {
    fn status_code(&self) -> StatusCode {
        match self {
            CheckInError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckInError::Busy => StatusCode::CONFLICT,
            CheckInError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
