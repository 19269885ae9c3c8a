use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::CheckInError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntrySource {
    Manual,
    Scanner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// User-facing outcome of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub source: EntrySource,
    pub token: String,
    /// Presence reported by the backend for this event, if it sent one.
    pub presence: Option<bool>,
    #[schema(value_type = String, format = DateTime)]
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn success(
        source: EntrySource,
        token: &str,
        message: String,
        presence: Option<bool>,
    ) -> Self {
        Self {
            kind: NotificationKind::Success,
            message,
            source,
            token: token.to_string(),
            presence,
            at: Utc::now(),
        }
    }

    pub fn error(source: EntrySource, token: &str, error: &CheckInError) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: error.to_string(),
            source,
            token: token.to_string(),
            presence: None,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
impl Notification {
    pub fn is_success(&self) -> bool {
        self.kind == NotificationKind::Success
    }
}
