//! Network boundary for attendance: submitting check-in/out events and
//! fetching ledgers.

pub mod http;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{CheckInError, ValidationError};
use crate::model::attendance::AttendanceRecord;
use crate::tenant::TenantKey;

pub use http::HttpAttendanceGateway;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Attendance marked successfully!";

/// Backend confirmation of a submitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceResult {
    pub message: String,
    /// Presence after the toggle, when the backend echoes it.
    pub presence: Option<bool>,
}

#[async_trait]
pub trait AttendanceGateway: Send + Sync {
    /// Submits one event; the backend advances the worker's presence toggle.
    async fn submit(
        &self,
        tenant: &TenantKey,
        worker_token: &str,
    ) -> Result<AttendanceResult, CheckInError>;

    /// Tenant ledger in backend (insertion) order.
    async fn fetch_for_tenant(
        &self,
        tenant: &TenantKey,
    ) -> Result<Vec<AttendanceRecord>, CheckInError>;

    /// One worker's ledger in backend (insertion) order.
    async fn fetch_for_worker(
        &self,
        tenant: &TenantKey,
        worker_token: &str,
    ) -> Result<Vec<AttendanceRecord>, CheckInError>;
}

pub fn require_tenant(tenant: &TenantKey) -> Result<(), ValidationError> {
    if tenant.is_resolved() {
        Ok(())
    } else {
        Err(ValidationError::UnresolvedTenant)
    }
}

/// Checks a submission locally; returns the trimmed token.
pub fn validate_submission<'a>(
    tenant: &TenantKey,
    worker_token: &'a str,
) -> Result<&'a str, ValidationError> {
    require_tenant(tenant)?;

    let token = worker_token.trim();
    if token.is_empty() {
        return Err(ValidationError::EmptyToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_requires_resolved_tenant_first() {
        assert_eq!(
            validate_submission(&TenantKey::main(), ""),
            Err(ValidationError::UnresolvedTenant)
        );
        assert_eq!(
            validate_submission(&TenantKey::new("acme"), "  "),
            Err(ValidationError::EmptyToken)
        );
        assert_eq!(validate_submission(&TenantKey::new("acme"), " RF001 "), Ok("RF001"));
    }
}
