use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};
use tracing::debug;

use crate::error::{CheckInError, ValidationError};
use crate::tenant::resolver::{TenantKey, hostname_of, resolve};

/// Tenant of the current request, taken from its `Host` header.
///
/// Extraction fails with a validation error under the `"main"` sentinel, so a
/// handler taking `Tenant` never runs unscoped.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantKey);

impl Tenant {
    pub fn key(&self) -> &TenantKey {
        &self.0
    }
}

impl FromRequest for Tenant {
    type Error = CheckInError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let info = req.connection_info();
        let key = resolve(hostname_of(info.host()));

        if !key.is_resolved() {
            debug!(host = info.host(), "Request without tenant subdomain");
            return ready(Err(ValidationError::UnresolvedTenant.into()));
        }

        ready(Ok(Tenant(key)))
    }
}
