use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

/// Marker that identifies a local development host such as `acme.localhost`.
const LOCAL_DEV_MARKER: &str = "localhost";

/// Tenant identifier derived from the request host.
///
/// The sentinel [`TenantKey::MAIN`] means "no tenant selected"; every
/// tenant-scoped operation must refuse to run under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantKey(String);

impl TenantKey {
    pub const MAIN: &'static str = "main";

    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() {
            return Self::main();
        }
        Self(key)
    }

    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// False for the `"main"` sentinel.
    pub fn is_resolved(&self) -> bool {
        self.0 != Self::MAIN
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the tenant key from a hostname (no port). Hostnames are
/// case-insensitive, so the key is always lowercase.
///
/// - `acme.localhost` -> `acme` (local development, more than one label)
/// - `acme.yourapp.com` -> `acme` (production, more than two labels)
/// - anything else -> `"main"`
///
/// A bare hosting domain (`yourapp.com`, `tenant.onrender.com` style hosts with
/// two labels) always yields `"main"`, never an empty key. IP literals are not
/// subdomains and also yield `"main"`.
pub fn resolve(hostname: &str) -> TenantKey {
    let host = hostname.trim().trim_end_matches('.').to_ascii_lowercase();

    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return TenantKey::main();
    }

    let parts: Vec<&str> = host.split('.').collect();

    if host.contains(LOCAL_DEV_MARKER) && parts.len() > 1 {
        return TenantKey::new(parts[0]);
    }

    if parts.len() > 2 {
        return TenantKey::new(parts[0]);
    }

    TenantKey::main()
}

/// Strips a `:port` suffix from a `Host` header value.
pub fn hostname_of(host_header: &str) -> &str {
    // bracketed IPv6 literal, e.g. `[::1]:8080`
    if let Some(rest) = host_header.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default();
    }

    match host_header.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host_header,
    }
}
