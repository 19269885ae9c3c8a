//! Mounted per-tenant check-in sessions.
//!
//! A session is one controller plus its periodic ledger refresh. Sessions are
//! created on first use and evicted after an idle period, which cancels their
//! timers and drops their snapshots. The camera-owning tenant's session is
//! pinned for the lifetime of the process.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{info, warn};

use crate::checkin::CheckInController;
use crate::gateway::AttendanceGateway;
use crate::scanner::{ScannerHandle, VisualTokenScanner};
use crate::tenant::TenantKey;
use crate::utils::timer::{TimerHandle, spawn_periodic};

/// Upper bound on concurrently mounted tenants.
const MAX_SESSIONS: u64 = 1_000;

pub struct TenantSession {
    pub controller: Arc<CheckInController>,
    refresh: TimerHandle,
    scanner: Option<ScannerHandle>,
}

impl TenantSession {
    fn mount(
        tenant: TenantKey,
        gateway: Arc<dyn AttendanceGateway>,
        refresh_interval: Duration,
    ) -> Self {
        let controller = Arc::new(CheckInController::new(tenant, gateway));
        let refresh = spawn_refresh(controller.clone(), refresh_interval);

        Self {
            controller,
            refresh,
            scanner: None,
        }
    }

    pub fn scanner(&self) -> Option<&ScannerHandle> {
        self.scanner.as_ref()
    }
}

impl Drop for TenantSession {
    fn drop(&mut self) {
        if let Some(scanner) = &self.scanner {
            scanner.stop();
        }
        self.refresh.cancel();
        info!(tenant = %self.controller.tenant(), "Tenant session unmounted");
    }
}

/// Keeps a mounted ledger current. The first load belongs to the first view
/// or submission, so the timer starts one interval after mount.
fn spawn_refresh(controller: Arc<CheckInController>, interval: Duration) -> TimerHandle {
    spawn_periodic(interval, move || {
        let controller = controller.clone();
        async move {
            if let Err(e) = controller.refresh().await {
                warn!(tenant = %controller.tenant(), error = %e, "Periodic ledger refresh failed");
            }
        }
    })
}

pub struct KioskState {
    gateway: Arc<dyn AttendanceGateway>,
    sessions: Cache<TenantKey, Arc<TenantSession>>,
    camera: Option<Arc<TenantSession>>,
    refresh_interval: Duration,
}

impl KioskState {
    pub fn new(
        gateway: Arc<dyn AttendanceGateway>,
        refresh_interval: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle_timeout)
            .build();

        Self {
            gateway,
            sessions,
            camera: None,
            refresh_interval,
        }
    }

    /// Pins a scanning session for the tenant that owns the camera.
    pub fn with_camera(mut self, tenant: TenantKey, scanner: VisualTokenScanner) -> Self {
        let mut session = TenantSession::mount(tenant, self.gateway.clone(), self.refresh_interval);
        session.scanner = Some(session.controller.bind_scanner(scanner));
        info!(tenant = %session.controller.tenant(), "Camera session mounted");

        self.camera = Some(Arc::new(session));
        self
    }

    pub fn camera(&self) -> Option<&Arc<TenantSession>> {
        self.camera.as_ref()
    }

    /// Session of `tenant`, mounting it on first use.
    pub async fn session(&self, tenant: &TenantKey) -> Arc<TenantSession> {
        if let Some(camera) = &self.camera {
            if camera.controller.tenant() == tenant {
                return camera.clone();
            }
        }

        let gateway = self.gateway.clone();
        let refresh_interval = self.refresh_interval;
        let key = tenant.clone();

        self.sessions
            .get_with(tenant.clone(), async move {
                info!(tenant = %key, "Tenant session mounted");
                Arc::new(TenantSession::mount(key, gateway, refresh_interval))
            })
            .await
    }

    pub async fn controller(&self, tenant: &TenantKey) -> Arc<CheckInController> {
        self.session(tenant).await.controller.clone()
    }
}
