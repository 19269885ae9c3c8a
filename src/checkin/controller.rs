use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::checkin::notification::{EntrySource, Notification};
use crate::error::CheckInError;
use crate::gateway::{AttendanceGateway, require_tenant, validate_submission};
use crate::ledger::{AttendanceFilter, AttendanceRegistry};
use crate::model::attendance::AttendanceRecord;
use crate::scanner::{ScannerHandle, VisualTokenScanner};
use crate::tenant::TenantKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
pub enum ControllerState {
    /// No tenant resolved; every submission is rejected.
    Idle,
    Ready,
    Submitting,
}

const IDLE: u8 = 0;
const READY: u8 = 1;
const SUBMITTING: u8 = 2;

impl From<u8> for ControllerState {
    fn from(value: u8) -> Self {
        match value {
            READY => ControllerState::Ready,
            SUBMITTING => ControllerState::Submitting,
            _ => ControllerState::Idle,
        }
    }
}

/// Holds `Submitting` for one in-flight submission and returns to `Ready`
/// when dropped, including when the submitting task is cancelled.
struct SubmissionGuard<'a> {
    state: &'a AtomicU8,
}

impl<'a> SubmissionGuard<'a> {
    fn acquire(state: &'a AtomicU8) -> Option<Self> {
        state
            .compare_exchange(READY, SUBMITTING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { state })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.state.store(READY, Ordering::Release);
    }
}

/// A badge seen again within this window of its last sighting is the same
/// presentation, not a new check-in.
pub const SCAN_HOLD_OFF: Duration = Duration::from_secs(10);

/// Remembers the last accepted scan so a badge held in front of the camera is
/// submitted once.
#[derive(Debug, Default)]
struct RepeatScanFilter {
    last: Mutex<Option<(String, Instant)>>,
}

impl RepeatScanFilter {
    /// Records the sighting; true when it continues the previous one.
    fn is_repeat(&self, token: &str) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        let repeat = matches!(
            &*last,
            Some((previous, seen)) if previous == token && now.duration_since(*seen) < SCAN_HOLD_OFF
        );
        *last = Some((token.to_string(), now));
        repeat
    }

    /// Lets the next sighting through, e.g. after a failed submission.
    fn forget(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Orchestrates check-in for one tenant: manual and scanned entries share one
/// single-flight submission path, and a successful submission refreshes the
/// ledger from the backend.
pub struct CheckInController {
    tenant: TenantKey,
    gateway: Arc<dyn AttendanceGateway>,
    registry: AttendanceRegistry,
    state: AtomicU8,
    last_notification: RwLock<Option<Notification>>,
    repeat_scans: RepeatScanFilter,
}

impl CheckInController {
    pub fn new(tenant: TenantKey, gateway: Arc<dyn AttendanceGateway>) -> Self {
        let state = if tenant.is_resolved() { READY } else { IDLE };

        Self {
            tenant,
            gateway,
            registry: AttendanceRegistry::new(),
            state: AtomicU8::new(state),
            last_notification: RwLock::new(None),
            repeat_scans: RepeatScanFilter::default(),
        }
    }

    pub fn tenant(&self) -> &TenantKey {
        &self.tenant
    }

    pub fn state(&self) -> ControllerState {
        ControllerState::from(self.state.load(Ordering::Acquire))
    }

    pub fn registry(&self) -> &AttendanceRegistry {
        &self.registry
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.last_notification
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Typed entry. Rejected with [`CheckInError::Busy`] while another
    /// submission is in flight.
    pub async fn submit_manual(&self, token: &str) -> Result<Notification, CheckInError> {
        self.submit(token, EntrySource::Manual).await
    }

    /// Scanned entry. Dropped silently while another submission is in flight,
    /// and while the same badge stays in view (see [`SCAN_HOLD_OFF`]).
    pub async fn submit_scanned(&self, token: &str) {
        if self.repeat_scans.is_repeat(token.trim()) {
            debug!(tenant = %self.tenant, token, "Badge still in view, scan ignored");
            return;
        }

        match self.submit(token, EntrySource::Scanner).await {
            Ok(_) => {}
            Err(CheckInError::Busy) => {
                self.repeat_scans.forget();
                debug!(tenant = %self.tenant, "Scan dropped, submission in flight");
            }
            Err(_) => self.repeat_scans.forget(),
        }
    }

    async fn submit(&self, raw: &str, source: EntrySource) -> Result<Notification, CheckInError> {
        let token = match validate_submission(&self.tenant, raw) {
            Ok(token) => token,
            Err(e) => {
                debug!(tenant = %self.tenant, %source, reason = %e, "Submission rejected");
                let err = CheckInError::from(e);
                self.notify(Notification::error(source, raw, &err));
                return Err(err);
            }
        };

        let outcome = {
            let Some(_guard) = SubmissionGuard::acquire(&self.state) else {
                return Err(CheckInError::Busy);
            };
            self.gateway.submit(&self.tenant, token).await
        };

        match outcome {
            Ok(result) => {
                info!(tenant = %self.tenant, token, %source, "Attendance submitted");

                // the stale view stays in place if this fails
                if let Err(e) = self.refresh().await {
                    warn!(tenant = %self.tenant, error = %e, "Ledger refresh after submission failed");
                }

                let notification =
                    Notification::success(source, token, result.message, result.presence);
                self.notify(notification.clone());
                Ok(notification)
            }
            Err(err) => {
                warn!(tenant = %self.tenant, token, %source, error = %err, "Attendance submission failed");
                self.notify(Notification::error(source, token, &err));
                Err(err)
            }
        }
    }

    /// Replaces the registry snapshot with a fresh fetch. On failure the
    /// previous snapshot is kept.
    pub async fn refresh(&self) -> Result<usize, CheckInError> {
        require_tenant(&self.tenant)?;
        let records = self.gateway.fetch_for_tenant(&self.tenant).await?;
        let count = records.len();
        self.registry.replace(records);
        debug!(tenant = %self.tenant, count, "Ledger refreshed");
        Ok(count)
    }

    /// Filtered view; mounts the ledger with a first fetch if none happened yet.
    pub async fn view(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, CheckInError> {
        if !self.registry.is_loaded() {
            self.refresh().await?;
        }
        Ok(self.registry.view(filter))
    }

    /// One worker's ledger, most-recent-first, filtered.
    pub async fn worker_report(
        &self,
        worker_token: &str,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, CheckInError> {
        validate_submission(&self.tenant, worker_token)?;
        let mut records = self
            .gateway
            .fetch_for_worker(&self.tenant, worker_token)
            .await?;
        records.reverse();
        Ok(filter.apply(&records))
    }

    /// Feeds every decoded token into the scanned-entry path.
    pub fn bind_scanner(self: &Arc<Self>, scanner: VisualTokenScanner) -> ScannerHandle {
        let controller = Arc::clone(self);

        scanner.start(move |token| {
            // cheap pre-check; the guard in `submit` is authoritative
            if controller.state() == ControllerState::Submitting {
                debug!(tenant = %controller.tenant, "Scan dropped, submission in flight");
                return;
            }
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.submit_scanned(&token).await;
            });
        })
    }

    fn notify(&self, notification: Notification) {
        *self
            .last_notification
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(notification);
    }
}
