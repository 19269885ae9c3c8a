//! In-memory attendance backend for tests: keeps a ledger per tenant and
//! toggles presence the way the real backend does.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CheckInError;
use crate::gateway::{AttendanceGateway, AttendanceResult, DEFAULT_SUCCESS_MESSAGE};
use crate::model::attendance::AttendanceRecord;
use crate::tenant::TenantKey;

#[derive(Debug, Default)]
pub struct MemoryGateway {
    ledgers: Mutex<HashMap<String, Vec<AttendanceRecord>>>,
    submits: AtomicUsize,
    fetches: AtomicUsize,
    fail_submit: Mutex<Option<String>>,
    fail_fetch: Mutex<bool>,
    submit_delay: Mutex<Option<Duration>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.submit_calls() + self.fetch_calls()
    }

    pub fn submit_calls(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fail_submissions_with(&self, message: &str) {
        *self.fail_submit.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_fetches(&self) {
        *self.fail_fetch.lock().unwrap() = true;
    }

    pub fn delay_submissions(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    pub fn ledger(&self, tenant: &str) -> Vec<AttendanceRecord> {
        self.ledgers
            .lock()
            .unwrap()
            .get(tenant)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, tenant: &str, records: Vec<AttendanceRecord>) {
        self.ledgers
            .lock()
            .unwrap()
            .insert(tenant.to_string(), records);
    }
}

pub fn record(token: &str, presence: bool) -> AttendanceRecord {
    AttendanceRecord {
        worker_token: token.to_string(),
        worker_name: None,
        department_name: None,
        date: Some("2024-05-01".to_string()),
        time: None,
        presence,
        photo_ref: None,
    }
}

#[async_trait]
impl AttendanceGateway for MemoryGateway {
    async fn submit(
        &self,
        tenant: &TenantKey,
        worker_token: &str,
    ) -> Result<AttendanceResult, CheckInError> {
        self.submits.fetch_add(1, Ordering::SeqCst);

        let delay = *self.submit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.fail_submit.lock().unwrap().clone() {
            return Err(CheckInError::Transport(message));
        }

        let mut ledgers = self.ledgers.lock().unwrap();
        let ledger = ledgers.entry(tenant.as_str().to_string()).or_default();
        let presence = !ledger
            .iter()
            .rev()
            .find(|r| r.worker_token == worker_token)
            .map(|r| r.presence)
            .unwrap_or(false);
        ledger.push(record(worker_token, presence));

        Ok(AttendanceResult {
            message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            presence: Some(presence),
        })
    }

    async fn fetch_for_tenant(
        &self,
        tenant: &TenantKey,
    ) -> Result<Vec<AttendanceRecord>, CheckInError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if *self.fail_fetch.lock().unwrap() {
            return Err(CheckInError::Transport(crate::error::FETCH_FAILED.into()));
        }

        Ok(self.ledger(tenant.as_str()))
    }

    async fn fetch_for_worker(
        &self,
        tenant: &TenantKey,
        worker_token: &str,
    ) -> Result<Vec<AttendanceRecord>, CheckInError> {
        Ok(self
            .fetch_for_tenant(tenant)
            .await?
            .into_iter()
            .filter(|r| r.worker_token == worker_token)
            .collect())
    }
}
