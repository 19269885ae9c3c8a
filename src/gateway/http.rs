use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::error::{CheckInError, FETCH_FAILED, SUBMIT_FAILED};
use crate::gateway::{
    AttendanceGateway, AttendanceResult, DEFAULT_SUCCESS_MESSAGE, require_tenant,
    validate_submission,
};
use crate::ledger::decode_ledger;
use crate::model::attendance::AttendanceRecord;
use crate::tenant::TenantKey;

#[derive(Serialize)]
struct SubmitRequest<'a> {
    rfid: &'a str,
    subdomain: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    presence: Option<bool>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Attendance backend over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpAttendanceGateway {
    client: Client,
    base_url: String,
}

impl HttpAttendanceGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn fetch_ledger(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<AttendanceRecord>, CheckInError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, path, "Attendance fetch failed");
                CheckInError::Transport(FETCH_FAILED.to_string())
            })?;

        let body = read_success(response, FETCH_FAILED).await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(payload) => Ok(decode_ledger(&payload)),
            Err(e) => {
                warn!(error = %e, path, "Attendance payload is not JSON");
                Ok(Vec::new())
            }
        }
    }
}

/// Returns the body of a 2xx response, or the backend's message otherwise.
async fn read_success(response: Response, fallback: &str) -> Result<String, CheckInError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        error!(error = %e, %status, "Failed to read backend response");
        CheckInError::Transport(fallback.to_string())
    })?;

    if status.is_success() {
        return Ok(body);
    }

    let message = server_message(&body).unwrap_or_else(|| fallback.to_string());
    warn!(%status, reason = %message, "Backend rejected attendance request");
    Err(CheckInError::Transport(message))
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

#[async_trait]
impl AttendanceGateway for HttpAttendanceGateway {
    async fn submit(
        &self,
        tenant: &TenantKey,
        worker_token: &str,
    ) -> Result<AttendanceResult, CheckInError> {
        let token = validate_submission(tenant, worker_token)?;

        let request = SubmitRequest {
            rfid: token,
            subdomain: tenant.as_str(),
        };

        let response = self
            .client
            .put(self.url("attendance"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, %tenant, "Attendance submission failed");
                CheckInError::Transport(SUBMIT_FAILED.to_string())
            })?;

        let body = read_success(response, SUBMIT_FAILED).await?;
        let parsed: SubmitResponse = serde_json::from_str(&body).unwrap_or_default();

        Ok(AttendanceResult {
            message: parsed
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
            presence: parsed.presence,
        })
    }

    async fn fetch_for_tenant(
        &self,
        tenant: &TenantKey,
    ) -> Result<Vec<AttendanceRecord>, CheckInError> {
        require_tenant(tenant)?;
        self.fetch_ledger("attendance", &[("subdomain", tenant.as_str())])
            .await
    }

    async fn fetch_for_worker(
        &self,
        tenant: &TenantKey,
        worker_token: &str,
    ) -> Result<Vec<AttendanceRecord>, CheckInError> {
        let token = validate_submission(tenant, worker_token)?;
        self.fetch_ledger(
            "attendance/worker",
            &[("subdomain", tenant.as_str()), ("rfid", token)],
        )
        .await
    }
}
