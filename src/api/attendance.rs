use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::checkin::Notification;
use crate::config::Config;
use crate::error::CheckInError;
use crate::kiosk::KioskState;
use crate::ledger::AttendanceFilter;
use crate::model::attendance::AttendanceRecord;
use crate::tenant::Tenant;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualEntry {
    #[schema(example = "RF001")]
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DateFilter {
    #[schema(example = "2024-05")]
    pub date: Option<String>,
}

/// Display row: placeholders filled in, photo resolved to a URL.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    #[schema(example = "RF001")]
    pub worker_token: String,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "Assembly")]
    pub department: String,
    #[schema(example = "2024-05-01")]
    pub date: String,
    #[schema(example = "09:12:33")]
    pub time: String,
    pub presence: bool,
    #[schema(example = "IN")]
    pub presence_label: String,
    pub photo_url: Option<String>,
}

impl AttendanceRow {
    fn from_record(record: &AttendanceRecord, photo_base_url: &str) -> Self {
        Self {
            worker_token: record.worker_token.clone(),
            name: record.display_name().to_string(),
            department: record.display_department().to_string(),
            date: record.display_date().to_string(),
            time: record.display_time().to_string(),
            presence: record.presence,
            presence_label: record.presence_label().to_string(),
            photo_url: record.photo_url(photo_base_url),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceListResponse {
    #[schema(example = "acme")]
    pub tenant: String,
    #[schema(example = 1)]
    pub total: usize,
    /// Most-recent-first.
    pub data: Vec<AttendanceRow>,
}

fn list_response(
    tenant: &Tenant,
    records: &[AttendanceRecord],
    config: &Config,
) -> AttendanceListResponse {
    AttendanceListResponse {
        tenant: tenant.key().to_string(),
        total: records.len(),
        data: records
            .iter()
            .map(|r| AttendanceRow::from_record(r, &config.photo_base_url))
            .collect(),
    }
}

/// Manual check-in/out
#[utoipa::path(
    put,
    path = "/api/attendance",
    request_body = ManualEntry,
    responses(
        (status = 200, description = "Attendance marked", body = Notification, example = json!({
            "kind": "success",
            "message": "Attendance marked successfully!",
            "source": "manual",
            "token": "RF001",
            "presence": true,
            "at": "2024-05-01T09:12:33Z"
        })),
        (status = 400, description = "No tenant subdomain or empty token", body = Object, example = json!({
            "message": "Enter the RFID"
        })),
        (status = 409, description = "Another submission is in flight", body = Object, example = json!({
            "message": "A submission is already in progress"
        })),
        (status = 429, description = "Too many requests"),
        (status = 502, description = "Backend rejected or unreachable", body = Object, example = json!({
            "message": "Failed to mark attendance. Please try again."
        }))
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    tenant: Tenant,
    kiosk: web::Data<KioskState>,
    payload: web::Json<ManualEntry>,
) -> Result<HttpResponse, CheckInError> {
    let controller = kiosk.controller(tenant.key()).await;
    let notification = controller.submit_manual(&payload.token).await?;

    Ok(HttpResponse::Ok().json(notification))
}

/// Filtered ledger, most recent first
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("name", Query, description = "Worker name contains (case-insensitive)"),
        ("department", Query, description = "Department name contains (case-insensitive)"),
        ("date", Query, description = "Date prefix, e.g. 2024-05"),
        ("token", Query, description = "Worker token contains (case-insensitive)"),
        ("latest", Query, description = "Only each worker's most recent event")
    ),
    responses(
        (status = 200, description = "Attendance ledger", body = AttendanceListResponse),
        (status = 400, description = "No tenant subdomain"),
        (status = 502, description = "Backend unreachable")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    tenant: Tenant,
    kiosk: web::Data<KioskState>,
    config: web::Data<Config>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, CheckInError> {
    let controller = kiosk.controller(tenant.key()).await;
    let records = controller.view(&query).await?;

    Ok(HttpResponse::Ok().json(list_response(&tenant, &records, &config)))
}

/// Re-fetch the tenant ledger
#[utoipa::path(
    post,
    path = "/api/attendance/refresh",
    responses(
        (status = 200, description = "Ledger refreshed", body = Object, example = json!({
            "tenant": "acme",
            "total": 12
        })),
        (status = 400, description = "No tenant subdomain"),
        (status = 502, description = "Backend unreachable")
    ),
    tag = "Attendance"
)]
pub async fn refresh_attendance(
    tenant: Tenant,
    kiosk: web::Data<KioskState>,
) -> Result<HttpResponse, CheckInError> {
    let controller = kiosk.controller(tenant.key()).await;
    let total = controller.refresh().await?;

    Ok(HttpResponse::Ok().json(json!({
        "tenant": tenant.key(),
        "total": total
    })))
}

/// Attendance report of one worker
#[utoipa::path(
    get,
    path = "/api/attendance/worker/{token}",
    params(
        ("token", Path, description = "Worker token"),
        ("date", Query, description = "Date prefix, e.g. 2024-05")
    ),
    responses(
        (status = 200, description = "Worker attendance", body = AttendanceListResponse),
        (status = 400, description = "No tenant subdomain"),
        (status = 502, description = "Backend unreachable")
    ),
    tag = "Attendance"
)]
pub async fn worker_attendance(
    tenant: Tenant,
    kiosk: web::Data<KioskState>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<DateFilter>,
) -> Result<HttpResponse, CheckInError> {
    let controller = kiosk.controller(tenant.key()).await;
    let filter = AttendanceFilter {
        date: query.into_inner().date,
        ..AttendanceFilter::default()
    };
    let records = controller.worker_report(&path, &filter).await?;

    Ok(HttpResponse::Ok().json(list_response(&tenant, &records, &config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{kiosk_app, kiosk_request};
    use crate::gateway::DEFAULT_SUCCESS_MESSAGE;
    use crate::gateway::memory::{MemoryGateway, record};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;

    fn kiosk(gateway: &Arc<MemoryGateway>) -> web::Data<KioskState> {
        web::Data::new(KioskState::new(
            gateway.clone(),
            Duration::from_secs(30),
            Duration::from_secs(600),
        ))
    }

    #[actix_web::test]
    async fn check_in_is_scoped_to_subdomain() {
        let gateway = Arc::new(MemoryGateway::new());
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("acme.localhost:3000")
            .method(actix_web::http::Method::PUT)
            .uri("/api/attendance")
            .set_json(json!({ "token": "RF001" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "success");
        assert_eq!(body["message"], DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(body["presence"], true);
        assert_eq!(gateway.ledger("acme").len(), 1);
        assert!(gateway.ledger("globex").is_empty());
    }

    #[actix_web::test]
    async fn bare_host_is_rejected_before_backend() {
        let gateway = Arc::new(MemoryGateway::new());
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("localhost:3000")
            .method(actix_web::http::Method::PUT)
            .uri("/api/attendance")
            .set_json(json!({ "token": "RF001" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Subdomain not found, check the URL.");
        assert_eq!(gateway.calls(), 0);
    }

    #[actix_web::test]
    async fn blank_token_is_rejected() {
        let gateway = Arc::new(MemoryGateway::new());
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("acme.localhost")
            .method(actix_web::http::Method::PUT)
            .uri("/api/attendance")
            .set_json(json!({ "token": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Enter the RFID");
        assert_eq!(gateway.submit_calls(), 0);
    }

    #[actix_web::test]
    async fn backend_rejection_surfaces_its_message() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail_submissions_with("Worker not found");
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("acme.localhost")
            .method(actix_web::http::Method::PUT)
            .uri("/api/attendance")
            .set_json(json!({ "token": "RF404" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Worker not found");
    }

    #[actix_web::test]
    async fn list_is_filtered_with_placeholders() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut john = record("RF001", true);
        john.worker_name = Some("John Doe".into());
        john.department_name = Some("Assembly".into());
        john.photo_ref = Some("rf001.jpg".into());
        gateway.seed("acme", vec![john, record("RF002", false)]);
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("acme.localhost")
            .uri("/api/attendance?name=JOHN")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["tenant"], "acme");
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["workerToken"], "RF001");
        assert_eq!(body["data"][0]["presenceLabel"], "IN");
        assert_eq!(
            body["data"][0]["photoUrl"],
            "http://localhost:5000/uploads/rf001.jpg"
        );

        let req = kiosk_request("acme.localhost").uri("/api/attendance").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
        // most recent first
        assert_eq!(body["data"][0]["workerToken"], "RF002");
        assert_eq!(body["data"][0]["name"], "Unknown");
        assert_eq!(body["data"][0]["presenceLabel"], "OUT");
    }

    #[actix_web::test]
    async fn cold_list_fetches_ledger_once() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed("acme", vec![record("RF001", true)]);
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        for _ in 0..2 {
            let req = kiosk_request("acme.localhost").uri("/api/attendance").to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["total"], 1);
        }
        assert_eq!(gateway.fetch_calls(), 1);
    }

    #[actix_web::test]
    async fn latest_lists_one_event_per_worker() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed(
            "acme",
            vec![
                record("RF001", true),
                record("RF002", true),
                record("RF001", false),
            ],
        );
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("acme.localhost")
            .uri("/api/attendance?latest=true")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["workerToken"], "RF001");
        assert_eq!(body["data"][0]["presenceLabel"], "OUT");
        assert_eq!(body["data"][1]["workerToken"], "RF002");
    }

    #[actix_web::test]
    async fn uppercase_host_shares_the_lowercase_tenant() {
        let gateway = Arc::new(MemoryGateway::new());
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        for host in ["ACME.LOCALHOST", "acme.localhost"] {
            let req = kiosk_request(host)
                .method(actix_web::http::Method::PUT)
                .uri("/api/attendance")
                .set_json(json!({ "token": "RF001" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let presence: Vec<bool> = gateway.ledger("acme").iter().map(|r| r.presence).collect();
        assert_eq!(presence, [true, false]);
        assert!(gateway.ledger("ACME").is_empty());
    }

    #[actix_web::test]
    async fn refresh_reports_ledger_size() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed("acme", vec![record("RF001", true), record("RF001", false)]);
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("acme.localhost")
            .method(actix_web::http::Method::POST)
            .uri("/api/attendance/refresh")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "tenant": "acme", "total": 2 }));
    }

    #[actix_web::test]
    async fn worker_report_filters_by_date() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut april = record("RF001", true);
        april.date = Some("2024-04-30".into());
        gateway.seed(
            "acme",
            vec![april, record("RF002", true), record("RF001", false)],
        );
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk);

        let req = kiosk_request("acme.localhost")
            .uri("/api/attendance/worker/RF001")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["presence"], false);

        let req = kiosk_request("acme.localhost")
            .uri("/api/attendance/worker/RF001?date=2024-05")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
    }

    #[actix_web::test]
    async fn check_in_is_rate_limited_per_ip() {
        let gateway = Arc::new(MemoryGateway::new());
        let kiosk = kiosk(&gateway);
        let app = kiosk_app!(kiosk, &[("RATE_CHECKIN_PER_MIN", "1")]);

        let check_in = || {
            kiosk_request("acme.localhost")
                .method(actix_web::http::Method::PUT)
                .uri("/api/attendance")
                .set_json(json!({ "token": "RF001" }))
                .to_request()
        };

        assert_eq!(test::call_service(&app, check_in()).await.status(), StatusCode::OK);
        assert_eq!(
            test::call_service(&app, check_in()).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(gateway.submit_calls(), 1);
    }
}
