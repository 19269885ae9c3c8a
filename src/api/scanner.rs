use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::checkin::{ControllerState, Notification};
use crate::kiosk::KioskState;
use crate::scanner::ScanStats;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScannerStatus {
    #[schema(example = "acme")]
    pub tenant: String,
    pub state: ControllerState,
    pub running: bool,
    #[schema(example = 2000)]
    pub cadence_ms: u64,
    #[schema(example = "RF001")]
    pub last_scanned: Option<String>,
    pub last_notification: Option<Notification>,
    pub stats: ScanStats,
    /// Records in the tenant's ledger snapshot.
    #[schema(example = 12)]
    pub ledger_size: usize,
}

/// Camera kiosk status
#[utoipa::path(
    get,
    path = "/api/scanner",
    responses(
        (status = 200, description = "Scanner status", body = ScannerStatus),
        (status = 404, description = "No camera attached", body = Object, example = json!({
            "message": "No camera attached to this kiosk"
        }))
    ),
    tag = "Scanner"
)]
pub async fn scanner_status(kiosk: web::Data<KioskState>) -> HttpResponse {
    let Some((session, scanner)) = kiosk
        .camera()
        .and_then(|session| session.scanner().map(|scanner| (session, scanner)))
    else {
        return HttpResponse::NotFound().json(json!({
            "message": "No camera attached to this kiosk"
        }));
    };
    let controller = &session.controller;

    HttpResponse::Ok().json(ScannerStatus {
        tenant: controller.tenant().to_string(),
        state: controller.state(),
        running: scanner.is_running(),
        cadence_ms: scanner.cadence().as_millis() as u64,
        last_scanned: scanner.last_scanned(),
        last_notification: controller.last_notification(),
        stats: scanner.stats(),
        ledger_size: controller.registry().snapshot().len(),
    })
}
