use crate::api::attendance::{AttendanceListResponse, AttendanceRow, DateFilter, ManualEntry};
use crate::api::scanner::ScannerStatus;
use crate::checkin::{ControllerState, EntrySource, Notification, NotificationKind};
use crate::ledger::AttendanceFilter;
use crate::model::attendance::AttendanceRecord;
use crate::scanner::ScanStats;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Check-in Kiosk API",
        version = "1.0.0",
        description = r#"
## Attendance Check-in Kiosk

Tenant-scoped attendance capture for shop-floor kiosks.

### 🔹 Tenancy
The tenant is the first label of the `Host` header: `acme.example.com` is tenant `acme`.
Requests on a bare host (`localhost`, `example.com`) are rejected with **400**.

### 🔹 Check-in
- **Manual entry**: `PUT /api/attendance` with a worker token
- **Camera**: a kiosk started with `CAMERA_URL` scans QR tokens for its tenant and submits them

The backend toggles IN/OUT; every success refreshes the tenant ledger.
Only one submission per tenant is in flight at a time (**409** otherwise).

### 🔹 Ledger
The ledger is fetched on first use, refreshed periodically, and listed most-recent-first
with case-insensitive `name`, `department`, `token` filters and a `date` prefix filter.
`latest=true` keeps each worker's most recent event only.

---
Built with **Rust**, **Actix Web**, **reqwest**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::refresh_attendance,
        crate::api::attendance::worker_attendance,

        crate::api::scanner::scanner_status
    ),
    components(
        schemas(
            ManualEntry,
            DateFilter,
            AttendanceFilter,
            AttendanceRecord,
            AttendanceRow,
            AttendanceListResponse,
            Notification,
            NotificationKind,
            EntrySource,
            ControllerState,
            ScanStats,
            ScannerStatus
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance check-in and ledger APIs"),
        (name = "Scanner", description = "Camera kiosk APIs"),
    )
)]
pub struct ApiDoc;
