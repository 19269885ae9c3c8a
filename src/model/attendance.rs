use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const UNKNOWN: &str = "Unknown";

/// One check-in/out event as served by the attendance backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "workerToken": "RF001",
        "workerName": "John Doe",
        "departmentName": "Assembly",
        "date": "2024-05-01",
        "time": "09:12:33",
        "presence": true,
        "photoRef": "john.jpg"
    })
)]
pub struct AttendanceRecord {
    pub worker_token: String,
    pub worker_name: Option<String>,
    pub department_name: Option<String>,
    /// `YYYY-MM-DD` portion of the event timestamp.
    pub date: Option<String>,
    pub time: Option<String>,
    /// `true` = IN, `false` = OUT. Always the backend's value.
    pub presence: bool,
    pub photo_ref: Option<String>,
}

/// Record shape on the wire. `rfid` and `presence` are mandatory; a payload
/// element missing either is not a record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub rfid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    pub presence: bool,
    #[serde(default)]
    pub photo: Option<String>,
}

impl From<WireRecord> for AttendanceRecord {
    fn from(wire: WireRecord) -> Self {
        Self {
            worker_token: wire.rfid,
            worker_name: non_blank(wire.name),
            department_name: non_blank(wire.department_name),
            date: non_blank(wire.date).map(|d| date_portion(&d).to_string()),
            time: non_blank(wire.time),
            presence: wire.presence,
            photo_ref: non_blank(wire.photo),
        }
    }
}

impl AttendanceRecord {
    pub fn display_name(&self) -> &str {
        self.worker_name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn display_department(&self) -> &str {
        self.department_name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn display_date(&self) -> &str {
        self.date.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn display_time(&self) -> &str {
        self.time.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn presence_label(&self) -> &'static str {
        if self.presence { "IN" } else { "OUT" }
    }

    pub fn photo_url(&self, base_url: &str) -> Option<String> {
        self.photo_ref
            .as_ref()
            .map(|photo| format!("{}/{}", base_url.trim_end_matches('/'), photo))
    }
}

/// `2024-05-01T08:00:00.000Z` -> `2024-05-01`
fn date_portion(date: &str) -> &str {
    date.split('T').next().unwrap_or(date)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
