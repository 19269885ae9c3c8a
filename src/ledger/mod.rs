//! Attendance ledger: the backend payload decoder and the in-memory registry
//! that serves filtered, most-recent-first views of it.

pub mod filter;
pub mod registry;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::attendance::{AttendanceRecord, WireRecord};

pub use filter::AttendanceFilter;
pub use registry::AttendanceRegistry;

/// Field the backend nests the records under when it does not send a bare array.
const LEDGER_FIELD: &str = "attendance";

/// Normalizes a ledger payload into records, in backend (insertion) order.
///
/// Accepts a bare array or an object with an `attendance` array. Any other
/// shape yields an empty ledger; elements that are not records are dropped.
pub fn decode_ledger(payload: &Value) -> Vec<AttendanceRecord> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(fields) => match fields.get(LEDGER_FIELD) {
            Some(Value::Array(items)) => items,
            other => {
                warn!(field = ?other, "Ledger payload has no attendance array");
                return Vec::new();
            }
        },
        other => {
            warn!(kind = kind_of(other), "Unexpected ledger payload");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for item in items {
        match WireRecord::deserialize(item) {
            Ok(wire) => records.push(AttendanceRecord::from(wire)),
            Err(e) => {
                dropped += 1;
                debug!(error = %e, "Skipping malformed attendance record");
            }
        }
    }

    if dropped > 0 {
        warn!(dropped, kept = records.len(), "Dropped malformed attendance records");
    }

    records
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
