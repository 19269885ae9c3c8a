use std::collections::HashSet;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;

/// Client-side ledger filters. Every provided field must match (logical AND);
/// absent or blank fields impose no constraint. With `latest`, only each
/// worker's most recent matching event is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AttendanceFilter {
    /// Case-insensitive substring of the worker name.
    pub name: Option<String>,
    /// Case-insensitive substring of the department name.
    pub department: Option<String>,
    /// Prefix of the record date, e.g. `2024-05` or `2024-05-01`.
    pub date: Option<String>,
    /// Case-insensitive substring of the worker token.
    pub token: Option<String>,
    #[serde(default)]
    pub latest: bool,
}

#[cfg(test)]
impl AttendanceFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_department(department: impl Into<String>) -> Self {
        Self {
            department: Some(department.into()),
            ..Self::default()
        }
    }

    pub fn by_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn by_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }
}

impl AttendanceFilter {
    pub fn is_empty(&self) -> bool {
        !self.latest
            && [&self.name, &self.department, &self.date, &self.token]
                .into_iter()
                .all(|f| active(f).is_none())
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        contains(&self.name, record.worker_name.as_deref())
            && contains(&self.department, record.department_name.as_deref())
            && starts_with(&self.date, record.date.as_deref())
            && contains(&self.token, Some(record.worker_token.as_str()))
    }

    /// Derives the matching subsequence of a most-recent-first ledger,
    /// preserving order.
    pub fn apply(&self, records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
        if self.is_empty() {
            return records.to_vec();
        }

        let matching = records.iter().filter(|r| self.matches(r));
        if self.latest {
            latest_per_worker(matching)
        } else {
            matching.cloned().collect()
        }
    }
}

/// First, i.e. most recent, record of each worker in a most-recent-first
/// sequence.
pub fn latest_per_worker<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
) -> Vec<AttendanceRecord> {
    let mut seen = HashSet::new();
    let mut latest = Vec::new();

    for record in records {
        if seen.insert(record.worker_token.as_str()) {
            latest.push(record.clone());
        }
    }
    latest
}

fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().map(str::trim).filter(|f| !f.is_empty())
}

fn contains(filter: &Option<String>, field: Option<&str>) -> bool {
    match active(filter) {
        None => true,
        Some(needle) => field
            .map(|value| value.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

fn starts_with(filter: &Option<String>, field: Option<&str>) -> bool {
    match active(filter) {
        None => true,
        Some(prefix) => field.map(|value| value.starts_with(prefix)).unwrap_or(false),
    }
}
