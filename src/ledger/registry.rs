use std::sync::{Arc, PoisonError, RwLock};

use crate::ledger::filter::AttendanceFilter;
use crate::model::attendance::AttendanceRecord;

#[derive(Debug, Default)]
struct Snapshot {
    /// Most-recent-first.
    records: Arc<Vec<AttendanceRecord>>,
    loaded: bool,
}

/// Latest ledger snapshot of one tenant.
///
/// Snapshots are installed whole; readers get a cheap `Arc` clone, so an
/// overlapping refresh simply wins the pointer swap.
#[derive(Debug, Clone, Default)]
pub struct AttendanceRegistry {
    inner: Arc<RwLock<Snapshot>>,
}

impl AttendanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs records received in backend (insertion) order.
    ///
    /// The order is flipped exactly once here; reads never reorder.
    pub fn replace(&self, mut records: Vec<AttendanceRecord>) {
        records.reverse();
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *snapshot = Snapshot {
            records: Arc::new(records),
            loaded: true,
        };
    }

    pub fn snapshot(&self) -> Arc<Vec<AttendanceRecord>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone()
    }

    pub fn view(&self, filter: &AttendanceFilter) -> Vec<AttendanceRecord> {
        filter.apply(&self.snapshot())
    }

    /// Whether any fetch has been installed yet.
    pub fn is_loaded(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).loaded
    }
}

#[cfg(test)]
impl AttendanceRegistry {
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
