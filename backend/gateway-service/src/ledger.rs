use std::sync::Mutex;

use domain_types::transaction::{TransactionFilter, TransactionRecord};

/// Newest-first retention cap for the audit trail.
pub const MAX_RECORDS: usize = 1000;

/// In-memory audit trail of processor calls, newest first. Writes beyond
/// the cap evict the oldest records.
#[derive(Debug, Default)]
pub struct TransactionLedger {
    records: Mutex<Vec<TransactionRecord>>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TransactionRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn log(&self, record: TransactionRecord) {
        let mut records = self.lock();
        records.insert(0, record);
        records.truncate(MAX_RECORDS);
    }

    pub fn query(&self, filter: &TransactionFilter) -> Vec<TransactionRecord> {
        self.lock()
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: i64) -> Option<TransactionRecord> {
        self.lock().iter().find(|record| record.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
