use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Operation name as sent to the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestType {
    Preauthorization,
    Authorization,
    Capture,
    Refund,
    /// Session-init and other auxiliary calls, not a payment operation.
    Genericpayment,
}

/// One audit entry per completed (successful or failed) operation.
/// Immutable after creation; owned exclusively by the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    /// Time-based id (epoch milliseconds at creation).
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub txid: Option<String>,
    pub reference: Option<String>,
    pub request_type: RequestType,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub status: String,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub customer_message: Option<String>,
    /// Outbound parameters with secrets redacted.
    pub request_snapshot: HashMap<String, String>,
    pub response_snapshot: HashMap<String, String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Optional criteria combined with AND semantics; an empty filter matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<String>,
    pub request_type: Option<RequestType>,
    pub txid: Option<String>,
    pub reference: Option<String>,
    pub date_from: Option<OffsetDateTime>,
    pub date_to: Option<OffsetDateTime>,
}

impl TransactionFilter {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.status
            .as_deref()
            .map_or(true, |status| record.status == status)
            && self
                .request_type
                .map_or(true, |request_type| record.request_type == request_type)
            && self
                .txid
                .as_deref()
                .map_or(true, |txid| record.txid.as_deref() == Some(txid))
            && self
                .reference
                .as_deref()
                .map_or(true, |reference| {
                    record.reference.as_deref() == Some(reference)
                })
            && self.date_from.map_or(true, |from| record.timestamp >= from)
            && self.date_to.map_or(true, |to| record.timestamp <= to)
    }
}
