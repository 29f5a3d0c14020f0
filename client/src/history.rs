//! Bounded, newest-first log of attempted operations.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mptw_types::{unix_millis, Timestamp};

use crate::error::ClientError;

/// Maximum number of records the ledger retains; oldest are evicted first.
pub const MAX_RETAINED: usize = 100;

/// Status string for operations that completed without a ledger result code.
pub const STATUS_SUCCESS: &str = "SUCCESS";
/// Status string for operations that failed before reaching a ledger result.
pub const STATUS_ERROR: &str = "ERROR";

/// What kind of operation a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Connection,
    AccountGenerated,
    AccountLoaded,
    AccountFunded,
    IssuanceCreate,
    TokenPayment,
}

/// One attempted operation, success or failure. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Ledger-assigned hash on success; a locally generated
    /// `local-<millis>` token for failures before submission.
    pub id: String,
    pub kind: RecordKind,
    /// `"SUCCESS"`, `"ERROR"`, or the raw ledger result code.
    pub status: String,
    pub timestamp: Timestamp,
    /// Kind-specific payload: request parameters and/or raw node response.
    pub details: Value,
}

impl TransactionRecord {
    pub fn new(kind: RecordKind, id: impl Into<String>, status: impl Into<String>, details: Value) -> Self {
        Self {
            id: id.into(),
            kind,
            status: status.into(),
            timestamp: Timestamp::now(),
            details,
        }
    }

    /// A record for an operation that succeeded without a ledger hash.
    pub fn success(kind: RecordKind, details: Value) -> Self {
        Self::new(kind, local_id(), STATUS_SUCCESS, details)
    }

    /// A record for an operation that failed before submission.
    pub fn error(kind: RecordKind, details: Value) -> Self {
        Self::new(kind, local_id(), STATUS_ERROR, details)
    }

    pub fn is_error(&self) -> bool {
        self.status == STATUS_ERROR
    }
}

fn local_id() -> String {
    format!("local-{}", unix_millis())
}

/// Bounded history of operation outcomes, newest first.
#[derive(Debug, Default)]
pub struct HistoryLedger {
    entries: VecDeque<TransactionRecord>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the head; evict the tail beyond `MAX_RETAINED`.
    pub fn record(&mut self, entry: TransactionRecord) {
        self.entries.push_front(entry);
        self.entries.truncate(MAX_RETAINED);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most recent records, newest first. Non-mutating.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &TransactionRecord> {
        self.entries.iter().take(n)
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Option<&TransactionRecord> {
        self.entries.front()
    }

    /// Serialize the full retained sequence as a pretty JSON array.
    pub fn export(&self) -> Result<String, ClientError> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ClientError::Export(e.into()))
    }

    /// Write the exported snapshot to a file. The only filesystem side
    /// effect in the core.
    pub fn export_to_file(&self, path: &Path) -> Result<(), ClientError> {
        let json = self.export()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(i: usize) -> TransactionRecord {
        TransactionRecord::new(
            RecordKind::Connection,
            format!("id-{i}"),
            STATUS_SUCCESS,
            json!({ "seq": i }),
        )
    }

    #[test]
    fn newest_first_ordering() {
        let mut history = HistoryLedger::new();
        for i in 0..5 {
            history.record(entry(i));
        }
        let ids: Vec<&str> = history.recent(3).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["id-4", "id-3", "id-2"]);
    }

    #[test]
    fn never_exceeds_bound() {
        let mut history = HistoryLedger::new();
        for i in 0..250 {
            history.record(entry(i));
            assert!(history.len() <= MAX_RETAINED);
        }
        assert_eq!(history.len(), MAX_RETAINED);
        // Oldest surviving entry is the 150th insertion.
        let last = history.recent(MAX_RETAINED).last().unwrap();
        assert_eq!(last.id, "id-150");
    }

    #[test]
    fn recent_does_not_mutate() {
        let mut history = HistoryLedger::new();
        for i in 0..10 {
            history.record(entry(i));
        }
        let _ = history.recent(4).count();
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn clear_empties() {
        let mut history = HistoryLedger::new();
        history.record(entry(0));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn export_parses_back_newest_first() {
        let mut history = HistoryLedger::new();
        for i in 0..3 {
            history.record(entry(i));
        }
        let json = history.export().unwrap();
        let parsed: Vec<TransactionRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].id, "id-2");
        assert_eq!(parsed[2].id, "id-0");
    }

    #[test]
    fn export_to_file_writes_snapshot() {
        let mut history = HistoryLedger::new();
        history.record(entry(0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        history.export_to_file(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<TransactionRecord> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn export_failure_surfaces_as_export_error() {
        let mut history = HistoryLedger::new();
        history.record(entry(0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("history.json");
        let err = history.export_to_file(&path).unwrap_err();
        assert!(matches!(err, ClientError::Export(_)));
    }

    #[test]
    fn error_records_carry_local_ids() {
        let rec = TransactionRecord::error(RecordKind::AccountFunded, json!({"error": "boom"}));
        assert!(rec.id.starts_with("local-"));
        assert!(rec.is_error());
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let rec = TransactionRecord::success(RecordKind::IssuanceCreate, json!({}));
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["kind"], "ISSUANCE_CREATE");
    }
}
