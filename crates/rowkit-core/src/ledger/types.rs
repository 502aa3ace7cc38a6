use chrono::{DateTime, Local, TimeZone};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Format of run identifiers: local time down to the microsecond, so two
/// runs started within the same second still get distinct, sortable ids.
pub const RUN_ID_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// The persisted record of one committed provisioning run.
///
/// `inserted_rows` is the source of truth for rollback: each table maps to
/// the primary keys the database generated for it, in insertion order. Table
/// order is the order the run populated them.
///
/// The trailing fields were added after the first ledger format shipped and
/// default when missing, so older entries still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLedgerEntry {
    pub run_id: String,
    /// RFC 3339 timestamp of when the run committed.
    pub created_at: String,
    pub profile: String,
    /// Scenario identity, the scenario file name without extension.
    pub scenario: String,
    pub inserted_rows: IndexMap<String, Vec<u64>>,
    /// Tables in the order rollback should empty them. Empty for entries
    /// written before the order was recorded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletion_order: Vec<String>,
    /// Seed the synthesizer ran with, for reproducing the generated values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Fingerprint of the schema model the run was provisioned against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowkit_version: Option<String>,
}

impl RunLedgerEntry {
    /// A new entry stamped with the current local time.
    pub fn new(
        profile: String,
        scenario: String,
        inserted_rows: IndexMap<String, Vec<u64>>,
    ) -> Self {
        Self::at(Local::now(), profile, scenario, inserted_rows)
    }

    /// A new entry stamped with `now`.
    pub fn at<Tz: TimeZone>(
        now: DateTime<Tz>,
        profile: String,
        scenario: String,
        inserted_rows: IndexMap<String, Vec<u64>>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            run_id: now.format(RUN_ID_FORMAT).to_string(),
            created_at: now.to_rfc3339(),
            profile,
            scenario,
            inserted_rows,
            deletion_order: Vec::new(),
            seed: None,
            schema_fingerprint: None,
            rowkit_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    pub fn row_count(&self) -> usize {
        self.inserted_rows.values().map(|keys| keys.len()).sum()
    }

    pub fn table_count(&self) -> usize {
        self.inserted_rows.len()
    }

    /// Tables in the order rollback should visit them.
    ///
    /// Uses the recorded deletion order (restricted to tables that actually
    /// have keys in this entry), then appends any remaining tables in reverse
    /// insertion order. Entries without a recorded order therefore roll back
    /// in plain reverse insertion order.
    pub fn rollback_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::with_capacity(self.inserted_rows.len());
        for table in &self.deletion_order {
            if self.inserted_rows.contains_key(table) && !order.contains(&table.as_str()) {
                order.push(table);
            }
        }
        for table in self.inserted_rows.keys().rev() {
            if !order.contains(&table.as_str()) {
                order.push(table);
            }
        }
        order
    }
}

/// Lightweight listing view of a stored entry.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
    pub run_id: String,
    pub created_at: String,
    pub profile: String,
    pub scenario: String,
    pub tables: usize,
    pub rows: usize,
    pub path: PathBuf,
}

impl LedgerSummary {
    pub fn from_entry(entry: &RunLedgerEntry, path: PathBuf) -> Self {
        Self {
            run_id: entry.run_id.clone(),
            created_at: entry.created_at.clone(),
            profile: entry.profile.clone(),
            scenario: entry.scenario.clone(),
            tables: entry.table_count(),
            rows: entry.row_count(),
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn rows(list: &[(&str, &[u64])]) -> IndexMap<String, Vec<u64>> {
        list.iter()
            .map(|(t, keys)| (t.to_string(), keys.to_vec()))
            .collect()
    }

    #[test]
    fn test_run_id_format() {
        let now = Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_micro_opt(9, 5, 7, 42)
                .unwrap(),
        );
        let entry = RunLedgerEntry::at(now, "local".into(), "smoke".into(), IndexMap::new());
        assert_eq!(entry.run_id, "20250615090507000042");
        assert!(entry.created_at.starts_with("2025-06-15T09:05:07"));
    }

    #[test]
    fn test_counts() {
        let entry = RunLedgerEntry::new(
            "local".into(),
            "smoke".into(),
            rows(&[("users", &[1, 2]), ("orders", &[5, 6, 7])]),
        );
        assert_eq!(entry.row_count(), 5);
        assert_eq!(entry.table_count(), 2);
    }

    #[test]
    fn test_rollback_order_defaults_to_reverse_insertion() {
        let entry = RunLedgerEntry::new(
            "local".into(),
            "smoke".into(),
            rows(&[("users", &[1]), ("orders", &[2]), ("items", &[3])]),
        );
        assert_eq!(entry.rollback_order(), vec!["items", "orders", "users"]);
    }

    #[test]
    fn test_rollback_order_prefers_recorded_order() {
        let mut entry = RunLedgerEntry::new(
            "local".into(),
            "smoke".into(),
            rows(&[("users", &[1]), ("products", &[2]), ("reviews", &[3])]),
        );
        entry.deletion_order = vec![
            "reviews".to_string(),
            "ghost".to_string(),
            "users".to_string(),
        ];
        // ghost is not in the entry; products was missing from the recorded order
        assert_eq!(entry.rollback_order(), vec!["reviews", "users", "products"]);
    }

    #[test]
    fn test_legacy_entry_deserializes() {
        let json = r#"{
            "run_id": "20240101120000",
            "created_at": "2024-01-01T12:00:00",
            "profile": "dev",
            "scenario": "smoke.json",
            "inserted_rows": { "users": [1, 2, 3], "orders": [10] }
        }"#;
        let entry: RunLedgerEntry = serde_json::from_str(json).unwrap();
        assert!(entry.deletion_order.is_empty());
        assert!(entry.seed.is_none());
        assert!(entry.rowkit_version.is_none());
        assert_eq!(entry.rollback_order(), vec!["orders", "users"]);
    }
}
