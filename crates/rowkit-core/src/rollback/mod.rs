//! # Rollback
//!
//! Deletes the rows a run inserted, using the keys its ledger entry recorded.
//! Tables are visited children first, and within a table keys are deleted
//! newest first in batches of [`DELETE_BATCH_SIZE`]. Everything runs inside
//! one transaction: a rollback either removes every recorded row that still
//! exists or changes nothing.

use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ledger::types::RunLedgerEntry;
use crate::schema::types::SchemaModel;
use crate::store::TransactionalStore;

/// Maximum number of keys per DELETE statement.
pub const DELETE_BATCH_SIZE: usize = 100;

/// Why a table from the entry was not touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackSkip {
    NotInSchema,
    NoPrimaryKey,
    NoKeys,
}

impl fmt::Display for RollbackSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackSkip::NotInSchema => write!(f, "not declared in schema"),
            RollbackSkip::NoPrimaryKey => write!(f, "no primary key in schema"),
            RollbackSkip::NoKeys => write!(f, "no recorded keys"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RollbackReport {
    pub run_id: String,
    /// Rows actually deleted per table, in deletion order.
    pub deleted: IndexMap<String, u64>,
    /// Keys the entry recorded per processed table.
    pub requested: IndexMap<String, usize>,
    pub skipped: Vec<(String, RollbackSkip)>,
}

impl RollbackReport {
    pub fn total_deleted(&self) -> u64 {
        self.deleted.values().sum()
    }

    pub fn total_requested(&self) -> usize {
        self.requested.values().sum()
    }

    /// Recorded rows that were already gone when the rollback ran.
    pub fn missing_rows(&self) -> usize {
        self.total_requested()
            .saturating_sub(usize::try_from(self.total_deleted()).unwrap_or(usize::MAX))
    }

    /// One-line human-readable outcome.
    pub fn outcome(&self) -> String {
        let mut msg = format!(
            "Rolled back run {}: deleted {} rows from {} tables",
            self.run_id,
            self.total_deleted(),
            self.deleted.len()
        );
        let missing = self.missing_rows();
        if missing > 0 {
            msg.push_str(&format!(" ({} recorded rows were already gone)", missing));
        }
        if !self.skipped.is_empty() {
            msg.push_str(&format!(", skipped {} tables", self.skipped.len()));
        }
        msg
    }
}

/// Delete every row recorded in `entry`.
///
/// Primary key columns come from `schema`, not from the entry; tables the
/// schema does not declare or declares without a key are skipped. Any delete
/// failure rolls back the whole transaction and is returned.
pub async fn rollback<S: TransactionalStore>(
    store: &mut S,
    schema: &SchemaModel,
    entry: &RunLedgerEntry,
) -> Result<RollbackReport> {
    if let Some(recorded) = &entry.schema_fingerprint {
        if *recorded != schema.fingerprint() {
            warn!(
                "Schema differs from the one run {} was provisioned against; primary keys are resolved from the current schema",
                entry.run_id
            );
        }
    }

    let mut report = RollbackReport {
        run_id: entry.run_id.clone(),
        ..Default::default()
    };

    let mut targets: Vec<(&str, &str, &[u64])> = Vec::new();
    for table_name in entry.rollback_order() {
        let keys = entry
            .inserted_rows
            .get(table_name)
            .map(|k| k.as_slice())
            .unwrap_or(&[]);

        let skip = match schema.table(table_name) {
            None => Some(RollbackSkip::NotInSchema),
            Some(t) => match &t.primary_key {
                None => Some(RollbackSkip::NoPrimaryKey),
                Some(_) if keys.is_empty() => Some(RollbackSkip::NoKeys),
                Some(pk) => {
                    targets.push((table_name, pk.as_str(), keys));
                    None
                }
            },
        };
        if let Some(reason) = skip {
            info!("Skipping {}: {}", table_name, reason);
            report.skipped.push((table_name.to_string(), reason));
        }
    }

    store.begin().await?;

    if let Err(e) = delete_targets(store, &targets, &mut report).await {
        if let Err(rollback_err) = store.rollback().await {
            warn!("Rollback of failed delete also failed: {}", rollback_err);
        }
        return Err(e);
    }

    store.commit().await?;
    info!("{}", report.outcome());
    Ok(report)
}

async fn delete_targets<S: TransactionalStore>(
    store: &mut S,
    targets: &[(&str, &str, &[u64])],
    report: &mut RollbackReport,
) -> Result<()> {
    for &(table, key_column, keys) in targets {
        // newest keys first, so rows referencing earlier rows of the same
        // table are gone before their parents
        let mut deleted = 0u64;
        for chunk in keys.rchunks(DELETE_BATCH_SIZE) {
            let batch: Vec<u64> = chunk.iter().rev().copied().collect();
            deleted += store.delete_keys(table, key_column, &batch).await?;
        }
        if deleted < keys.len() as u64 {
            debug!(
                "{}: {} of {} recorded rows deleted",
                table,
                deleted,
                keys.len()
            );
        }
        report.deleted.insert(table.to_string(), deleted);
        report.requested.insert(table.to_string(), keys.len());
    }
    Ok(())
}
