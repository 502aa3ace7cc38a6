//! # Provisioning
//!
//! Populates the tables a scenario names, all inside one transaction, and
//! captures the key the database generated for every inserted row. On
//! success the captured keys become a [`RunLedgerEntry`]; on any failure the
//! transaction is rolled back and nothing is recorded.

pub mod plan;

use chrono::{Local, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::error::{Result, RowKitError};
use crate::generate::key_pool::KeyPool;
use crate::generate::synthesize::build_row;
use crate::graph::deletion_order;
use crate::ledger::types::RunLedgerEntry;
use crate::ledger::RunLedger;
use crate::scenario::ScenarioModel;
use crate::schema::types::SchemaModel;
use crate::store::TransactionalStore;

pub use plan::{PlanEntry, ProvisionPlan, TableStatus};

/// Identity and knobs for one provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub profile: String,
    /// Scenario identity recorded in the ledger.
    pub scenario_name: String,
    /// Fixed seed for the synthesizer. A random seed is drawn when unset.
    pub seed: Option<u64>,
}

impl ProvisionRequest {
    pub fn new(profile: impl Into<String>, scenario_name: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            scenario_name: scenario_name.into(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// Run a scenario against `store` and return the ledger entry describing it.
///
/// Tables are populated in scenario order; tables with a non-positive count,
/// tables missing from the schema, and tables without a primary key are
/// skipped. All inserts share one transaction, which is committed only after
/// every row succeeded. The returned entry is not persisted; see
/// [`provision_and_record`].
pub async fn provision<S: TransactionalStore>(
    store: &mut S,
    schema: &SchemaModel,
    scenario: &ScenarioModel,
    request: &ProvisionRequest,
    progress_callback: Option<&(dyn Fn(&str, usize, usize) + Send + Sync)>,
) -> Result<RunLedgerEntry> {
    let plan = ProvisionPlan::build(schema, scenario);
    for entry in plan.skipped() {
        info!("Skipping {}: {}", entry.table, entry.status);
    }

    let seed = request.seed.unwrap_or_else(|| rand::rng().random());
    let base_time = run_base_time();
    info!(
        "Provisioning {} rows into {} tables (profile {}, scenario {}, seed {})",
        plan.total_rows(),
        plan.eligible().count(),
        request.profile,
        request.scenario_name,
        seed
    );

    let mut keys = KeyPool::new();
    store.begin().await?;

    let inserted = insert_planned(
        store,
        schema,
        scenario,
        &plan,
        &mut keys,
        seed,
        base_time,
        progress_callback,
    )
    .await;

    if let Err(e) = inserted {
        if let Err(rollback_err) = store.rollback().await {
            warn!("Rollback after failed insert also failed: {}", rollback_err);
        }
        return Err(e);
    }

    store.commit().await?;

    let tables = keys.table_names();
    let order = deletion_order(scenario, &tables);
    let mut entry = RunLedgerEntry::new(
        request.profile.clone(),
        request.scenario_name.clone(),
        keys.into_inner(),
    );
    entry.deletion_order = order;
    entry.seed = Some(seed);
    entry.schema_fingerprint = Some(schema.fingerprint());

    info!(
        "Run {} committed: {} rows across {} tables",
        entry.run_id,
        entry.row_count(),
        entry.table_count()
    );
    Ok(entry)
}

/// [`provision`], then persist the entry to `ledger`.
///
/// If the commit succeeded but the entry cannot be written, the full entry is
/// logged at error level (it is the only record of the inserted keys) and
/// [`RowKitError::LedgerPersist`] is returned.
pub async fn provision_and_record<S: TransactionalStore>(
    store: &mut S,
    schema: &SchemaModel,
    scenario: &ScenarioModel,
    request: &ProvisionRequest,
    ledger: &RunLedger,
    progress_callback: Option<&(dyn Fn(&str, usize, usize) + Send + Sync)>,
) -> Result<(RunLedgerEntry, PathBuf)> {
    let entry = provision(store, schema, scenario, request, progress_callback).await?;

    match ledger.save(&entry) {
        Ok(path) => {
            debug!("Ledger entry written to {}", path.display());
            Ok((entry, path))
        }
        Err(e) => {
            let dump = serde_json::to_string(&entry).unwrap_or_else(|_| format!("{:?}", entry));
            error!("Committed run {} has no ledger file; entry: {}", entry.run_id, dump);
            Err(RowKitError::LedgerPersist {
                run_id: entry.run_id.clone(),
                path: ledger.entry_path(&entry),
                source: Box::new(e),
            })
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn insert_planned<S: TransactionalStore>(
    store: &mut S,
    schema: &SchemaModel,
    scenario: &ScenarioModel,
    plan: &ProvisionPlan,
    keys: &mut KeyPool,
    seed: u64,
    base_time: NaiveDateTime,
    progress_callback: Option<&(dyn Fn(&str, usize, usize) + Send + Sync)>,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let total_rows = plan.total_rows();
    let mut rows_inserted = 0usize;

    for planned in plan.eligible() {
        let (Some(table), Some(scenario_table)) =
            (schema.table(&planned.table), scenario.table(&planned.table))
        else {
            continue;
        };

        keys.start_table(&table.name);
        for row_index in 0..planned.row_count {
            let row = build_row(table, scenario_table, keys, &mut rng, base_time);
            let key = store
                .insert_row(&table.name, &row, row_index)
                .await?
                .ok_or_else(|| RowKitError::MissingGeneratedKey {
                    table: table.name.clone(),
                    row_index,
                })?;
            keys.record_key(&table.name, key);

            rows_inserted += 1;
            if let Some(cb) = progress_callback {
                cb(&table.name, rows_inserted, total_rows);
            }
        }
        debug!("{}: {} rows inserted", table.name, planned.row_count);
    }

    Ok(())
}

/// One timestamp for the whole run, truncated to whole seconds.
fn run_base_time() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
