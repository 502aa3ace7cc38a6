use anyhow::{bail, Context, Result};
use comfy_table::{Cell, Table as ComfyTable};

use rowkit_core::rollback::{rollback, RollbackReport};
use rowkit_core::store::MySqlStore;

use crate::args::RollbackArgs;

pub async fn run(args: &RollbackArgs) -> Result<()> {
    let (ledger, config) = super::ledger(&args.project)?;
    let db_url = super::resolve_db_url(args.db.as_deref(), &config)?;

    let (entry, path) = match &args.run_id {
        Some(run_id) => ledger.find(run_id)?,
        None => match ledger.latest()? {
            Some(found) => found,
            None => bail!("No recorded runs under {}", ledger.root().display()),
        },
    };
    tracing::debug!("Rolling back from {}", path.display());

    let session = super::open_session(&args.schema, config)?;

    let pb = super::spinner("db", &format!("Deleting rows of run {}...", entry.run_id));
    let mut store = MySqlStore::connect(&db_url).await?;
    let result = rollback(&mut store, &session.schema, &entry).await;
    store.close().await;
    pb.finish_and_clear();

    let report = result.with_context(|| {
        format!(
            "Rollback of run {} failed; no rows were deleted",
            entry.run_id
        )
    })?;

    print_report(&report);
    println!("{}", report.outcome());
    Ok(())
}

fn print_report(report: &RollbackReport) {
    let mut table = ComfyTable::new();
    table.set_header(vec!["Table", "Recorded", "Deleted"]);
    for (name, deleted) in &report.deleted {
        let recorded = report.requested.get(name).copied().unwrap_or(0);
        table.add_row(vec![Cell::new(name), Cell::new(recorded), Cell::new(deleted)]);
    }
    for (name, reason) in &report.skipped {
        table.add_row(vec![
            Cell::new(name),
            Cell::new("-"),
            Cell::new(format!("skipped: {}", reason)),
        ]);
    }
    println!("{table}");
}
