use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};

use rowkit_core::ledger::types::RunLedgerEntry;
use rowkit_core::provision::provision_and_record;
use rowkit_core::store::MySqlStore;

use crate::args::ProvisionArgs;

pub async fn run(args: &ProvisionArgs) -> Result<()> {
    let config = super::apply_project(super::load_config()?, &args.project);
    let db_url = super::resolve_db_url(args.db.as_deref(), &config)?;

    let session = super::open_session(&args.schema, config)?
        .load_scenario(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;
    let (_, scenario) = session.scenario()?;
    let request = session.request(args.seed)?;
    let ledger = session.ledger();

    let report = session.analyze()?;
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }
    if report.total_rows() == 0 {
        println!(
            "Nothing to provision: scenario {} populates no eligible tables",
            request.scenario_name
        );
        return Ok(());
    }

    let pb = super::spinner("db", "Connecting...");
    let mut store = MySqlStore::connect(&db_url).await?;
    pb.finish_with_message("Connecting... ✓");

    let bar = super::row_bar(report.total_rows() as u64);
    let bar_ref = bar.clone();
    let callback = move |table: &str, done: usize, _total: usize| {
        bar_ref.set_message(table.to_string());
        bar_ref.set_position(done as u64);
    };

    let result = provision_and_record(
        &mut store,
        &session.schema,
        scenario,
        &request,
        &ledger,
        Some(&callback),
    )
    .await;
    store.close().await;
    bar.finish_and_clear();

    let (entry, path) = result.with_context(|| {
        format!(
            "Provisioning scenario {} for profile {} failed",
            request.scenario_name, request.profile
        )
    })?;

    print_entry(&entry);
    println!("Ledger: {}", path.display());
    println!(
        "Provisioned run {}: {} rows into {} tables",
        entry.run_id,
        entry.row_count(),
        entry.table_count()
    );
    Ok(())
}

fn print_entry(entry: &RunLedgerEntry) {
    let mut table = ComfyTable::new();
    table.set_header(vec!["Table", "Rows", "Keys"]);
    for (name, keys) in &entry.inserted_rows {
        let span = match (keys.first(), keys.last()) {
            (Some(first), Some(last)) => format!("{}..{}", first, last),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(keys.len()),
            Cell::new(span),
        ]);
    }
    println!("{table}");
}
