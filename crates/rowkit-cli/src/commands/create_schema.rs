use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};

use rowkit_core::schema::create::{create_missing_tables, CreationReport};
use rowkit_core::schema::ddl;
use rowkit_core::store::MySqlStore;

use crate::args::CreateSchemaArgs;

pub async fn run(args: &CreateSchemaArgs) -> Result<()> {
    let config = super::load_config()?;
    let db_url = super::resolve_db_url(args.db.as_deref(), &config)?;

    let statements = ddl::create_statements_from_file(&args.schema)
        .with_context(|| format!("Failed to read schema {}", args.schema.display()))?;
    if statements.is_empty() {
        println!("No CREATE TABLE statements in {}", args.schema.display());
        return Ok(());
    }

    let mut store = MySqlStore::connect(&db_url).await?;

    let pb = super::row_bar(statements.len() as u64);
    let pb_ref = pb.clone();
    let callback = move |table: &str, done: usize, _total: usize| {
        pb_ref.set_message(table.to_string());
        pb_ref.set_position(done as u64);
    };

    let result = create_missing_tables(&mut store, &statements, Some(&callback)).await;
    store.close().await;
    pb.finish_and_clear();
    let report = result?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &CreationReport) {
    let mut table = ComfyTable::new();
    table.set_header(vec!["Table", "Result"]);
    for (name, status) in &report.results {
        table.add_row(vec![Cell::new(name), Cell::new(status.to_string())]);
    }
    println!("{table}");
    println!("Schema creation: {}", report.summary());
}
