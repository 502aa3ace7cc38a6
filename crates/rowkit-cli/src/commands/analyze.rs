use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};

use rowkit_core::provision::TableStatus;

use crate::args::AnalyzeArgs;

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let config = super::apply_project(super::load_config()?, &args.project);
    let session = super::open_session(&args.schema, config)?
        .load_scenario(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;

    let (name, _) = session.scenario()?;
    let report = session.analyze()?;

    let mut table = ComfyTable::new();
    table.set_header(vec!["Table", "Rows", "Status"]);
    for entry in &report.plan.entries {
        let rows = if entry.status == TableStatus::Eligible {
            entry.row_count.to_string()
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            Cell::new(&entry.table),
            Cell::new(rows),
            Cell::new(entry.status.to_string()),
        ]);
    }

    println!("Profile: {}  Scenario: {}", session.profile, name);
    println!("{table}");
    println!();
    println!("{}", report.summary());
    Ok(())
}
