use anyhow::Result;
use comfy_table::{Cell, Table as ComfyTable};

use rowkit_core::ledger::types::LedgerSummary;

use crate::args::RunsArgs;

pub fn run(args: &RunsArgs) -> Result<()> {
    let (ledger, config) = super::ledger(&args.project)?;

    let runs: Vec<LedgerSummary> = match &args.scenario {
        Some(scenario) => ledger.list_for(config.profile_name(), scenario)?,
        None => ledger
            .list_all()?
            .into_iter()
            .filter(|s| {
                args.project
                    .profile
                    .as_deref()
                    .is_none_or(|profile| s.profile == profile)
            })
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No recorded runs under {}", ledger.root().display());
        return Ok(());
    }

    let mut table = ComfyTable::new();
    table.set_header(vec!["Run", "Created", "Profile", "Scenario", "Tables", "Rows"]);
    for summary in &runs {
        table.add_row(vec![
            Cell::new(&summary.run_id),
            Cell::new(&summary.created_at),
            Cell::new(&summary.profile),
            Cell::new(&summary.scenario),
            Cell::new(summary.tables),
            Cell::new(summary.rows),
        ]);
    }
    println!("{table}");
    println!("{} runs under {}", runs.len(), ledger.root().display());
    Ok(())
}
