pub mod analyze;
pub mod create_schema;
pub mod provision;
pub mod rollback;
pub mod runs;

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use rowkit_core::config::{self, RowKitConfig};
use rowkit_core::error::RowKitError;
use rowkit_core::ledger::RunLedger;
use rowkit_core::session::Session;

use crate::args::ProjectArgs;

/// Optional rowkit.toml from the working directory, or defaults.
pub(crate) fn load_config() -> Result<RowKitConfig> {
    Ok(config::read_config(Path::new("."))
        .context("Failed to load rowkit.toml")?
        .unwrap_or_default())
}

/// Connection URL from `--db`, then `DATABASE_URL` (or .env), then rowkit.toml.
pub(crate) fn resolve_db_url(explicit: Option<&str>, config: &RowKitConfig) -> Result<String> {
    if let Some(url) = explicit {
        return Ok(url.to_string());
    }

    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }

    if let Some(ref url) = config.database.url {
        return Ok(url.clone());
    }

    Err(RowKitError::NoDatabaseUrl.into())
}

/// Apply command-line overrides on top of the file config.
pub(crate) fn apply_project(mut config: RowKitConfig, project: &ProjectArgs) -> RowKitConfig {
    if let Some(dir) = &project.ledger_dir {
        config.ledger.dir = Some(dir.clone());
        // a directory given on the command line is relative to the CWD
        config.config_dir = None;
    }
    if let Some(profile) = &project.profile {
        config.profile.name = Some(profile.clone());
    }
    config
}

pub(crate) fn ledger(project: &ProjectArgs) -> Result<(RunLedger, RowKitConfig)> {
    let config = apply_project(load_config()?, project);
    Ok((RunLedger::new(config.ledger_dir()), config))
}

/// Parse the schema file and open a session for the configured profile.
pub(crate) fn open_session(schema: &Path, config: RowKitConfig) -> Result<Session> {
    let profile = config.profile_name().to_string();
    let session = Session::open(profile, schema, config)
        .with_context(|| format!("Failed to load schema {}", schema.display()))?;
    for skipped in &session.diagnostics {
        tracing::warn!("{}", skipped);
    }
    Ok(session)
}

pub(crate) fn spinner(prefix: &str, message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} [{prefix}] {msg}") {
        pb.set_style(style);
    }
    pb.set_prefix(prefix.to_string());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

pub(crate) fn row_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg:<20} {bar:40.cyan/dim} {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb
}
