use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rowkit",
    about = "Provision scenario-driven test data into MySQL and roll it back",
    version,
    after_help = "Examples:\n  rowkit analyze --schema schema.sql --scenario smoke.json\n  rowkit create-schema --db mysql://root@localhost/app --schema schema.sql\n  rowkit provision --schema schema.sql --scenario smoke.json --seed 42\n  rowkit runs --profile local\n  rowkit rollback --schema schema.sql --latest"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a scenario against a schema without touching the database
    Analyze(AnalyzeArgs),

    /// Create the schema's tables that do not exist yet
    CreateSchema(CreateSchemaArgs),

    /// Insert a scenario's rows and record them in the run ledger
    Provision(ProvisionArgs),

    /// Delete the rows a recorded run inserted
    Rollback(RollbackArgs),

    /// List recorded runs
    Runs(RunsArgs),
}

/// Options shared by every command that reads the ledger or names a profile.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Profile name recorded with each run (default: rowkit.toml, then "default")
    #[arg(long)]
    pub profile: Option<String>,

    /// Ledger root directory (default: rowkit.toml, then ./work)
    #[arg(long)]
    pub ledger_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Schema file with CREATE TABLE statements
    #[arg(long)]
    pub schema: PathBuf,

    /// Scenario JSON file
    #[arg(long)]
    pub scenario: PathBuf,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Parser, Debug)]
pub struct CreateSchemaArgs {
    /// MySQL connection URL
    /// Falls back to DATABASE_URL env var, .env file, or rowkit.toml
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema file with CREATE TABLE statements
    #[arg(long)]
    pub schema: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// MySQL connection URL
    /// Falls back to DATABASE_URL env var, .env file, or rowkit.toml
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema file with CREATE TABLE statements
    #[arg(long)]
    pub schema: PathBuf,

    /// Scenario JSON file; its file stem names the scenario in the ledger
    #[arg(long)]
    pub scenario: PathBuf,

    /// Random seed for reproducible values
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Parser, Debug)]
pub struct RollbackArgs {
    /// Run id to roll back (see `rowkit runs`)
    #[arg(required_unless_present = "latest", conflicts_with = "latest")]
    pub run_id: Option<String>,

    /// Roll back the most recent run
    #[arg(long)]
    pub latest: bool,

    /// MySQL connection URL
    /// Falls back to DATABASE_URL env var, .env file, or rowkit.toml
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema file the primary key columns are read from
    #[arg(long)]
    pub schema: PathBuf,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Parser, Debug)]
pub struct RunsArgs {
    /// Only list runs of this scenario (requires a profile)
    #[arg(long)]
    pub scenario: Option<String>,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub project: ProjectArgs,
}
