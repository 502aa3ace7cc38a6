//! # Session
//!
//! The context one CLI invocation works in: the active profile, the parsed
//! schema, and (once selected) the scenario. Built once and passed by
//! reference to whichever operation runs.

use std::path::Path;

use crate::analyze::{self, AnalysisReport};
use crate::config::RowKitConfig;
use crate::error::{Result, RowKitError};
use crate::ledger::RunLedger;
use crate::provision::ProvisionRequest;
use crate::scenario::{scenario_name_from_path, ScenarioModel};
use crate::schema::ddl::{self, ParseOutcome, SkippedDefinition};
use crate::schema::types::SchemaModel;

#[derive(Debug, Clone)]
pub struct Session {
    pub profile: String,
    pub schema: SchemaModel,
    pub diagnostics: Vec<SkippedDefinition>,
    pub config: RowKitConfig,
    scenario: Option<(String, ScenarioModel)>,
}

impl Session {
    pub fn new(profile: impl Into<String>, outcome: ParseOutcome, config: RowKitConfig) -> Self {
        Self {
            profile: profile.into(),
            schema: outcome.schema,
            diagnostics: outcome.skipped,
            config,
            scenario: None,
        }
    }

    /// Parse the DDL file at `schema_path` and start a session on it.
    pub fn open(
        profile: impl Into<String>,
        schema_path: &Path,
        config: RowKitConfig,
    ) -> Result<Self> {
        let outcome = ddl::parse_file(schema_path)?;
        Ok(Self::new(profile, outcome, config))
    }

    pub fn with_scenario(mut self, name: impl Into<String>, scenario: ScenarioModel) -> Self {
        self.scenario = Some((name.into(), scenario));
        self
    }

    /// Load the scenario file at `path`; its stem becomes the scenario name.
    pub fn load_scenario(self, path: &Path) -> Result<Self> {
        let scenario = ScenarioModel::load_file(path)?;
        Ok(self.with_scenario(scenario_name_from_path(path), scenario))
    }

    pub fn scenario(&self) -> Result<(&str, &ScenarioModel)> {
        self.scenario
            .as_ref()
            .map(|(name, model)| (name.as_str(), model))
            .ok_or_else(|| RowKitError::Scenario {
                message: "No scenario selected".to_string(),
            })
    }

    pub fn ledger(&self) -> RunLedger {
        RunLedger::new(self.config.ledger_dir())
    }

    /// Provisioning request for the current profile and scenario. An explicit
    /// seed wins over the configured one.
    pub fn request(&self, seed: Option<u64>) -> Result<ProvisionRequest> {
        let (name, _) = self.scenario()?;
        Ok(ProvisionRequest::new(self.profile.clone(), name)
            .with_seed(seed.or(self.config.generate.seed)))
    }

    pub fn analyze(&self) -> Result<AnalysisReport> {
        let (_, scenario) = self.scenario()?;
        Ok(analyze::analyze(&self.schema, scenario, &self.diagnostics))
    }
}
