//! # Schema Creation
//!
//! Replays the `CREATE TABLE` statements of a DDL source against a live
//! database, creating only the tables that do not exist yet. Each statement
//! runs on its own; a failure is recorded for that table and the replay moves
//! on to the next one.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::ddl::extract_table_name;

/// The database operations schema creation needs.
pub trait SchemaExecutor: Send {
    /// Names of the base tables that already exist in the target database.
    fn existing_tables(&mut self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;

    /// Execute one DDL statement verbatim.
    fn execute_ddl(
        &mut self,
        table: &str,
        statement: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// What happened to one table during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationStatus {
    Created,
    AlreadyExists,
    Failed(String),
}

impl fmt::Display for CreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationStatus::Created => write!(f, "created"),
            CreationStatus::AlreadyExists => write!(f, "already exists"),
            CreationStatus::Failed(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Per-table outcome of a replay, in statement order.
#[derive(Debug, Clone, Default)]
pub struct CreationReport {
    pub results: IndexMap<String, CreationStatus>,
}

impl CreationReport {
    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, CreationStatus::Created))
    }

    pub fn already_existing(&self) -> usize {
        self.count(|s| matches!(s, CreationStatus::AlreadyExists))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, CreationStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} already existed, {} failed",
            self.created(),
            self.already_existing(),
            self.failed()
        )
    }

    fn count(&self, pred: impl Fn(&CreationStatus) -> bool) -> usize {
        self.results.values().filter(|s| pred(s)).count()
    }
}

/// Create every table from `statements` that `executor` does not already have.
///
/// Statements whose table name cannot be extracted are skipped. Only the
/// initial listing of existing tables can fail the whole replay; individual
/// statement failures end up in the report.
pub async fn create_missing_tables<E: SchemaExecutor>(
    executor: &mut E,
    statements: &[String],
    progress_callback: Option<&(dyn Fn(&str, usize, usize) + Send + Sync)>,
) -> Result<CreationReport> {
    let mut existing: HashSet<String> = executor.existing_tables().await?.into_iter().collect();
    let mut report = CreationReport::default();
    let total = statements.len();

    for (i, statement) in statements.iter().enumerate() {
        let Some(table) = extract_table_name(statement) else {
            warn!("Skipping CREATE statement without a table name");
            continue;
        };

        if let Some(cb) = progress_callback {
            cb(&table, i + 1, total);
        }

        let status = if existing.contains(&table) {
            debug!("{}: already exists", table);
            CreationStatus::AlreadyExists
        } else {
            match executor.execute_ddl(&table, statement).await {
                Ok(()) => {
                    debug!("{}: created", table);
                    existing.insert(table.clone());
                    CreationStatus::Created
                }
                Err(e) => {
                    warn!("{}: {}", table, e);
                    CreationStatus::Failed(e.to_string())
                }
            }
        };
        report.results.insert(table, status);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowKitError;

    #[derive(Default)]
    struct RecordingExecutor {
        existing: Vec<String>,
        failing: Vec<String>,
        executed: Vec<String>,
    }

    impl SchemaExecutor for RecordingExecutor {
        async fn existing_tables(&mut self) -> Result<Vec<String>> {
            Ok(self.existing.clone())
        }

        async fn execute_ddl(&mut self, table: &str, _statement: &str) -> Result<()> {
            if self.failing.iter().any(|t| t == table) {
                return Err(RowKitError::Other(format!("cannot create {}", table)));
            }
            self.executed.push(table.to_string());
            Ok(())
        }
    }

    fn statements() -> Vec<String> {
        vec![
            "CREATE TABLE users (id INT PRIMARY KEY);".to_string(),
            "CREATE TABLE orders (id INT PRIMARY KEY);".to_string(),
            "CREATE TABLE ;".to_string(),
            "CREATE TABLE audit (id INT PRIMARY KEY);".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_creates_only_missing_tables() {
        let mut executor = RecordingExecutor {
            existing: vec!["users".to_string()],
            failing: vec!["audit".to_string()],
            ..Default::default()
        };

        let report = create_missing_tables(&mut executor, &statements(), None)
            .await
            .unwrap();

        assert_eq!(executor.executed, vec!["orders"]);
        assert_eq!(report.results["users"], CreationStatus::AlreadyExists);
        assert_eq!(report.results["orders"], CreationStatus::Created);
        assert!(matches!(report.results["audit"], CreationStatus::Failed(_)));
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summary(), "1 created, 1 already existed, 1 failed");
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_duplicate_statement_reports_existing() {
        let mut executor = RecordingExecutor::default();
        let statements = vec![
            "CREATE TABLE t (id INT);".to_string(),
            "CREATE TABLE t (id BIGINT);".to_string(),
        ];
        let report = create_missing_tables(&mut executor, &statements, None)
            .await
            .unwrap();
        assert_eq!(executor.executed, vec!["t"]);
        assert_eq!(report.results["t"], CreationStatus::AlreadyExists);
    }
}
