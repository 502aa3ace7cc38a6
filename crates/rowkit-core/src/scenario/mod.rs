//! # Scenario Loading
//!
//! A scenario is a JSON document naming which tables to populate, how many
//! rows each gets, and which columns should reference keys of a previously
//! populated table:
//!
//! ```json
//! {
//!   "tables": {
//!     "users":  { "count": 10 },
//!     "orders": { "count": 50, "relations": { "user_id": "users.id" } }
//!   }
//! }
//! ```
//!
//! Table order in the document is the insertion order for a run. Relation
//! descriptors are kept as written and parsed lazily; a malformed descriptor
//! only turns its column into NULL during synthesis.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, RowKitError};

/// Parsed scenario: populated tables in document order.
#[derive(Debug, Clone, Default)]
pub struct ScenarioModel {
    pub tables: IndexMap<String, ScenarioTable>,
}

/// One table entry of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioTable {
    pub name: String,
    /// Requested row count. Zero or negative means "do not populate".
    pub count: i64,
    /// Column name to raw `parent_table.parent_key` descriptor.
    pub relations: IndexMap<String, String>,
}

/// A parsed `parent_table.parent_key` relation descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub parent_table: String,
    pub parent_key: String,
}

#[derive(Deserialize)]
struct RawScenario {
    #[serde(default)]
    tables: Option<IndexMap<String, RawScenarioTable>>,
}

#[derive(Deserialize)]
struct RawScenarioTable {
    #[serde(default)]
    count: Option<i64>,
    #[serde(default)]
    relations: Option<IndexMap<String, String>>,
}

impl ScenarioModel {
    /// Parse a scenario from JSON text.
    pub fn load(source: &str) -> Result<Self> {
        let raw: RawScenario =
            serde_json::from_str(source).map_err(|e| RowKitError::Scenario {
                message: e.to_string(),
            })?;

        let tables = raw
            .tables
            .unwrap_or_default()
            .into_iter()
            .map(|(name, entry)| {
                let table = ScenarioTable {
                    name: name.clone(),
                    count: entry.count.unwrap_or(0),
                    relations: entry.relations.unwrap_or_default(),
                };
                (name, table)
            })
            .collect();

        Ok(Self { tables })
    }

    /// Read and parse a scenario file.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RowKitError::MissingResource {
                kind: "Scenario file",
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| RowKitError::Io {
            message: format!("Failed to read {}", path.display()),
            source: e,
        })?;
        Self::load(&content).map_err(|e| match e {
            RowKitError::Scenario { message } => RowKitError::Scenario {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    pub fn table(&self, name: &str) -> Option<&ScenarioTable> {
        self.tables.get(name)
    }

    /// Total rows requested across all tables with a positive count.
    pub fn total_rows(&self) -> usize {
        self.tables.values().map(|t| t.row_count()).sum()
    }
}

impl ScenarioTable {
    pub fn is_active(&self) -> bool {
        self.count > 0
    }

    pub fn row_count(&self) -> usize {
        usize::try_from(self.count).unwrap_or(0)
    }

    /// The parsed relation for `column`, if one is declared and well-formed.
    pub fn relation(&self, column: &str) -> Option<RelationDescriptor> {
        self.relations
            .get(column)
            .and_then(|raw| RelationDescriptor::parse(raw))
    }
}

impl RelationDescriptor {
    /// Parse `parent_table.parent_key`. Anything other than exactly two
    /// non-empty dot-separated parts is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let (table, key) = raw.trim().split_once('.')?;
        if table.is_empty() || key.is_empty() || key.contains('.') {
            return None;
        }
        Some(Self {
            parent_table: table.to_string(),
            parent_key: key.to_string(),
        })
    }
}

impl std::fmt::Display for RelationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.parent_table, self.parent_key)
    }
}

/// Scenario identity used in ledger paths: the file name without extension.
pub fn scenario_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "scenario".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_preserves_order_and_relations() {
        let scenario = ScenarioModel::load(
            r#"{
                "tables": {
                    "users": { "count": 10 },
                    "orders": { "count": 50, "relations": { "user_id": "users.id" } }
                }
            }"#,
        )
        .unwrap();

        let names: Vec<_> = scenario.tables.keys().cloned().collect();
        assert_eq!(names, vec!["users", "orders"]);
        assert_eq!(scenario.total_rows(), 60);

        let orders = scenario.table("orders").unwrap();
        assert_eq!(
            orders.relation("user_id"),
            Some(RelationDescriptor {
                parent_table: "users".to_string(),
                parent_key: "id".to_string(),
            })
        );
        assert!(orders.relation("total").is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let scenario =
            ScenarioModel::load(r#"{ "tables": { "audit": {}, "tags": { "count": -3 } } }"#)
                .unwrap();
        let audit = scenario.table("audit").unwrap();
        assert_eq!(audit.count, 0);
        assert!(!audit.is_active());
        assert!(audit.relations.is_empty());
        assert_eq!(scenario.table("tags").unwrap().row_count(), 0);
        assert_eq!(scenario.total_rows(), 0);
    }

    #[test]
    fn test_missing_tables_key_is_empty() {
        let scenario = ScenarioModel::load("{}").unwrap();
        assert!(scenario.tables.is_empty());
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = ScenarioModel::load("{ not json").unwrap_err();
        assert!(matches!(err, RowKitError::Scenario { .. }));

        let err = ScenarioModel::load(r#"{ "tables": { "users": { "count": "ten" } } }"#)
            .unwrap_err();
        assert!(matches!(err, RowKitError::Scenario { .. }));
    }

    #[test]
    fn test_relation_descriptor_parse() {
        assert!(RelationDescriptor::parse("users.id").is_some());
        assert!(RelationDescriptor::parse("users").is_none());
        assert!(RelationDescriptor::parse(".id").is_none());
        assert!(RelationDescriptor::parse("users.").is_none());
        assert!(RelationDescriptor::parse("db.users.id").is_none());
    }

    #[test]
    fn test_load_file_missing() {
        let err = ScenarioModel::load_file(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(matches!(err, RowKitError::MissingResource { .. }));
    }

    #[test]
    fn test_scenario_name_from_path() {
        assert_eq!(
            scenario_name_from_path(Path::new("scenarios/smoke.json")),
            "smoke"
        );
    }
}
