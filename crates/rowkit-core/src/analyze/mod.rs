//! # Scenario Analysis
//!
//! A dry run over a schema and scenario: which tables a provisioning run
//! would populate, which it would skip and why, and which relation
//! descriptors would end up producing NULLs.

use std::fmt;

use crate::provision::plan::{ProvisionPlan, TableStatus};
use crate::scenario::ScenarioModel;
use crate::schema::ddl::SkippedDefinition;
use crate::schema::types::SchemaModel;

/// A relation descriptor that will not behave as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationWarning {
    pub table: String,
    pub column: String,
    pub kind: RelationIssue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationIssue {
    /// The descriptor is not `parent_table.parent_key`.
    Malformed(String),
    /// The relation column is not declared on the child table.
    UnknownColumn,
    /// The parent table is not populated by this scenario, so its pool stays
    /// empty and every value is NULL.
    ParentNotPopulated(String),
    /// The parent is populated only after the child, so the child sees an
    /// empty pool.
    ParentAfterChild(String),
    /// The descriptor names a column other than the parent's primary key.
    /// Values are always drawn from primary keys.
    KeyMismatch { named: String, primary: String },
    /// Relation column is NOT NULL without a default, but the parent pool
    /// will be empty, so inserts will fail.
    NullIntoRequired(String),
}

impl fmt::Display for RelationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: ", self.table, self.column)?;
        match &self.kind {
            RelationIssue::Malformed(raw) => {
                write!(f, "relation '{}' is not parent_table.parent_key; values will be NULL", raw)
            }
            RelationIssue::UnknownColumn => write!(f, "column is not declared on the table"),
            RelationIssue::ParentNotPopulated(parent) => {
                write!(f, "parent {} is not populated; values will be NULL", parent)
            }
            RelationIssue::ParentAfterChild(parent) => write!(
                f,
                "parent {} is populated after this table; values will be NULL",
                parent
            ),
            RelationIssue::KeyMismatch { named, primary } => write!(
                f,
                "relation names {} but values come from primary key {}",
                named, primary
            ),
            RelationIssue::NullIntoRequired(parent) => write!(
                f,
                "column is NOT NULL but parent {} will have no keys; inserts will fail",
                parent
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub schema_tables: usize,
    pub schema_columns: usize,
    pub schema_eligible: usize,
    pub diagnostics: Vec<SkippedDefinition>,
    pub plan: ProvisionPlan,
    pub warnings: Vec<RelationWarning>,
}

impl AnalysisReport {
    pub fn total_rows(&self) -> usize {
        self.plan.total_rows()
    }

    /// Human-readable summary for terminal output.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Schema: {} tables, {} columns, {} with a primary key",
            self.schema_tables, self.schema_columns, self.schema_eligible
        )];
        lines.push(format!(
            "Scenario: {} rows into {} tables",
            self.total_rows(),
            self.plan.eligible().count()
        ));
        for entry in self.plan.skipped() {
            lines.push(format!("  - skip {}: {}", entry.table, entry.status));
        }
        for w in &self.warnings {
            lines.push(format!("  ! {}", w));
        }
        for d in &self.diagnostics {
            lines.push(format!("  ? {}", d));
        }
        lines.join("\n")
    }
}

/// Analyze `scenario` against `schema`. `diagnostics` are the parser's
/// skipped definitions, carried into the report unchanged.
pub fn analyze(
    schema: &SchemaModel,
    scenario: &ScenarioModel,
    diagnostics: &[SkippedDefinition],
) -> AnalysisReport {
    let plan = ProvisionPlan::build(schema, scenario);
    let warnings = relation_warnings(schema, scenario, &plan);

    AnalysisReport {
        schema_tables: schema.table_count(),
        schema_columns: schema.column_count(),
        schema_eligible: schema.eligible_table_count(),
        diagnostics: diagnostics.to_vec(),
        plan,
        warnings,
    }
}

fn relation_warnings(
    schema: &SchemaModel,
    scenario: &ScenarioModel,
    plan: &ProvisionPlan,
) -> Vec<RelationWarning> {
    let populated: Vec<&str> = plan.eligible().map(|e| e.table.as_str()).collect();
    let mut warnings = Vec::new();

    for (position, table_name) in populated.iter().enumerate() {
        let (Some(table), Some(scenario_table)) =
            (schema.table(table_name), scenario.table(table_name))
        else {
            continue;
        };

        for (column_name, raw) in &scenario_table.relations {
            let mut warn = |kind| {
                warnings.push(RelationWarning {
                    table: table_name.to_string(),
                    column: column_name.clone(),
                    kind,
                })
            };

            let Some(column) = table.column(column_name) else {
                warn(RelationIssue::UnknownColumn);
                continue;
            };
            let Some(relation) = scenario_table.relation(column_name) else {
                warn(RelationIssue::Malformed(raw.clone()));
                continue;
            };

            let parent_position = populated
                .iter()
                .position(|t| *t == relation.parent_table);
            let empty_pool = match parent_position {
                None => {
                    warn(RelationIssue::ParentNotPopulated(relation.parent_table.clone()));
                    true
                }
                // a self-reference fills from the table's own earlier rows
                Some(p) if p > position => {
                    warn(RelationIssue::ParentAfterChild(relation.parent_table.clone()));
                    true
                }
                Some(_) => false,
            };

            if empty_pool && !column.nullable && !column.has_default {
                warn(RelationIssue::NullIntoRequired(relation.parent_table.clone()));
            }

            if let Some(primary) = schema
                .table(&relation.parent_table)
                .and_then(|t| t.primary_key.as_ref())
            {
                if *primary != relation.parent_key {
                    warn(RelationIssue::KeyMismatch {
                        named: relation.parent_key.clone(),
                        primary: primary.clone(),
                    });
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ddl;

    const DDL: &str = "\
CREATE TABLE users (id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(50));
CREATE TABLE orders (
  id INT AUTO_INCREMENT PRIMARY KEY,
  user_id INT NOT NULL,
  coupon_id INT,
  note TEXT
);
CREATE TABLE coupons (code INT AUTO_INCREMENT PRIMARY KEY);
CREATE TABLE logs (line TEXT);
";

    fn report(scenario: &str) -> AnalysisReport {
        let outcome = ddl::parse(DDL);
        let scenario = ScenarioModel::load(scenario).unwrap();
        analyze(&outcome.schema, &scenario, &outcome.skipped)
    }

    #[test]
    fn test_clean_scenario_has_no_warnings() {
        let r = report(
            r#"{ "tables": {
                "users": { "count": 3 },
                "orders": { "count": 6, "relations": { "user_id": "users.id" } }
            } }"#,
        );
        assert!(r.warnings.is_empty(), "{:?}", r.warnings);
        assert_eq!(r.total_rows(), 9);
        assert_eq!(r.schema_tables, 4);
        assert_eq!(r.schema_eligible, 3);
    }

    #[test]
    fn test_parent_after_child_on_required_column() {
        let r = report(
            r#"{ "tables": {
                "orders": { "count": 6, "relations": { "user_id": "users.id" } },
                "users": { "count": 3 }
            } }"#,
        );
        let kinds: Vec<_> = r.warnings.iter().map(|w| w.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                RelationIssue::ParentAfterChild("users".to_string()),
                RelationIssue::NullIntoRequired("users".to_string()),
            ]
        );
    }

    #[test]
    fn test_various_relation_issues() {
        let r = report(
            r#"{ "tables": {
                "users": { "count": 3 },
                "coupons": { "count": 0 },
                "orders": { "count": 6, "relations": {
                    "user_id": "users.name",
                    "coupon_id": "coupons.code",
                    "note": "garbage",
                    "missing": "users.id"
                } }
            } }"#,
        );
        let kinds: Vec<_> = r.warnings.iter().map(|w| w.kind.clone()).collect();
        assert!(kinds.contains(&RelationIssue::KeyMismatch {
            named: "name".to_string(),
            primary: "id".to_string(),
        }));
        assert!(kinds.contains(&RelationIssue::ParentNotPopulated("coupons".to_string())));
        assert!(kinds.contains(&RelationIssue::Malformed("garbage".to_string())));
        assert!(kinds.contains(&RelationIssue::UnknownColumn));
        // coupon_id is nullable, so no insert failure is predicted
        assert!(!kinds.contains(&RelationIssue::NullIntoRequired("coupons".to_string())));
    }

    #[test]
    fn test_summary_mentions_skips() {
        let r = report(r#"{ "tables": { "logs": { "count": 2 }, "users": { "count": 1 } } }"#);
        let summary = r.summary();
        assert!(summary.contains("skip logs: no primary key"));
        assert!(summary.contains("Scenario: 1 rows into 1 tables"));
    }
}
