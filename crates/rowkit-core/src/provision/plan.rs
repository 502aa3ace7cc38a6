use std::fmt;

use crate::scenario::ScenarioModel;
use crate::schema::types::SchemaModel;

/// Why a scenario table will or will not be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Eligible,
    /// The scenario asks for zero (or fewer) rows.
    ZeroCount,
    /// The scenario names a table the schema does not declare.
    NotInSchema,
    /// Without a primary key the inserted rows could never be rolled back.
    NoPrimaryKey,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStatus::Eligible => write!(f, "eligible"),
            TableStatus::ZeroCount => write!(f, "count is zero"),
            TableStatus::NotInSchema => write!(f, "not declared in schema"),
            TableStatus::NoPrimaryKey => write!(f, "no primary key"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub table: String,
    pub row_count: usize,
    pub status: TableStatus,
}

/// Every scenario table in scenario order, each with its status.
#[derive(Debug, Clone, Default)]
pub struct ProvisionPlan {
    pub entries: Vec<PlanEntry>,
}

impl ProvisionPlan {
    pub fn build(schema: &SchemaModel, scenario: &ScenarioModel) -> Self {
        let entries = scenario
            .tables
            .values()
            .map(|st| {
                let status = if !st.is_active() {
                    TableStatus::ZeroCount
                } else {
                    match schema.table(&st.name) {
                        None => TableStatus::NotInSchema,
                        Some(t) if !t.is_eligible() => TableStatus::NoPrimaryKey,
                        Some(_) => TableStatus::Eligible,
                    }
                };
                PlanEntry {
                    table: st.name.clone(),
                    row_count: st.row_count(),
                    status,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn eligible(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == TableStatus::Eligible)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.status != TableStatus::Eligible)
    }

    /// Rows that a run will insert.
    pub fn total_rows(&self) -> usize {
        self.eligible().map(|e| e.row_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ddl;

    #[test]
    fn test_plan_statuses() {
        let schema = ddl::parse(
            "CREATE TABLE users (id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(20));\n\
             CREATE TABLE logs (msg TEXT);",
        )
        .schema;
        let scenario = ScenarioModel::load(
            r#"{ "tables": {
                "users": { "count": 5 },
                "logs": { "count": 3 },
                "ghosts": { "count": 2 },
                "idle": { "count": 0 }
            } }"#,
        )
        .unwrap();

        let plan = ProvisionPlan::build(&schema, &scenario);
        let statuses: Vec<_> = plan.entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                TableStatus::Eligible,
                TableStatus::NoPrimaryKey,
                TableStatus::NotInSchema,
                TableStatus::ZeroCount,
            ]
        );
        assert_eq!(plan.total_rows(), 5);
        assert_eq!(plan.eligible().count(), 1);
        assert_eq!(plan.skipped().count(), 3);
    }
}
