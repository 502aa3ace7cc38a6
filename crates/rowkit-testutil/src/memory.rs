//! In-memory stand-in for a MySQL database.
//!
//! Enforces just enough of MySQL's behavior for the engines to be tested
//! without a server: auto-increment keys, NOT NULL columns, optional foreign
//! keys, and snapshot-based transactions. Failures can be injected at a given
//! insert or delete.

use indexmap::IndexMap;

use rowkit_core::error::{Result, RowKitError};
use rowkit_core::generate::synthesize::Row;
use rowkit_core::generate::value::Value;
use rowkit_core::schema::create::SchemaExecutor;
use rowkit_core::schema::ddl;
use rowkit_core::schema::types::{SchemaModel, Table};
use rowkit_core::store::TransactionalStore;

type StoredRow = IndexMap<String, Value>;

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    key_column: Option<String>,
    auto_increment: bool,
    columns: Vec<String>,
    required: Vec<String>,
    next_key: u64,
    rows: IndexMap<u64, StoredRow>,
}

impl MemoryTable {
    fn from_table(table: &Table) -> Self {
        let auto_increment = table
            .primary_key
            .as_deref()
            .and_then(|pk| table.column(pk))
            .is_some_and(|c| c.is_auto_increment);
        Self {
            key_column: table.primary_key.clone(),
            auto_increment,
            columns: table.columns.iter().map(|c| c.name.clone()).collect(),
            required: table
                .columns
                .iter()
                .filter(|c| !c.nullable && !c.has_default && !c.is_primary)
                .map(|c| c.name.clone())
                .collect(),
            next_key: 0,
            rows: IndexMap::new(),
        }
    }
}

/// A declared `child.column → parent` reference.
#[derive(Debug, Clone)]
struct ForeignKey {
    child: String,
    column: String,
    parent: String,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: IndexMap<String, MemoryTable>,
    foreign_keys: Vec<ForeignKey>,
    snapshot: Option<IndexMap<String, MemoryTable>>,
    fail_insert: Option<(String, usize)>,
    fail_delete: Option<String>,
    fail_ddl: Vec<String>,
    delete_batches: Vec<(String, usize)>,
    commits: usize,
    rollbacks: usize,
}

impl MemoryStore {
    /// An empty database with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// A database holding every table of `schema`, all empty.
    pub fn from_schema(schema: &SchemaModel) -> Self {
        let mut store = Self::new();
        for table in schema.tables.values() {
            store
                .tables
                .insert(table.name.clone(), MemoryTable::from_table(table));
        }
        store
    }

    /// Enforce that non-NULL values of `child.column` exist as keys of
    /// `parent`, and that referenced parent rows cannot be deleted.
    pub fn with_foreign_key(mut self, child: &str, column: &str, parent: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            child: child.to_string(),
            column: column.to_string(),
            parent: parent.to_string(),
        });
        self
    }

    /// Fail the insert of row `row_index` into `table`.
    pub fn fail_insert_at(mut self, table: &str, row_index: usize) -> Self {
        self.fail_insert = Some((table.to_string(), row_index));
        self
    }

    /// Fail every delete against `table`.
    pub fn fail_delete_on(mut self, table: &str) -> Self {
        self.fail_delete = Some(table.to_string());
        self
    }

    /// Fail DDL replay for `table`.
    pub fn fail_ddl_for(mut self, table: &str) -> Self {
        self.fail_ddl.push(table.to_string());
        self
    }

    /// Insert a row outside any transaction, as if it existed before the test.
    pub fn insert_committed(&mut self, table: &str, values: &[(&str, Value)]) -> Option<u64> {
        let t = self.tables.get_mut(table)?;
        t.next_key += 1;
        let key = t.next_key;
        let mut row: StoredRow = values
            .iter()
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect();
        if let Some(pk) = &t.key_column {
            row.insert(pk.clone(), Value::Key(key));
        }
        t.rows.insert(key, row);
        Some(key)
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(|t| t.rows.len()).sum()
    }

    pub fn keys(&self, table: &str) -> Vec<u64> {
        self.tables
            .get(table)
            .map(|t| t.rows.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn row(&self, table: &str, key: u64) -> Option<&IndexMap<String, Value>> {
        self.tables.get(table).and_then(|t| t.rows.get(&key))
    }

    /// Every value stored in `table.column`, in insertion order.
    pub fn column_values(&self, table: &str, column: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|t| {
                t.rows
                    .values()
                    .map(|r| r.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Table and key count of every DELETE issued, in order.
    pub fn delete_batches(&self) -> &[(String, usize)] {
        &self.delete_batches
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    fn require_transaction(&self, operation: &'static str) -> Result<()> {
        if self.snapshot.is_none() {
            return Err(RowKitError::NoTransaction { operation });
        }
        Ok(())
    }

    fn parent_has_key(&self, parent: &str, value: &Value) -> bool {
        value
            .as_key()
            .is_some_and(|k| self.tables.get(parent).is_some_and(|t| t.rows.contains_key(&k)))
    }
}

impl TransactionalStore for MemoryStore {
    async fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(RowKitError::Other(
                "A transaction is already open on this store".to_string(),
            ));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    async fn insert_row(&mut self, table: &str, row: &Row, row_index: usize) -> Result<Option<u64>> {
        self.require_transaction("insert")?;

        if let Some((fail_table, fail_index)) = &self.fail_insert {
            if fail_table == table && *fail_index == row_index {
                return Err(RowKitError::ConstraintViolation {
                    table: table.to_string(),
                    column: "(injected)".to_string(),
                    message: format!("injected failure at row {}", row_index),
                });
            }
        }

        let Some(target) = self.tables.get(table) else {
            return Err(RowKitError::Other(format!("Table '{}' doesn't exist", table)));
        };

        for column in row.columns() {
            if !target.columns.iter().any(|c| c == column) {
                return Err(RowKitError::Other(format!(
                    "Unknown column '{}' in '{}'",
                    column, table
                )));
            }
        }
        for column in &target.required {
            if row.get(column).is_none_or(|v| v.is_null()) {
                return Err(RowKitError::ConstraintViolation {
                    table: table.to_string(),
                    column: column.clone(),
                    message: "Column cannot be null".to_string(),
                });
            }
        }
        for fk in self.foreign_keys.iter().filter(|fk| fk.child == table) {
            if let Some(value) = row.get(&fk.column) {
                if !value.is_null() && !self.parent_has_key(&fk.parent, value) {
                    return Err(RowKitError::ConstraintViolation {
                        table: table.to_string(),
                        column: fk.column.clone(),
                        message: format!("foreign key constraint fails (references {})", fk.parent),
                    });
                }
            }
        }

        let Some(target) = self.tables.get_mut(table) else {
            return Err(RowKitError::Other(format!("Table '{}' doesn't exist", table)));
        };
        target.next_key += 1;
        let key = target.next_key;
        let mut stored = row.values.clone();
        if let Some(pk) = &target.key_column {
            stored.insert(pk.clone(), Value::Key(key));
        }
        target.rows.insert(key, stored);

        Ok(target.auto_increment.then_some(key))
    }

    async fn delete_keys(&mut self, table: &str, key_column: &str, keys: &[u64]) -> Result<u64> {
        self.require_transaction("delete")?;
        self.delete_batches.push((table.to_string(), keys.len()));

        if self.fail_delete.as_deref() == Some(table) {
            return Err(RowKitError::Other(format!("injected delete failure on {}", table)));
        }

        let Some(target) = self.tables.get(table) else {
            return Err(RowKitError::Other(format!("Table '{}' doesn't exist", table)));
        };
        if target.key_column.as_deref() != Some(key_column) {
            return Err(RowKitError::Other(format!(
                "Unknown column '{}' in '{}'",
                key_column, table
            )));
        }

        for fk in self.foreign_keys.iter().filter(|fk| fk.parent == table) {
            let Some(child) = self.tables.get(&fk.child) else {
                continue;
            };
            let referenced = child.rows.iter().any(|(child_key, child_row)| {
                let same_batch = fk.child == table && keys.contains(child_key);
                !same_batch
                    && child_row
                        .get(&fk.column)
                        .and_then(|v| v.as_key())
                        .is_some_and(|k| keys.contains(&k))
            });
            if referenced {
                return Err(RowKitError::ConstraintViolation {
                    table: table.to_string(),
                    column: key_column.to_string(),
                    message: format!(
                        "Cannot delete a parent row: still referenced by {}.{}",
                        fk.child, fk.column
                    ),
                });
            }
        }

        let Some(target) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let mut deleted = 0u64;
        for key in keys {
            if target.rows.shift_remove(key).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn commit(&mut self) -> Result<()> {
        self.require_transaction("commit")?;
        self.snapshot = None;
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if let Some(snapshot) = self.snapshot.take() {
            self.tables = snapshot;
            self.rollbacks += 1;
        }
        Ok(())
    }
}

impl SchemaExecutor for MemoryStore {
    async fn existing_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.table_names())
    }

    async fn execute_ddl(&mut self, table: &str, statement: &str) -> Result<()> {
        if self.fail_ddl.iter().any(|t| t == table) {
            return Err(RowKitError::Other(format!(
                "You have an error in your SQL syntax near '{}'",
                table
            )));
        }
        if self.tables.contains_key(table) {
            return Err(RowKitError::Other(format!("Table '{}' already exists", table)));
        }
        let outcome = ddl::parse(statement);
        let parsed = outcome
            .schema
            .table(table)
            .map(MemoryTable::from_table)
            .unwrap_or_default();
        self.tables.insert(table.to_string(), parsed);
        Ok(())
    }
}
