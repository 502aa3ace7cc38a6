use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural model of the tables declared in a DDL source.
///
/// Built once per analysis pass and read-only afterwards. Table order follows
/// the order of the `CREATE TABLE` blocks in the source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaModel {
    pub tables: IndexMap<String, Table>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }

    /// Tables that have a usable primary key and can therefore be provisioned.
    pub fn eligible_table_count(&self) -> usize {
        self.tables.values().filter(|t| t.is_eligible()).count()
    }

    /// SHA-256 over the serialized model.
    ///
    /// Recorded on every run so that rollback can warn when the schema used to
    /// resolve primary keys differs from the one the rows were inserted under.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let serialized = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// One table: declaration-ordered columns plus its single-column primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Option<String>,
}

impl Table {
    pub fn new(name: String) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// A table without a primary key cannot have its rows tracked for rollback.
    pub fn is_eligible(&self) -> bool {
        self.primary_key.is_some()
    }

    /// Mark `column_name` as the primary key. Returns false (and leaves the
    /// table untouched) if no such column is declared.
    pub fn set_primary_key(&mut self, column_name: &str) -> bool {
        if self.column(column_name).is_none() {
            return false;
        }
        for col in &mut self.columns {
            col.is_primary = col.name == column_name;
        }
        self.primary_key = Some(column_name.to_string());
        true
    }
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type token exactly as written, e.g. `varchar(255)`.
    pub raw_type: String,
    pub shape: ValueShape,
    pub is_primary: bool,
    pub nullable: bool,
    pub has_default: bool,
    pub is_auto_increment: bool,
}

impl Column {
    pub fn new(name: String, raw_type: String) -> Self {
        let shape = ValueShape::from_raw(&raw_type);
        Self {
            name,
            raw_type,
            shape,
            is_primary: false,
            nullable: true,
            has_default: false,
            is_auto_increment: false,
        }
    }
}

/// Coarse value shape derived from the declared type, used to pick a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueShape {
    Integer,
    Text,
    Temporal(TemporalKind),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemporalKind {
    Date,
    DateTime,
    Time,
}

impl ValueShape {
    /// Classify a raw type by case-insensitive substring match.
    ///
    /// Precedence matters: `INT` is checked before the text family so that
    /// `TINYINT` never lands in `Text`, and `DATETIME` is checked before `DATE`.
    pub fn from_raw(raw: &str) -> Self {
        let upper = raw.to_uppercase();

        if upper.contains("INT") {
            ValueShape::Integer
        } else if upper.contains("CHAR") || upper.contains("TEXT") {
            ValueShape::Text
        } else if upper.contains("DATETIME") || upper.contains("TIMESTAMP") {
            ValueShape::Temporal(TemporalKind::DateTime)
        } else if upper.contains("DATE") {
            ValueShape::Temporal(TemporalKind::Date)
        } else if upper.contains("TIME") {
            ValueShape::Temporal(TemporalKind::Time)
        } else {
            ValueShape::Other
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Integer => write!(f, "integer"),
            ValueShape::Text => write!(f, "text"),
            ValueShape::Temporal(TemporalKind::Date) => write!(f, "date"),
            ValueShape::Temporal(TemporalKind::DateTime) => write!(f, "datetime"),
            ValueShape::Temporal(TemporalKind::Time) => write!(f, "time"),
            ValueShape::Other => write!(f, "other"),
        }
    }
}
