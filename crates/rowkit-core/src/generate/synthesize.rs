use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;
use tracing::debug;

use crate::generate::key_pool::KeyPool;
use crate::generate::value::Value;
use crate::scenario::ScenarioTable;
use crate::schema::types::{Column, Table, TemporalKind, ValueShape};

/// Text length for CHAR/TEXT columns.
pub const TEXT_LENGTH: usize = 12;
/// Text length for columns whose type is not otherwise recognized.
pub const FALLBACK_TEXT_LENGTH: usize = 8;
/// Inclusive range for integer columns.
pub const INT_RANGE: std::ops::RangeInclusive<i64> = 1..=10_000;

/// One synthesized row. Column order follows the table declaration and never
/// includes the primary key, which the database assigns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub values: IndexMap<String, Value>,
}

impl Row {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build one row for `table`.
///
/// Relation columns take a random key already recorded for the parent table
/// in `keys`, or NULL when the descriptor is malformed or the parent pool is
/// empty. Every other column gets a value chosen by its [`ValueShape`].
/// Temporal columns all share `base_time`, so one run stamps every row with
/// the same moment.
pub fn build_row(
    table: &Table,
    scenario_table: &ScenarioTable,
    keys: &KeyPool,
    rng: &mut impl Rng,
    base_time: NaiveDateTime,
) -> Row {
    let mut values = IndexMap::with_capacity(table.columns.len());

    for column in &table.columns {
        if column.is_primary {
            continue;
        }

        let value = if scenario_table.relations.contains_key(&column.name) {
            relation_value(table, column, scenario_table, keys, rng)
        } else {
            shaped_value(column, rng, base_time)
        };
        values.insert(column.name.clone(), value);
    }

    Row { values }
}

fn relation_value(
    table: &Table,
    column: &Column,
    scenario_table: &ScenarioTable,
    keys: &KeyPool,
    rng: &mut impl Rng,
) -> Value {
    let Some(relation) = scenario_table.relation(&column.name) else {
        debug!(
            "{}.{}: malformed relation '{}', using NULL",
            table.name,
            column.name,
            scenario_table.relations[&column.name]
        );
        return Value::Null;
    };

    match keys.pick_reference(&relation.parent_table, rng) {
        Some(key) => Value::Key(key),
        None => {
            debug!(
                "{}.{}: no keys recorded for {}, using NULL",
                table.name, column.name, relation.parent_table
            );
            Value::Null
        }
    }
}

/// Generate a value from the column's shape alone.
pub fn shaped_value(column: &Column, rng: &mut impl Rng, base_time: NaiveDateTime) -> Value {
    match column.shape {
        ValueShape::Integer => Value::Int(rng.random_range(INT_RANGE)),
        ValueShape::Text => Value::String(Alphanumeric.sample_string(rng, TEXT_LENGTH)),
        ValueShape::Temporal(TemporalKind::DateTime) => Value::DateTime(base_time),
        ValueShape::Temporal(TemporalKind::Date) => Value::Date(base_time.date()),
        ValueShape::Temporal(TemporalKind::Time) => Value::Time(base_time.time()),
        ValueShape::Other => Value::String(Alphanumeric.sample_string(rng, FALLBACK_TEXT_LENGTH)),
    }
}
