use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A generated value for one column of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    /// A primary key drawn from a parent table's pool of inserted keys.
    Key(u64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl Value {
    /// Render as a MySQL literal. Used for SQL previews in errors and logs;
    /// inserts themselves always bind parameters.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Key(k) => k.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''")),
            Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Value::DateTime(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Time(t) => format!("'{}'", t.format("%H:%M:%S")),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_key(&self) -> Option<u64> {
        match self {
            Value::Key(k) => Some(*k),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Key(k) => write!(f, "{}", k),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literal_escapes_quotes() {
        let v = Value::String("O'Brien".to_string());
        assert_eq!(v.to_sql_literal(), "'O''Brien'");
    }

    #[test]
    fn test_temporal_literals() {
        let ts = NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap();
        assert_eq!(Value::DateTime(ts).to_sql_literal(), "'2025-06-15 09:30:05'");
        assert_eq!(Value::Date(ts.date()).to_sql_literal(), "'2025-06-15'");
        assert_eq!(Value::Time(ts.time()).to_sql_literal(), "'09:30:05'");
    }

    #[test]
    fn test_as_key() {
        assert_eq!(Value::Key(7).as_key(), Some(7));
        assert_eq!(Value::Int(7).as_key(), Some(7));
        assert_eq!(Value::Int(-1).as_key(), None);
        assert_eq!(Value::Null.as_key(), None);
    }
}
