pub mod create;
pub mod ddl;
pub mod types;

pub use ddl::{parse, parse_file, ParseOutcome, SkipReason, SkippedDefinition};
pub use types::{Column, SchemaModel, Table, TemporalKind, ValueShape};
