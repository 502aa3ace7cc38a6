//! # Error Types
//!
//! Defines `RowKitError`, the unified error enum for every failure mode in
//! the provisioning and rollback pipeline. Variants carry enough context
//! (table name, row index, SQL snippet, underlying database error) to be
//! reported verbatim to the operator.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in RowKit operations.
#[derive(Error, Debug)]
pub enum RowKitError {
    #[error("{kind} not found: {}", path.display())]
    MissingResource { kind: &'static str, path: PathBuf },

    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario: {message}")]
    Scenario { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No database URL provided. RowKit looks for a connection in this order:\n  1. --db flag\n  2. DATABASE_URL environment variable\n  3. .env file with DATABASE_URL\n  4. rowkit.toml [database] section\n\nExample: rowkit provision --db mysql://root:pw@127.0.0.1:3306/app --schema schema.sql --scenario scenario.json")]
    NoDatabaseUrl,

    #[error("Database connection failed: {message}\n  Connection string: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Insert failed on {table} row {row_index}\n  SQL: {sql_preview}\n  DB error: {source}")]
    InsertFailed {
        table: String,
        row_index: usize,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Delete failed on {table}\n  SQL: {sql_preview}\n  DB error: {source}")]
    DeleteFailed {
        table: String,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to {stage} transaction: {source}")]
    Transaction {
        stage: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Constraint violation on {table}.{column}: {message}")]
    ConstraintViolation {
        table: String,
        column: String,
        message: String,
    },

    #[error("Insert into {table} row {row_index} returned no generated key; rows without a database-assigned key cannot be rolled back")]
    MissingGeneratedKey { table: String, row_index: usize },

    #[error("No transaction is open (attempted to {operation})")]
    NoTransaction { operation: &'static str },

    #[error("Schema query failed: {query}\n  Cause: {source}")]
    Introspection {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("DDL statement failed for {table}: {source}")]
    Ddl {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Run ledger error: {message}")]
    Ledger { message: String },

    #[error("Run {run_id} was committed but its ledger entry could not be written to {}: {source}\n  The inserted keys were logged at error level; save them before retrying.", path.display())]
    LedgerPersist {
        run_id: String,
        path: PathBuf,
        #[source]
        source: Box<RowKitError>,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RowKitError>;
