//! # Transactional Store
//!
//! The database operations the provisioning and rollback engines rely on.
//! Both engines open exactly one transaction, issue inserts or deletes
//! through it, and then commit or roll back. [`mysql::MySqlStore`] is the
//! production implementation.

pub mod mysql;

use crate::error::Result;
use crate::generate::synthesize::Row;

pub use mysql::MySqlStore;

pub trait TransactionalStore: Send {
    /// Open the transaction that every subsequent insert and delete joins.
    fn begin(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert one row and return the key the database generated for it.
    ///
    /// `Ok(None)` means the statement succeeded but no key was assigned
    /// (the table has no auto-increment column).
    fn insert_row(
        &mut self,
        table: &str,
        row: &Row,
        row_index: usize,
    ) -> impl std::future::Future<Output = Result<Option<u64>>> + Send;

    /// Delete rows of `table` whose `key_column` is one of `keys`. Returns the
    /// number of rows actually removed.
    fn delete_keys(
        &mut self,
        table: &str,
        key_column: &str,
        keys: &[u64],
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    fn commit(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Discard the open transaction. A no-op when none is open.
    fn rollback(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}
