pub mod analyze;
pub mod config;
pub mod error;
pub mod generate;
pub mod graph;
pub mod ledger;
pub mod provision;
pub mod rollback;
pub mod scenario;
pub mod schema;
pub mod session;
pub mod store;

// Re-export key types for convenience
pub use error::{Result, RowKitError};
pub use ledger::types::RunLedgerEntry;
pub use ledger::RunLedger;
pub use provision::{provision, provision_and_record, ProvisionRequest};
pub use rollback::{rollback, RollbackReport};
pub use scenario::ScenarioModel;
pub use schema::types::SchemaModel;
pub use store::TransactionalStore;
