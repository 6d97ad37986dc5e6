//! Shared database utilities
//!
//! Schema synchronization and write-retry helpers used by the Heirlooms
//! services. Connection pool setup lives with each service, since each
//! owns its own database file.

pub mod retry;
pub mod schema_sync;

pub use retry::retry_on_lock;
pub use schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
