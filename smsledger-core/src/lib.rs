//! smsledger-core: Domain types shared by the SMS ingestion, classification and storage layers

pub mod error;
pub mod mapping;
pub mod time;
pub mod transaction;

pub use error::SyncError;
pub use mapping::{MappingRule, PersistedTransaction, UpdateOp, MANUAL_ID_PREFIX};
pub use transaction::{Channel, Direction, RawMessage, Status, Transaction};
