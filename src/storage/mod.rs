//! Storage substrate for the chapter/translation store
//!
//! Persistence goes through the `RecordStore` trait. The primary
//! implementation is `SqliteStore`. Every trait call commits as a single
//! atomic unit; multi-call sequences are serialized by the coordinator.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{OpenRecordStore, RecordStore, StorageError, StorageResult};
