//! Infrastructure: process telemetry, the durable SQLite cache tier, and the
//! Appwrite remote client.

pub mod error;
pub mod remote;
pub mod storage;
pub mod telemetry;

pub use error::InfraError;
pub use remote::AppwriteClient;
pub use storage::{DatasetStats, SqliteCacheStore, StorageError, StoredDataset};
