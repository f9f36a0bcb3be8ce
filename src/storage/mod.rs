//! Alert, job and approval persistence.
//!
//! The core only needs append-only inserts and "latest record for entity X
//! matching P" point queries, so each record kind gets a narrow trait.
//! Three backends implement all of them:
//! - [`InMemoryStore`]: tests and dry runs
//! - [`JsonFileStore`]: single JSON document, written through on insert
//! - [`SqliteStore`]: WAL-mode SQLite via `rusqlite`

mod error;
mod in_memory;
mod json_file;
mod records;
mod sqlite;
mod traits;

pub use error::{StorageError, StorageResult};
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use records::{AlertRecord, ApprovalPolicy, CallStatus, JobStatus, RetrainJobRecord};
pub use sqlite::{init_schema, SqliteStore, CURRENT_VERSION};
pub use traits::{AlertStore, ApprovalStore, JobStore, Store, Stores};
