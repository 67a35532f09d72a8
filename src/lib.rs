// ABOUTME: Library root for table-sync, a source-to-targets table replicator
// ABOUTME: Reconciles MySQL/SQLite tables with checksum short-circuiting

pub mod checksum;
pub mod config;
pub mod db;
pub mod error;
pub mod job;
pub mod ping;
pub mod query;
pub mod rowset;
pub mod sync;
pub mod value;

pub use config::{Config, JobConfig, TableConfig};
pub use error::SyncError;
pub use job::ExecJobResult;
pub use ping::PingOutcome;
pub use sync::SyncOutcome;
pub use value::{PrimaryKey, Value};
