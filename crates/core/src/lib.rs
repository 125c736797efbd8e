//! PromptVCS core library.
//!
//! Version control for text prompts: repositories with versions and branches,
//! simulated merges and conflicts, teams holding repository snapshots, and a
//! persistence gateway over a key-value store. Front ends drive everything
//! through [`Session::execute`].

pub mod branch;
pub mod config;
pub mod conflict;
pub mod db;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod oracle;
pub mod persistence;
pub mod repository;
pub mod session;
pub mod stats;
pub mod team;
pub mod transfer;

// Re-exports for convenience.
pub use config::AppConfig;
pub use db::{KeyValueStore, MemoryStore, SqliteStore};
pub use errors::CoreError;
pub use persistence::{ApplicationState, PersistenceGateway};
pub use session::{Command, Event, Session};
