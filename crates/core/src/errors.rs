//! Error types for the PromptVCS core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

/// Errors from repository, version, branch and team operations.
#[derive(Debug, Error)]
pub enum VcsError {
    /// A lookup by id failed.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A required field is empty or otherwise unusable.
    #[error("invalid value for '{field}': {detail}")]
    InvalidInput { field: String, detail: String },

    /// A unique name or email is already taken.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: String, id: String },

    /// Tried to switch to a branch the repository does not have.
    #[error("branch '{0}' does not exist")]
    InvalidBranch(String),
}

impl VcsError {
    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, detail: &str) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn exists(entity: &str, id: &str) -> Self {
        Self::AlreadyExists {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict errors
// ---------------------------------------------------------------------------

/// Errors from the merge / conflict subsystem.
#[derive(Debug, Error)]
pub enum ConflictError {
    /// The requested conflict ID was not found.
    #[error("conflict not found: {0}")]
    NotFound(String),

    /// A merge cannot be finalized while conflicts are open.
    #[error("{0} unresolved conflict(s) must be resolved before merging")]
    Unresolved(usize),
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from the key-value persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying rusqlite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A migration failed.
    #[error("database migration failed (version {version}): {detail}")]
    MigrationFailed { version: u32, detail: String },

    /// A value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error (e.g. creating the data directory).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Export / import errors
// ---------------------------------------------------------------------------

/// Errors from exporting and importing whole-state documents.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The document is not a valid export.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Reading or writing the document failed.
    #[error("transfer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
