use thiserror::Error;

pub type PermbaseResult<T> = Result<T, PermbaseError>;

/// Errors surfaced by the authorization core.
///
/// All of these are expected-in-normal-operation conditions: they are
/// returned to the immediate caller synchronously, never retried, and
/// never treated as fatal by the core.
#[derive(Error, Debug)]
pub enum PermbaseError {
    /// An agent or target passed to a manager operation is not persisted.
    #[error("Record Not Saved: {0}")]
    RecordNotSaved(String),

    /// No permission schema is registered for the given type pair.
    #[error("Schema Not Found: no permission schema linking {agent} and {target}")]
    SchemaNotFound { agent: String, target: String },

    /// Adding a grant would duplicate an existing (agent, target, permission) triple.
    #[error("Permission Exists: '{0}' is already granted")]
    PermissionExists(String),

    /// Removing a grant that does not exist.
    #[error("Permission Not Found: '{0}' is not granted")]
    PermissionNotFound(String),

    /// The schema factory was given a type it cannot derive a relation for.
    #[error("Schema Configuration Error: {0}")]
    SchemaConfig(String),

    /// A storage-level failure reported by the backend adapter.
    #[error("Backend Error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors a backend adapter may report from its hooks.
///
/// `UniqueViolation` is the one variant with contract-level meaning: the
/// manager translates it into [`PermbaseError::PermissionExists`]. The
/// adapter must roll back its own partial write before returning it.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unique Constraint Violation: {0}")]
    UniqueViolation(String),

    #[error("Lock Poisoned: {0}")]
    LockPoisoned(String),

    #[error("Storage Error: {0}")]
    Storage(#[from] anyhow::Error),
}
