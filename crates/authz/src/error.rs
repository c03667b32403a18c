use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy for catalog, matrix and evaluator operations.
///
/// Deny outcomes (`ResourceForbidden`, `CapabilityDenied`) are ordinary
/// decision results, not errors; they live in [`crate::engine::DenyReason`].
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Backing store I/O failure. Degraded, never fatal to a whole page.
    #[error("access store unavailable: {0}")]
    Unavailable(String),
    #[error("permission {0} not found")]
    NotFound(Uuid),
    #[error("permission name \"{0}\" already exists")]
    DuplicateName(String),
    /// The caller referenced a permission name absent from the catalog.
    /// A caller bug, not an authorization outcome.
    #[error("unknown permission \"{0}\"")]
    UnknownPermission(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    Inactive,
    #[error("session backend unavailable: {0}")]
    Unavailable(String),
}
