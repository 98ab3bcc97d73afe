use thiserror::Error;

/// Every registry and session operation is a total function returning one
/// of these; nothing throws uncontrolled faults. The shell surfaces them as
/// transient notifications — none is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("device not found")]
    NotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("pairing already in flight for target {target_hint}")]
    AlreadyPairing { target_hint: String },

    #[error("pairing session not found")]
    SessionNotFound,

    #[error("pairing session expired")]
    SessionExpired,
}
