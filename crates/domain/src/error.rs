//! Common error types used across the workspace.
//!
//! Every layer defines its own typed errors and converts into
//! [`SmartHomeError`] via `#[from]`, so callers can match on the kind of
//! failure (validation, not-found, empty collection, storage) without
//! inspecting strings.

/// Top-level error shared by the domain and application layers.
#[derive(Debug, thiserror::Error)]
pub enum SmartHomeError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("empty collection: {0}")]
    EmptyCollection(#[from] EmptyCollectionError),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Input that breaks a domain invariant or cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("{entity} named {name:?} already exists")]
    DuplicateName { entity: &'static str, name: String },

    #[error("device {id} already exists in this room")]
    DuplicateDeviceId { id: i64 },

    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("unknown {kind} token {token:?}")]
    UnknownToken { kind: &'static str, token: String },

    #[error("a {kind} cannot hold state {state}")]
    StateNotSupported { kind: String, state: String },
}

/// A lookup by id or name did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// An operation needed at least one element and got none.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} has no devices")]
pub struct EmptyCollectionError(pub String);
