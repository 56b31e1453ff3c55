//! Error types for stobridge.
//!
//! One enum covers the whole subsystem; every variant carries a
//! human-readable message and a stable `kind()` tag so the transport
//! boundary can surface structured, kind-tagged failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing required input, rejected before any persistence.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An external business code did not resolve to an internal identifier.
    /// A client-input error, distinct from persistence failures.
    #[error("{kind} not found: {code}")]
    ReferenceNotFound { kind: &'static str, code: String },

    /// The target transfer does not exist.
    #[error("transfer not found: {0}")]
    NotFound(String),

    /// The shipment/receipt reference was already recorded. A conflict,
    /// not a fault.
    #[error("reference already posted: {0}")]
    DuplicatePost(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: crate::model::TransferState,
        to: crate::model::TransferState,
    },

    /// A required upstream table is absent entirely. Fatal for the call.
    #[error("required table missing: {0}")]
    SchemaUnavailable(String),

    /// After column filtering, nothing remained to persist.
    #[error("no matching columns for table '{0}'")]
    NoMatchingColumns(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable machine-readable tag for the transport boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::ReferenceNotFound { .. } => "reference_not_found",
            Error::NotFound(_) => "not_found",
            Error::DuplicatePost(_) => "duplicate_post",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::SchemaUnavailable(_) => "schema_unavailable",
            Error::NoMatchingColumns(_) => "no_matching_columns",
            Error::Config(_) => "config",
            Error::Db(_) => "database",
            Error::Other(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
