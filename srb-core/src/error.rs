//! Error taxonomy shared by the query and mutation engines.
//!
//! Keep this error type small: every engine operation returns
//! `Result<_, EngineError>` and the workspace enables
//! `clippy::result_large_err`.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Read operations never return [`EngineError::NotFound`] for an empty result
/// set; an empty sequence is a successful answer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced entity, or the base record a derived operation needs, does
    /// not exist.
    #[error("{entity} {key} was not found")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// Human-readable key of the missing entity.
        key: String,
    },
    /// A uniqueness constraint would be violated.
    #[error("{entity} {key} already exists")]
    Conflict {
        /// Kind of entity being written.
        entity: &'static str,
        /// Human-readable key that collided.
        key: String,
    },
    /// Caller-supplied arguments violate a precondition.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Name of the offending argument.
        field: &'static str,
        /// Description of the violated precondition.
        reason: String,
    },
    /// The store was unreachable, timed out, or returned an unexpected shape.
    #[error("store failed to {operation}")]
    Store {
        /// Description of the failed store interaction.
        operation: &'static str,
        /// Underlying backend error.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl EngineError {
    /// Build an [`EngineError::InvalidInput`].
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Build an [`EngineError::Store`] wrapping a backend error.
    pub fn store<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self::Store {
            operation,
            source: source.into(),
        }
    }

    /// Classify the error for the presentation boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Store { .. } => ErrorKind::Store,
        }
    }
}

/// Stable error categories for callers that must not forward raw store text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`EngineError::NotFound`].
    NotFound,
    /// See [`EngineError::Conflict`].
    Conflict,
    /// See [`EngineError::InvalidInput`].
    InvalidInput,
    /// See [`EngineError::Store`].
    Store,
}

impl ErrorKind {
    /// Short machine-friendly label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::InvalidInput => "invalid-input",
            Self::Store => "store-error",
        }
    }

    /// Fixed user-facing message for the category.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotFound => "no matching record exists",
            Self::Conflict => "a record for that country and year already exists",
            Self::InvalidInput => "the request arguments are invalid",
            Self::Store => "the data store is unavailable",
        }
    }
}
