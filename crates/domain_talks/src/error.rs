//! Talk domain errors
//!
//! The façade reports three kinds of failure: a missing document, a stale
//! version on update, and a store that could not be reached. Anything else
//! the store reports is passed through untouched.

use thiserror::Error;

use core_kernel::PortError;

/// Message shown when an update loses an optimistic-concurrency race
pub const CONFLICT_MESSAGE: &str =
    "The talk was changed by someone else after you opened it. Refresh the talk and apply your changes again.";

/// Errors returned by [`crate::TalkRepository`]
#[derive(Debug, Error)]
pub enum TalkError {
    /// The referenced document does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The version token presented on update is no longer current
    #[error("{message}")]
    Conflict {
        message: String,
        #[source]
        source: PortError,
    },

    /// The store could not be reached
    #[error("Talk store unavailable: {0}")]
    Unavailable(#[source] PortError),

    /// Any other store failure
    #[error("Talk store error: {0}")]
    Store(#[source] PortError),
}

impl TalkError {
    /// Creates a not found error for a document kind and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        TalkError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Checks if this error indicates a document was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, TalkError::NotFound { .. })
    }

    /// Checks if this error is a lost optimistic-concurrency race
    pub fn is_conflict(&self) -> bool {
        matches!(self, TalkError::Conflict { .. })
    }

    /// Checks if this error means the store was unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TalkError::Unavailable(_))
    }
}

impl From<PortError> for TalkError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => TalkError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::ConcurrencyViolation { .. } => TalkError::Conflict {
                message: CONFLICT_MESSAGE.to_string(),
                source: error,
            },
            PortError::Connection { .. } | PortError::ServiceUnavailable { .. } => {
                TalkError::Unavailable(error)
            }
            other => TalkError::Store(other),
        }
    }
}
