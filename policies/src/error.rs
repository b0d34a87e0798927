use thiserror::Error;
use voteroll_store::StoreError;

#[derive(Debug, Error)]
pub enum RegisterError {
    /// The meeting is not set up for the selected policy's dialect
    /// (required roles or groups missing or ambiguous).
    #[error("bad configuration: {0}")]
    Configuration(String),

    /// Command-level bad input, keyed by the offending field.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// A delegation-graph or role-topology invariant does not hold.
    #[error("inconsistent meeting data: {0}")]
    Consistency(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RegisterError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// The human-readable message without the field prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
