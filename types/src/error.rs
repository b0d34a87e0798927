//! Errors raised while constructing or parsing entity model values.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("unknown meeting role: {0}")]
    UnknownMeetingRole(String),

    #[error("unknown meeting state: {0}")]
    UnknownMeetingState(String),
}
