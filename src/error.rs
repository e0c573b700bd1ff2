use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`CloningError`], for callers that map errors
/// onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Arithmetic,
    Configuration,
    Io,
}

#[derive(Debug, Error)]
pub enum CloningError {
    #[error("enzyme '{0}' is not in the catalog")]
    EnzymeNotFound(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("malformed catalog entry '{name}': {reason}")]
    MalformedEnzyme { name: String, reason: String },

    #[error("invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("invalid feature: {0}")]
    InvalidFeature(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl CloningError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CloningError::EnzymeNotFound(_) => ErrorCode::NotFound,
            CloningError::InvalidSelection(_)
            | CloningError::InvalidParameter(_)
            | CloningError::InvalidSequence(_)
            | CloningError::InvalidFeature(_)
            | CloningError::Serde(_) => ErrorCode::InvalidInput,
            CloningError::Arithmetic(_) => ErrorCode::Arithmetic,
            CloningError::MalformedEnzyme { .. } => ErrorCode::Configuration,
            CloningError::Io(_) => ErrorCode::Io,
        }
    }

    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        CloningError::MalformedEnzyme {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
