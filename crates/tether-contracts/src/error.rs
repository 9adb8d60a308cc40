//! Contract parse errors
//!
//! Every variant is recoverable: the extractor skips the offending block,
//! records a diagnostic and moves on.

use crate::declaration::Origin;
use thiserror::Error;

pub type ContractResult<T> = Result<T, ContractParseError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractParseError {
    #[error("invalid contract record: {0}")]
    InvalidRecord(String),

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' must be {expected}")]
    WrongFieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("cannot parse argument '{arg}': expected \"<type> <name>\"")]
    InvalidArgument { arg: String },

    #[error("unknown type tag '{tag}'")]
    UnknownTypeTag { tag: String },

    #[error("parameter '{param}' cannot have type void")]
    VoidParameter { param: String },

    #[error("'{name}' cannot be used as a binding name")]
    InvalidIdentifier { name: String },

    #[error("parameter '{param}' shadows a name used by generated wrappers")]
    ReservedParameter { param: String },

    #[error("duplicate parameter '{param}'")]
    DuplicateParameter { param: String },

    #[error("function '{name}' is already declared at {first}")]
    DuplicateFunction { name: String, first: Origin },
}

impl ContractParseError {
    /// Create a missing field error
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create an unknown type tag error
    pub fn unknown_tag(tag: impl Into<String>) -> Self {
        Self::UnknownTypeTag { tag: tag.into() }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }
}
