//! Error types for conformance validation and the reference registry.
//!
//! Structural problems found in a document are reported as findings inside a
//! [`ValidationResult`](crate::ValidationResult), never as `Err`. The enums
//! here cover the hard faults only: input that cannot be evaluated at all,
//! and reference-registry bookkeeping.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::SpecificationKey;

/// Errors raised by validation entry points.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The document tree is not a JSON object, so no rule evaluation is
    /// possible. This is the only structural precondition.
    #[error("document is not a JSON object")]
    InvalidDocument,

    // IO errors (exit code 3)
    #[error("cannot read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid validation schema: {message}")]
    InvalidSchema { message: String },
}

/// Errors raised by the reference specification registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("specification already registered: {key}")]
    AlreadyExists { key: SpecificationKey },

    #[error("specification not found: {key}")]
    NotFound { key: SpecificationKey },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

impl RegistryError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiFamily;

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::ReadError {
            path: PathBuf::from("api.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.exit_code(), 3);

        assert_eq!(ValidateError::InvalidDocument.exit_code(), 2);
    }

    #[test]
    fn registry_error_display() {
        let err = RegistryError::NotFound {
            key: SpecificationKey::new(ApiFamily::Features, "1.0", Some(1)),
        };
        assert_eq!(
            err.to_string(),
            "specification not found: OGC API - Features Part 1 v1.0"
        );
    }
}
