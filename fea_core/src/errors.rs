//! # Error Types
//!
//! Structured error types for fea_core. Every failure carries enough context
//! (entity kind, name, owning container) to locate the offending entry in the
//! model graph without re-running the call.
//!
//! ## Taxonomy
//!
//! - [`FeaError::Registration`] - an unresolved Part/Material/Section/Instance/
//!   set reference, at add time or generation time
//! - [`FeaError::Connectivity`] - an element references a node key absent from
//!   the target part
//! - [`ResultsError`] - a results payload that was never produced or cannot be
//!   read
//!
//! Duplicate-name insertions are not errors: they are skipped and logged (see
//! [`crate::registry::AddOutcome`]).
//!
//! ## Example
//!
//! ```rust
//! use fea_core::errors::{FeaError, FeaResult};
//!
//! fn check_thickness(t: f64) -> FeaResult<()> {
//!     if t <= 0.0 {
//!         return Err(FeaError::invalid_input("t", t.to_string(), "Thickness must be positive"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_thickness(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for fea_core operations
pub type FeaResult<T> = Result<T, FeaError>;

/// Structured error type for model building, generation and file operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum FeaError {
    /// A referenced entity is not registered where it was looked up
    #[error("Registration error: {kind} '{name}' not found in {container}")]
    Registration {
        kind: String,
        name: String,
        container: String,
    },

    /// An element references a node key absent from the target part
    #[error("Connectivity error: element {element} references node {node_key}, not found in part '{part}'")]
    Connectivity {
        element: String,
        node_key: usize,
        part: String,
    },

    /// An input value is invalid (out of range, wrong arity, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// The selected backend cannot express part of the model
    #[error("Unsupported by {backend}: {feature}")]
    UnsupportedFeature { backend: String, feature: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Job directory is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Results ingestion failed
    #[error(transparent)]
    Results(#[from] ResultsError),
}

impl FeaError {
    /// Create a Registration error
    pub fn registration(kind: impl Into<String>, name: impl Into<String>, container: impl Into<String>) -> Self {
        FeaError::Registration {
            kind: kind.into(),
            name: name.into(),
            container: container.into(),
        }
    }

    /// Create a Connectivity error
    pub fn connectivity(element: impl Into<String>, node_key: usize, part: impl Into<String>) -> Self {
        FeaError::Connectivity {
            element: element.into(),
            node_key,
            part: part.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        FeaError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedFeature error
    pub fn unsupported(backend: impl Into<String>, feature: impl Into<String>) -> Self {
        FeaError::UnsupportedFeature {
            backend: backend.into(),
            feature: feature.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        FeaError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        FeaError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FeaError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            FeaError::Registration { .. } => "REGISTRATION_ERROR",
            FeaError::Connectivity { .. } => "CONNECTIVITY_ERROR",
            FeaError::InvalidInput { .. } => "INVALID_INPUT",
            FeaError::UnsupportedFeature { .. } => "UNSUPPORTED_FEATURE",
            FeaError::FileError { .. } => "FILE_ERROR",
            FeaError::FileLocked { .. } => "FILE_LOCKED",
            FeaError::SerializationError { .. } => "SERIALIZATION_ERROR",
            FeaError::VersionMismatch { .. } => "VERSION_MISMATCH",
            FeaError::Results(err) => err.error_code(),
        }
    }
}

/// Why a results payload could not be attached to a problem.
///
/// Separates "the solver never wrote anything" from "something was written but
/// it cannot be trusted", which callers need to tell apart.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ResultsError {
    /// The results file does not exist
    #[error("No results produced: '{path}' does not exist")]
    NotProduced { path: String },

    /// The results or info file exists but could not be read or parsed
    #[error("Results unreadable: '{path}' - {reason}")]
    Unreadable { path: String, reason: String },

    /// An entity key in the payload is not an integer
    #[error("Invalid entity key '{key}' in step '{step}', field '{field}'")]
    InvalidEntityKey {
        step: String,
        field: String,
        key: String,
    },
}

impl ResultsError {
    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ResultsError::NotProduced { .. } => "RESULTS_NOT_PRODUCED",
            ResultsError::Unreadable { .. } => "RESULTS_UNREADABLE",
            ResultsError::InvalidEntityKey { .. } => "RESULTS_INVALID_KEY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = FeaError::connectivity("e-3", 12, "frame");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: FeaError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            FeaError::registration("material", "steel", "part 'frame'").error_code(),
            "REGISTRATION_ERROR"
        );
        assert_eq!(FeaError::unsupported("opensees", "contact").error_code(), "UNSUPPORTED_FEATURE");
        let results: FeaError = ResultsError::NotProduced { path: "x".into() }.into();
        assert_eq!(results.error_code(), "RESULTS_NOT_PRODUCED");
    }

    #[test]
    fn test_error_messages_name_the_entity() {
        let msg = FeaError::connectivity("e-0", 7, "slab").to_string();
        assert!(msg.contains("node 7"));
        assert!(msg.contains("'slab'"));
    }
}
