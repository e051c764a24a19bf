//! Episcope Error Definitions
//!
//! Defines error types used throughout the engine.
//!
//! Errors fall in three groups:
//! - schema errors: the input does not have the expected shape
//! - validation errors: the shape is right but the content is not
//! - precondition errors: the caller used an API on a value that does not
//!   support it (programmer error)

use thiserror::Error;

use super::{ItemId, TimeMs};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Schema Errors
    // =========================================================================
    #[error("Unable to deserialize {kind}: {reason}\nParsed item was:\n{data}")]
    Schema {
        /// Kind of item being parsed (e.g. "Attribute", "Symptom")
        kind: &'static str,
        reason: String,
        /// Offending input, pretty-printed
        data: String,
    },

    // =========================================================================
    // Attribute Errors
    // =========================================================================
    #[error("values field is required for non-text attributes.")]
    MissingValues { attribute: String },

    #[error("Unknown value '{value}' for attribute '{attribute}'.")]
    UnknownValue { attribute: String, value: String },

    #[error("Too many elements in field 'selection' of attribute '{attribute}'.")]
    TooManySelections { attribute: String },

    // =========================================================================
    // Taxonomy Errors
    // =========================================================================
    #[error("Unknown global attribute '{0}'.")]
    UnknownGlobalAttribute(String),

    #[error("Duplicate name for custom attribute '{0}'.")]
    DuplicateAttributeName(String),

    #[error("Duplicate global attribute '{0}'.")]
    DuplicateGlobalAttribute(String),

    #[error("Duplicate symptom '{symptom}' in category '{category}'.")]
    DuplicateSymptom { category: String, symptom: String },

    #[error("Illegal character '/' in {field} name '{value}'.")]
    IllegalCharacter { field: &'static str, value: String },

    #[error("Invalid symptom path '{path}'. {reason}")]
    InvalidPath { path: String, reason: PathError },

    #[error("Invalid attribute '{attribute}' for symptom '{symptom}'.")]
    InvalidAttribute { attribute: String, symptom: String },

    // =========================================================================
    // Timeline Errors
    // =========================================================================
    #[error("Invalid identifier {0}.")]
    InvalidIdentifier(ItemId),

    #[error("Invalid time range: start {start}, end {end}.")]
    InvalidTimeRange { start: TimeMs, end: TimeMs },

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Reason a symptom path could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path does not have exactly three segments
    Format,
    UnknownFamily(String),
    UnknownCategory(String),
    UnknownSymptom(String),
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format => write!(f, "Expected format: 'family/category/symptom'."),
            Self::UnknownFamily(s) => write!(f, "Unknown family '{}'.", s),
            Self::UnknownCategory(s) => write!(f, "Unknown category '{}'.", s),
            Self::UnknownSymptom(s) => write!(f, "Unknown symptom '{}'.", s),
        }
    }
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Builds a schema error, keeping a pretty-printed copy of the input.
    pub fn schema(kind: &'static str, reason: impl ToString, data: &serde_json::Value) -> Self {
        Self::Schema {
            kind,
            reason: reason.to_string(),
            data: super::to_pretty_json(data).unwrap_or_else(|_| data.to_string()),
        }
    }

    /// Returns true for structural mismatches against the expected format
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::JsonError(_))
    }

    /// Returns true for well-formed input with invalid content
    pub fn is_validation_error(&self) -> bool {
        !self.is_schema_error() && !matches!(self, Self::Precondition(_) | Self::IoError(_))
    }

    /// Returns true for programmer errors (API used on an unsupported value)
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_messages() {
        let err = CoreError::InvalidPath {
            path: "a/b".to_string(),
            reason: PathError::Format,
        };
        assert_eq!(
            err.to_string(),
            "Invalid symptom path 'a/b'. Expected format: 'family/category/symptom'."
        );

        let err = CoreError::InvalidPath {
            path: "y/x/s".to_string(),
            reason: PathError::UnknownFamily("y".to_string()),
        };
        assert_eq!(err.to_string(), "Invalid symptom path 'y/x/s'. Unknown family 'y'.");
    }

    #[test]
    fn test_schema_error_keeps_data() {
        let data = serde_json::json!({ "name": "test", "attributes": 1 });
        let err = CoreError::schema("Symptom", "invalid type", &data);

        match &err {
            CoreError::Schema { data, .. } => {
                assert_eq!(data, "{\n    \"name\": \"test\",\n    \"attributes\": 1\n}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_schema_error());
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::InvalidIdentifier(3).is_validation_error());
        assert!(CoreError::InvalidTimeRange { start: -1, end: 0 }.is_validation_error());
        assert!(CoreError::UnknownGlobalAttribute("x".into()).is_validation_error());
        assert!(CoreError::Precondition("x".into()).is_precondition());
        assert!(!CoreError::Precondition("x".into()).is_validation_error());
    }
}
