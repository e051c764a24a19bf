//! Episcope Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Timeline item identifier (monotonic, never reused within a timeline)
pub type ItemId = u64;

// =============================================================================
// Time Types
// =============================================================================

/// Time in milliseconds from the start of the recording
pub type TimeMs = i64;

// =============================================================================
// Symptom Families
// =============================================================================

/// Path separator used in symptom paths and forbidden in names
pub const PATH_SEPARATOR: char = '/';

/// Top-level taxonomy branch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymptomFamily {
    #[serde(rename = "objective_symptoms")]
    Objective,
    #[serde(rename = "subjective_symptoms")]
    Subjective,
}

impl SymptomFamily {
    /// Both families, in taxonomy file order
    pub const ALL: [SymptomFamily; 2] = [SymptomFamily::Objective, SymptomFamily::Subjective];

    /// Returns the key used for this family in taxonomy files and paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Objective => "objective_symptoms",
            Self::Subjective => "subjective_symptoms",
        }
    }

    /// Parses an exact family key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }
}

impl std::fmt::Display for SymptomFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// JSON Helpers
// =============================================================================

/// Indentation used for every JSON document the engine writes
pub const JSON_INDENT: &[u8] = b"    ";

/// Serializes a value as pretty JSON with a 4-space indent.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
