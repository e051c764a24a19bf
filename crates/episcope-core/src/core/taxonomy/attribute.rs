//! Attribute Model
//!
//! An attribute is a named facet of a symptom: either a controlled
//! vocabulary (`values`) from which the user picks, or free text.
//! The current pick is the `selection`, which is always kept consistent
//! with the attribute's kind and vocabulary.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

/// Name of the free-text attribute every symptom carries
pub const NOTES_ATTRIBUTE: &str = "notes";

// =============================================================================
// Attribute Kind
// =============================================================================

/// Attribute kind enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Generator,
    /// At most one value selected
    Exclusive,
    /// Any subset of values selected
    Mix,
    /// Free-form text; the single selection entry holds the text
    Text,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generator => "generator",
            Self::Exclusive => "exclusive",
            Self::Mix => "mix",
            Self::Text => "text",
        }
    }

    /// Returns true if selections must come from the vocabulary
    pub fn is_vocabulary(&self) -> bool {
        !matches!(self, Self::Text)
    }

    /// Returns true if more than one value may be selected
    pub fn allows_multiple(&self) -> bool {
        matches!(self, Self::Mix)
    }
}

impl std::str::FromStr for AttributeKind {
    type Err = String;

    /// Parses a kind name, ignoring case ("EXCLUSIVE", "exclusive", ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Generator, Self::Exclusive, Self::Mix, Self::Text]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown attribute type '{}'", s))
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Attribute
// =============================================================================

/// Attribute definition dict as found in taxonomy files
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAttribute {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    selection: Vec<String>,
}

/// Named, typed attribute with its current selection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
    /// Controlled vocabulary (empty for text attributes)
    pub values: Vec<String>,
    selection: Vec<String>,
}

impl Attribute {
    /// Creates an attribute with an empty selection.
    ///
    /// Fails if a vocabulary attribute is given no values.
    pub fn new(name: &str, kind: AttributeKind, values: Vec<String>) -> CoreResult<Self> {
        if kind.is_vocabulary() && values.is_empty() {
            return Err(CoreError::MissingValues {
                attribute: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            kind,
            values,
            selection: vec![],
        })
    }

    /// Creates an empty free-text attribute
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: AttributeKind::Text,
            values: vec![],
            selection: vec![],
        }
    }

    /// Parses an attribute definition, optionally carrying a selection.
    ///
    /// Expected shape: `{ "name": str, "type": str, "values"?: [str], "selection"?: [str] }`
    pub fn from_json(data: &serde_json::Value) -> CoreResult<Self> {
        let raw =
            RawAttribute::deserialize(data).map_err(|e| CoreError::schema("Attribute", e, data))?;
        let kind: AttributeKind = raw
            .kind
            .parse()
            .map_err(|e: String| CoreError::schema("Attribute", e, data))?;

        let mut attribute = Self::new(&raw.name, kind, raw.values)?;
        attribute.set_selection(raw.selection)?;
        Ok(attribute)
    }

    /// Current selection
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Checks a candidate selection against this attribute's kind and vocabulary
    pub fn validate_selection(&self, selection: &[String]) -> CoreResult<()> {
        if self.kind.is_vocabulary() {
            if let Some(unknown) = selection.iter().find(|v| !self.values.contains(v)) {
                return Err(CoreError::UnknownValue {
                    attribute: self.name.clone(),
                    value: unknown.clone(),
                });
            }
        }
        if !self.kind.allows_multiple() && selection.len() > 1 {
            return Err(CoreError::TooManySelections {
                attribute: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Replaces the selection after validating it
    pub fn set_selection(&mut self, selection: Vec<String>) -> CoreResult<()> {
        self.validate_selection(&selection)?;
        self.selection = selection;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Renders the selection for tooltips and reports.
    ///
    /// Requires a selection.
    pub fn tooltip_text(&self) -> CoreResult<String> {
        if !self.has_selection() {
            return Err(CoreError::Precondition(format!(
                "attribute '{}' has no selection",
                self.name
            )));
        }

        match self.kind {
            AttributeKind::Exclusive => Ok(format!("{}: {}", self.name, self.single_selection()?)),
            AttributeKind::Text => Ok(format!("{}: \n{}", self.name, self.single_selection()?)),
            AttributeKind::Mix | AttributeKind::Generator => {
                Ok(format!("{}: {}", self.name, self.selection.join(", ")))
            }
        }
    }

    fn single_selection(&self) -> CoreResult<&str> {
        match self.selection.as_slice() {
            [value] => Ok(value),
            _ => Err(CoreError::Precondition(format!(
                "attribute '{}' must have exactly one selected value",
                self.name
            ))),
        }
    }

    /// Serialized form: the picked values only
    pub fn to_record(&self) -> Vec<String> {
        self.selection.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
