//! Symptom Model
//!
//! A symptom *definition* is a taxonomy template: a named clinical event
//! type with its attributes and no selections. A symptom *instance* is an
//! owned copy of a definition placed on a timeline, carrying its own
//! selections. Instances never share attribute storage with their
//! definition or with each other.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Attribute, AttributeKind, AttributeTable, Selections, NOTES_ATTRIBUTE};
use crate::core::{CoreError, CoreResult, PATH_SEPARATOR};

// =============================================================================
// Category Reference
// =============================================================================

/// Non-owning link from a symptom to the category that holds its definition
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRef {
    pub family: String,
    pub name: String,
}

// =============================================================================
// Serialized Form
// =============================================================================

/// Serialized symptom instance, as written to timeline exports
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    /// `family/category/symptom`
    pub path: String,
    /// Non-empty selections only
    #[serde(default)]
    pub attributes: Selections,
}

// =============================================================================
// Symptom
// =============================================================================

/// Symptom definition dict as found in taxonomy files
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSymptom {
    name: String,
    #[serde(default)]
    custom_attributes: Vec<serde_json::Value>,
    #[serde(default)]
    attributes: AttributeRefs,
}

/// Global attribute references, either bare names or names with selections
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttributeRefs {
    Names(Vec<String>),
    Selections(Selections),
}

impl Default for AttributeRefs {
    fn default() -> Self {
        Self::Names(vec![])
    }
}

/// Clinical event type (definition) or placed occurrence (instance)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symptom {
    pub name: String,
    attributes: Vec<Attribute>,
    category: Option<CategoryRef>,
    is_instance: bool,
}

impl Symptom {
    /// Creates a symptom definition.
    ///
    /// A free-text `notes` attribute is appended unless one is present.
    pub fn new(name: &str, attributes: Vec<Attribute>) -> Self {
        Self::build(name, attributes, false)
    }

    fn build(name: &str, mut attributes: Vec<Attribute>, is_instance: bool) -> Self {
        if !attributes.iter().any(|a| a.name == NOTES_ATTRIBUTE) {
            attributes.push(Attribute::text(NOTES_ATTRIBUTE));
        }
        Self {
            name: name.to_string(),
            attributes,
            category: None,
            is_instance,
        }
    }

    /// Parses a symptom from a taxonomy entry.
    ///
    /// `attributes` references entries of `globals`, either as a list of
    /// names or as a map of names to selections (`null` for none).
    /// `custom_attributes` declares attributes local to this symptom.
    /// Any selection in the input makes the result an instance.
    pub fn from_json(globals: &AttributeTable, data: &serde_json::Value) -> CoreResult<Self> {
        let raw =
            RawSymptom::deserialize(data).map_err(|e| CoreError::schema("Symptom", e, data))?;

        let custom = raw
            .custom_attributes
            .iter()
            .map(Attribute::from_json)
            .collect::<CoreResult<Vec<_>>>()?;

        let references: Vec<(String, Vec<String>)> = match raw.attributes {
            AttributeRefs::Names(names) => names.into_iter().map(|n| (n, vec![])).collect(),
            AttributeRefs::Selections(selections) => selections.into_inner(),
        };

        let mut is_instance = false;
        let mut seen = HashSet::new();
        let mut attributes = Vec::with_capacity(references.len() + custom.len() + 1);

        for (name, selection) in references {
            let mut attribute = globals
                .get(&name)
                .cloned()
                .ok_or_else(|| CoreError::UnknownGlobalAttribute(name.clone()))?;
            if !seen.insert(name.clone()) {
                return Err(CoreError::DuplicateAttributeName(name));
            }
            if !selection.is_empty() {
                attribute.set_selection(selection)?;
                is_instance = true;
            }
            attributes.push(attribute);
        }

        for attribute in custom {
            // Custom names may not shadow any taxonomy-wide attribute
            if globals.contains_key(&attribute.name) || !seen.insert(attribute.name.clone()) {
                return Err(CoreError::DuplicateAttributeName(attribute.name));
            }
            is_instance |= attribute.has_selection();
            attributes.push(attribute);
        }

        Ok(Self::build(&raw.name, attributes, is_instance))
    }

    /// Returns an independent copy flagged as an instance
    pub fn instantiate(&self) -> Self {
        let mut instance = self.clone();
        instance.is_instance = true;
        instance
    }

    /// Instantiates, then applies `selections` by attribute name.
    ///
    /// Every name must be an attribute of this symptom and every value
    /// must be valid for that attribute.
    pub fn instantiate_with(&self, selections: &Selections) -> CoreResult<Self> {
        let mut instance = self.instantiate();
        for (name, values) in selections.iter() {
            instance.select(name, values.to_vec())?;
        }
        Ok(instance)
    }

    /// Replaces the selection of one attribute
    pub fn select(&mut self, attribute: &str, values: Vec<String>) -> CoreResult<()> {
        let symptom = self.name.clone();
        let target = self
            .attribute_mut(attribute)
            .ok_or_else(|| CoreError::InvalidAttribute {
                attribute: attribute.to_string(),
                symptom,
            })?;
        target.set_selection(values)
    }

    pub fn is_instance(&self) -> bool {
        self.is_instance
    }

    /// Attributes in declaration order (globals, customs, then `notes`)
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    pub fn category(&self) -> Option<&CategoryRef> {
        self.category.as_ref()
    }

    pub(crate) fn set_category(&mut self, category: CategoryRef) {
        self.category = Some(category);
    }

    /// `family/category/name`, if the symptom belongs to a category
    pub fn path(&self) -> Option<String> {
        self.category.as_ref().map(|c| {
            format!(
                "{}{sep}{}{sep}{}",
                c.family,
                c.name,
                self.name,
                sep = PATH_SEPARATOR
            )
        })
    }

    fn require_instance(&self, operation: &str) -> CoreResult<()> {
        if self.is_instance {
            Ok(())
        } else {
            Err(CoreError::Precondition(format!(
                "{} requires a symptom instance, '{}' is a definition",
                operation, self.name
            )))
        }
    }

    /// Multi-line description: the name, then one line per selected attribute.
    ///
    /// Requires an instance.
    pub fn tooltip_text(&self) -> CoreResult<String> {
        self.require_instance("tooltip")?;

        let mut lines = vec![self.name.clone()];
        for attribute in self.attributes.iter().filter(|a| a.has_selection()) {
            match attribute.kind {
                AttributeKind::Text => {
                    lines.push(format!("\n{}", attribute.selection().join("\n")))
                }
                _ => lines.push(format!(
                    " - {}: {}",
                    attribute.name,
                    attribute.selection().join(", ")
                )),
            }
        }
        Ok(lines.join("\n"))
    }

    /// Serialized form used by timeline exports.
    ///
    /// Requires an instance attached to a category.
    pub fn to_record(&self) -> CoreResult<SymptomRecord> {
        self.require_instance("serialize")?;
        let path = self.path().ok_or_else(|| {
            CoreError::Precondition(format!("symptom '{}' has no category", self.name))
        })?;

        let attributes = self
            .attributes
            .iter()
            .filter(|a| a.has_selection())
            .map(|a| (a.name.as_str(), a.to_record()))
            .collect();

        Ok(SymptomRecord { path, attributes })
    }
}

// =============================================================================
// Tests
// =============================================================================
