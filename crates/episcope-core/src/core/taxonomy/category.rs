//! Symptom categories
//!
//! A category groups symptom definitions within a family. Category and
//! family names end up in symptom paths, so they may not contain `/`.

use serde::Deserialize;
use tracing::warn;

use super::{AttributeTable, CategoryRef, Symptom, TaxonomyOptions};
use crate::core::{CoreError, CoreResult, PATH_SEPARATOR};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCategory {
    name: String,
    children: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Named group of symptom definitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymptomCategory {
    family: String,
    name: String,
    children: Vec<Symptom>,
}

impl SymptomCategory {
    /// Creates an empty category.
    ///
    /// Fails if either name contains the path separator.
    pub fn new(family: &str, name: &str) -> CoreResult<Self> {
        if family.contains(PATH_SEPARATOR) {
            return Err(CoreError::IllegalCharacter {
                field: "family",
                value: family.to_string(),
            });
        }
        if name.contains(PATH_SEPARATOR) {
            return Err(CoreError::IllegalCharacter {
                field: "category",
                value: name.to_string(),
            });
        }
        Ok(Self {
            family: family.to_string(),
            name: name.to_string(),
            children: vec![],
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Symptom definitions in insertion order
    pub fn symptoms(&self) -> &[Symptom] {
        &self.children
    }

    pub fn symptom(&self, name: &str) -> Option<&Symptom> {
        self.children.iter().find(|s| s.name == name)
    }

    /// Identifier other symptoms use to refer back to this category
    pub fn reference(&self) -> CategoryRef {
        CategoryRef {
            family: self.family.clone(),
            name: self.name.clone(),
        }
    }

    /// Adds a symptom and links it to this category.
    ///
    /// Returns false, leaving the category untouched, if a symptom with the
    /// same name is already present.
    pub fn add_symptom(&mut self, mut symptom: Symptom) -> bool {
        if self.symptom(&symptom.name).is_some() {
            return false;
        }
        symptom.set_category(self.reference());
        self.children.push(symptom);
        true
    }

    /// Parses a category entry: `{ "name": str, "children": [ {symptom}, ... ] }`
    pub fn from_json(
        family: &str,
        globals: &AttributeTable,
        data: &serde_json::Value,
    ) -> CoreResult<Self> {
        Self::from_json_with(family, globals, data, &TaxonomyOptions::default())
    }

    /// Same as [`SymptomCategory::from_json`], with duplicate handling
    /// controlled by `options`.
    pub fn from_json_with(
        family: &str,
        globals: &AttributeTable,
        data: &serde_json::Value,
        options: &TaxonomyOptions,
    ) -> CoreResult<Self> {
        let raw = RawCategory::deserialize(data)
            .map_err(|e| CoreError::schema("SymptomCategory", e, data))?;

        let mut category = Self::new(family, &raw.name)?;
        for child in raw.children {
            let symptom = Symptom::from_json(globals, &serde_json::Value::Object(child))?;
            let symptom_name = symptom.name.clone();
            if !category.add_symptom(symptom) {
                if options.strict_duplicates {
                    return Err(CoreError::DuplicateSymptom {
                        category: category.name.clone(),
                        symptom: symptom_name,
                    });
                }
                warn!(
                    "Dropping duplicate symptom '{}' in category '{}/{}'",
                    symptom_name, category.family, category.name
                );
            }
        }
        Ok(category)
    }
}
