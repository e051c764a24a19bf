//! Symptom Taxonomy Module
//!
//! Models the controlled vocabulary used to annotate recordings:
//!
//! ```text
//! SymptomDb
//! ├── attributes          global attribute definitions (by name)
//! ├── objective_symptoms  [SymptomCategory]
//! └── subjective_symptoms [SymptomCategory]
//!                           └── children [Symptom definition]
//!                                          └── attributes [Attribute]
//! ```
//!
//! Definitions are never mutated once loaded. Instances are owned copies
//! created with [`Symptom::instantiate`] or [`SymptomDb::from_path`].

use std::collections::BTreeMap;

mod attribute;
mod category;
mod database;
mod selections;
mod symptom;

pub use attribute::{Attribute, AttributeKind, NOTES_ATTRIBUTE};
pub use category::SymptomCategory;
pub use database::SymptomDb;
pub use selections::Selections;
pub use symptom::{CategoryRef, Symptom, SymptomRecord};

#[cfg(test)]
pub(crate) use database::tests::{sample_db, sample_db_json};

/// Global attribute definitions, by name
pub type AttributeTable = BTreeMap<String, Attribute>;

/// Taxonomy loading options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaxonomyOptions {
    /// Treat duplicate global attributes and duplicate symptoms within a
    /// category as load errors instead of keeping one and logging a warning
    pub strict_duplicates: bool,
}
