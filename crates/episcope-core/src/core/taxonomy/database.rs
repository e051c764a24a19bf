//! Symptom Database
//!
//! The taxonomy loaded at startup: global attribute definitions plus the
//! objective and subjective category trees. Resolves symptom paths to
//! definitions and builds instances from serialized selections.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Attribute, AttributeTable, Selections, Symptom, SymptomCategory, TaxonomyOptions};
use crate::core::{CoreError, CoreResult, PathError, SymptomFamily, PATH_SEPARATOR};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDatabase {
    attributes: Vec<serde_json::Map<String, serde_json::Value>>,
    objective_symptoms: Vec<serde_json::Map<String, serde_json::Value>>,
    subjective_symptoms: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Loaded symptom taxonomy
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymptomDb {
    /// Global attribute definitions, by name
    pub attributes: AttributeTable,
    pub objective: Vec<SymptomCategory>,
    pub subjective: Vec<SymptomCategory>,
}

impl SymptomDb {
    /// Parses a taxonomy document.
    ///
    /// Expected shape:
    /// `{ "attributes": [..], "objective_symptoms": [..], "subjective_symptoms": [..] }`
    pub fn from_json(data: &serde_json::Value) -> CoreResult<Self> {
        Self::from_json_with(data, &TaxonomyOptions::default())
    }

    /// Same as [`SymptomDb::from_json`], with duplicate handling controlled
    /// by `options`.
    pub fn from_json_with(data: &serde_json::Value, options: &TaxonomyOptions) -> CoreResult<Self> {
        let raw =
            RawDatabase::deserialize(data).map_err(|e| CoreError::schema("SymptomDB", e, data))?;

        let mut attributes = AttributeTable::new();
        for entry in raw.attributes {
            let attribute = Attribute::from_json(&serde_json::Value::Object(entry))?;
            if attributes.contains_key(&attribute.name) {
                if options.strict_duplicates {
                    return Err(CoreError::DuplicateGlobalAttribute(attribute.name));
                }
                warn!(
                    "Global attribute '{}' defined more than once, keeping the last definition",
                    attribute.name
                );
            }
            attributes.insert(attribute.name.clone(), attribute);
        }

        let parse_family = |family: SymptomFamily,
                            entries: Vec<serde_json::Map<String, serde_json::Value>>|
         -> CoreResult<Vec<SymptomCategory>> {
            entries
                .into_iter()
                .map(|entry| {
                    SymptomCategory::from_json_with(
                        family.as_str(),
                        &attributes,
                        &serde_json::Value::Object(entry),
                        options,
                    )
                })
                .collect()
        };

        let objective = parse_family(SymptomFamily::Objective, raw.objective_symptoms)?;
        let subjective = parse_family(SymptomFamily::Subjective, raw.subjective_symptoms)?;

        let db = Self {
            attributes,
            objective,
            subjective,
        };
        debug!(
            "Parsed taxonomy: {} attributes, {} categories, {} symptoms",
            db.attributes.len(),
            db.objective.len() + db.subjective.len(),
            db.symptom_count()
        );
        Ok(db)
    }

    /// Parses a taxonomy from JSON text
    pub fn from_str_with(text: &str, options: &TaxonomyOptions) -> CoreResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json_with(&value, options)
    }

    /// Reads and parses a taxonomy file
    pub fn load(path: &Path, options: &TaxonomyOptions) -> CoreResult<Self> {
        info!("Loading symptom taxonomy from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_str_with(&text, options)
    }

    /// Categories of one family
    pub fn categories(&self, family: SymptomFamily) -> &[SymptomCategory] {
        match family {
            SymptomFamily::Objective => &self.objective,
            SymptomFamily::Subjective => &self.subjective,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Number of symptom definitions across both families
    pub fn symptom_count(&self) -> usize {
        SymptomFamily::ALL
            .iter()
            .flat_map(|f| self.categories(*f))
            .map(|c| c.symptoms().len())
            .sum()
    }

    /// Paths of every definition, objective family first
    pub fn paths(&self) -> Vec<String> {
        SymptomFamily::ALL
            .iter()
            .flat_map(|f| self.categories(*f))
            .flat_map(|c| c.symptoms().iter().filter_map(Symptom::path))
            .collect()
    }

    /// Resolves a `family/category/symptom` path to its definition
    pub fn definition(&self, path: &str) -> CoreResult<&Symptom> {
        let invalid = |reason: PathError| CoreError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        let [family, category, symptom] = segments.as_slice() else {
            return Err(invalid(PathError::Format));
        };

        let family = SymptomFamily::from_key(family)
            .ok_or_else(|| invalid(PathError::UnknownFamily(family.to_string())))?;
        let category = self
            .categories(family)
            .iter()
            .find(|c| c.name() == *category)
            .ok_or_else(|| invalid(PathError::UnknownCategory(category.to_string())))?;
        category
            .symptom(symptom)
            .ok_or_else(|| invalid(PathError::UnknownSymptom(symptom.to_string())))
    }

    /// Builds an instance of the definition at `path` with the given selections
    pub fn from_path(&self, path: &str, selections: &Selections) -> CoreResult<Symptom> {
        self.definition(path)?.instantiate_with(selections)
    }
}

impl std::str::FromStr for SymptomDb {
    type Err = CoreError;

    /// Parses with default (lenient) duplicate handling
    fn from_str(text: &str) -> CoreResult<Self> {
        Self::from_str_with(text, &TaxonomyOptions::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::taxonomy::AttributeKind;
    use serde_json::json;

    pub(crate) fn sample_db_json() -> serde_json::Value {
        json!({
            "attributes": [
                { "name": "topography", "type": "mix", "values": ["Body", "Eyelids"] },
                { "name": "lateralized", "type": "exclusive", "values": ["left", "right"] }
            ],
            "subjective_symptoms": [
                {
                    "name": "category1",
                    "children": [
                        {
                            "name": "Symptom1",
                            "custom_attributes": [
                                {
                                    "name": "direction",
                                    "type": "exclusive",
                                    "values": ["Cephalic to epigastric", "Epigastric to cephalic"]
                                }
                            ],
                            "attributes": ["topography"]
                        },
                        { "name": "Symptom2" }
                    ]
                },
                { "name": "category2", "children": [ { "name": "Symptom3" } ] }
            ],
            "objective_symptoms": [
                { "name": "category3", "children": [ { "name": "Symptom4" } ] },
                { "name": "category4", "children": [ { "name": "Symptom5" } ] }
            ]
        })
    }

    pub(crate) fn sample_db() -> SymptomDb {
        SymptomDb::from_json(&sample_db_json()).unwrap()
    }

    fn select(name: &str, values: &[&str]) -> Selections {
        [(name, values.iter().map(|v| v.to_string()).collect())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_from_json() {
        let db = sample_db();

        assert_eq!(db.attributes.len(), 2);
        assert_eq!(db.objective.len(), 2);
        assert_eq!(db.subjective.len(), 2);

        let topography = db.attribute("topography").unwrap();
        assert_eq!(topography.kind, AttributeKind::Mix);
        assert_eq!(topography.values, vec!["Body", "Eyelids"]);

        let lateralized = db.attribute("lateralized").unwrap();
        assert_eq!(lateralized.kind, AttributeKind::Exclusive);
        assert_eq!(lateralized.values, vec!["left", "right"]);

        let symptom1 = &db.subjective[0].symptoms()[0];
        assert_eq!(db.subjective[0].name(), "category1");
        assert_eq!(symptom1.name, "Symptom1");
        assert_eq!(symptom1.attribute("topography"), Some(topography));
        assert_eq!(
            symptom1.attribute("direction"),
            Some(
                &Attribute::new(
                    "direction",
                    AttributeKind::Exclusive,
                    vec![
                        "Cephalic to epigastric".to_string(),
                        "Epigastric to cephalic".to_string()
                    ]
                )
                .unwrap()
            )
        );

        assert_eq!(db.subjective[0].symptoms()[1].name, "Symptom2");
        assert_eq!(db.subjective[1].name(), "category2");
        assert_eq!(db.subjective[1].symptoms()[0].name, "Symptom3");
        assert_eq!(db.objective[0].name(), "category3");
        assert_eq!(db.objective[0].symptoms()[0].name, "Symptom4");
        assert_eq!(db.objective[1].name(), "category4");
        assert_eq!(db.objective[1].symptoms()[0].name, "Symptom5");
    }

    #[test]
    fn test_from_json_missing_family() {
        let err = SymptomDb::from_json(&json!({ "attributes": [], "objective_symptoms": [] }))
            .unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_bad_child_fails_whole_load() {
        let mut data = sample_db_json();
        data["objective_symptoms"][1]["children"][0]["attributes"] = json!(["missing"]);

        let err = SymptomDb::from_json(&data).unwrap_err();
        assert_eq!(err.to_string(), "Unknown global attribute 'missing'.");
    }

    #[test]
    fn test_duplicate_global_attribute() {
        let data = json!({
            "attributes": [
                { "name": "a", "type": "mix", "values": ["x"] },
                { "name": "a", "type": "mix", "values": ["y"] }
            ],
            "objective_symptoms": [],
            "subjective_symptoms": []
        });

        let db = SymptomDb::from_json(&data).unwrap();
        assert_eq!(db.attribute("a").unwrap().values, vec!["y"]);

        let strict = TaxonomyOptions {
            strict_duplicates: true,
        };
        let err = SymptomDb::from_json_with(&data, &strict).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate global attribute 'a'.");
    }

    #[test]
    fn test_paths() {
        let db = sample_db();
        assert_eq!(
            db.paths(),
            vec![
                "objective_symptoms/category3/Symptom4",
                "objective_symptoms/category4/Symptom5",
                "subjective_symptoms/category1/Symptom1",
                "subjective_symptoms/category1/Symptom2",
                "subjective_symptoms/category2/Symptom3",
            ]
        );
        assert_eq!(db.symptom_count(), 5);
    }

    #[test]
    fn test_from_path() {
        let db = sample_db();

        let instance = db
            .from_path(
                "subjective_symptoms/category1/Symptom1",
                &select("topography", &["Body"]),
            )
            .unwrap();

        assert!(instance.is_instance());
        assert_eq!(instance.name, "Symptom1");
        assert_eq!(instance.attribute("topography").unwrap().selection(), ["Body"]);
        assert!(instance.attribute("direction").unwrap().selection().is_empty());

        // The definition is untouched
        let definition = db.definition("subjective_symptoms/category1/Symptom1").unwrap();
        assert!(!definition.is_instance());
        assert!(!definition.attribute("topography").unwrap().has_selection());
        assert!(!db.attribute("topography").unwrap().has_selection());
    }

    #[test]
    fn test_from_path_bad_path() {
        let err = sample_db()
            .from_path("randomcategory1/Symptom1", &select("topography", &["Body"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid symptom path 'randomcategory1/Symptom1'. Expected format: 'family/category/symptom'."
        );

        let err = sample_db()
            .from_path("a/b/c/d", &Selections::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidPath {
                reason: PathError::Format,
                ..
            }
        ));
    }

    #[test]
    fn test_from_path_bad_family() {
        let err = sample_db()
            .from_path("y/x/Symptom1", &select("topography", &["Body"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid symptom path 'y/x/Symptom1'. Unknown family 'y'."
        );
    }

    #[test]
    fn test_from_path_bad_category() {
        let err = sample_db()
            .from_path(
                "subjective_symptoms/x/Symptom1",
                &select("topography", &["Body"]),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid symptom path 'subjective_symptoms/x/Symptom1'. Unknown category 'x'."
        );
    }

    #[test]
    fn test_from_path_bad_symptom() {
        let err = sample_db()
            .from_path(
                "subjective_symptoms/category1/SymptomX",
                &select("topography", &["Body"]),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid symptom path 'subjective_symptoms/category1/SymptomX'. Unknown symptom 'SymptomX'."
        );
    }

    #[test]
    fn test_from_path_bad_attribute() {
        let err = sample_db()
            .from_path(
                "subjective_symptoms/category1/Symptom1",
                &select("lateralized", &["Body"]),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid attribute 'lateralized' for symptom 'Symptom1'."
        );
    }

    #[test]
    fn test_from_path_bad_attribute_value() {
        let err = sample_db()
            .from_path(
                "subjective_symptoms/category1/Symptom1",
                &select("direction", &["Sideways"]),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownValue { .. }));
    }

    #[test]
    fn test_parse_from_text() {
        let db: SymptomDb = sample_db_json().to_string().parse().unwrap();
        assert_eq!(db, sample_db());

        let err = "{ not json".parse::<SymptomDb>().unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("symptoms.json");
        std::fs::write(&path, sample_db_json().to_string()).unwrap();

        let db = SymptomDb::load(&path, &TaxonomyOptions::default()).unwrap();
        assert_eq!(db, sample_db());

        let missing = SymptomDb::load(&dir.path().join("nope.json"), &TaxonomyOptions::default());
        assert!(matches!(missing, Err(CoreError::IoError(_))));
    }
}
