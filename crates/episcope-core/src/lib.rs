//! Episcope Core Library
//!
//! Annotation engine for medical video review. Symptoms from a loaded
//! taxonomy are placed on a timeline, then exported as JSON or as a
//! plain-text clinical report.
//!
//! [`Session`] ties a taxonomy to the timeline being edited and performs
//! the file load/save actions of a front end.

pub mod core;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::{
    fs::atomic_write_text,
    taxonomy::{Selections, SymptomDb, TaxonomyOptions},
    timeline::{ReportInfo, Timeline},
    CoreError, CoreResult, ItemId, TimeMs,
};

// =============================================================================
// Session
// =============================================================================

/// Loaded taxonomy plus the timeline being edited
#[derive(Debug)]
pub struct Session {
    db: SymptomDb,
    timeline: Timeline,
    /// Where the timeline was last loaded from or saved to
    timeline_path: Option<PathBuf>,
}

impl Session {
    /// Loads a taxonomy file and starts with an empty timeline
    pub fn open(taxonomy: &Path, options: &TaxonomyOptions) -> CoreResult<Self> {
        let db = SymptomDb::load(taxonomy, options)?;
        info!(
            "Session opened with {} symptom definitions",
            db.symptom_count()
        );
        Ok(Self::from_db(db))
    }

    pub fn from_db(db: SymptomDb) -> Self {
        Self {
            db,
            timeline: Timeline::new(),
            timeline_path: None,
        }
    }

    pub fn db(&self) -> &SymptomDb {
        &self.db
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn timeline_path(&self) -> Option<&Path> {
        self.timeline_path.as_deref()
    }

    /// Replaces the current timeline with an exported one.
    ///
    /// On any error the current timeline is left untouched.
    pub fn load_timeline(&mut self, path: &Path) -> CoreResult<()> {
        let text = std::fs::read_to_string(path)?;
        let timeline = Timeline::from_json(&self.db, &text)?;

        info!(
            "Loaded timeline with {} items from {}",
            timeline.len(),
            path.display()
        );
        self.timeline = timeline;
        self.timeline_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Saves the timeline to `path`, or to the remembered path when `None`.
    ///
    /// Returns the path written.
    pub fn save_timeline(&mut self, path: Option<&Path>) -> CoreResult<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.timeline_path.clone().ok_or_else(|| {
                CoreError::Precondition("timeline has no file to save to".to_string())
            })?,
        };

        atomic_write_text(&path, &self.timeline.to_json()?)?;
        info!(
            "Saved timeline with {} items to {}",
            self.timeline.len(),
            path.display()
        );
        self.timeline_path = Some(path.clone());
        Ok(path)
    }

    /// Writes the plain-text report
    pub fn export_report(&self, path: &Path, report: &ReportInfo) -> CoreResult<()> {
        atomic_write_text(path, &self.timeline.to_report(report)?)?;
        info!("Exported report to {}", path.display());
        Ok(())
    }

    /// Instantiates the definition at `path` and places it on `[start, end]`
    pub fn add_from_path(
        &mut self,
        path: &str,
        selections: &Selections,
        start: TimeMs,
        end: TimeMs,
    ) -> CoreResult<ItemId> {
        let symptom = self.db.from_path(path, selections)?;
        self.timeline.add_symptom(symptom, start, end)
    }

    /// Starts over with an empty timeline not tied to any file
    pub fn reset(&mut self) {
        self.timeline = Timeline::new();
        self.timeline_path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::taxonomy::{sample_db, sample_db_json};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn topography(values: &[&str]) -> Selections {
        [("topography", values.iter().map(|v| v.to_string()).collect())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_open_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("symptoms.json");
        std::fs::write(&path, sample_db_json().to_string()).unwrap();

        let session = Session::open(&path, &TaxonomyOptions::default()).unwrap();
        assert_eq!(session.db().symptom_count(), 5);
        assert!(session.timeline().is_empty());
        assert!(session.timeline_path().is_none());
    }

    #[test]
    fn test_save_and_load_timeline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recording.json");

        let mut session = Session::from_db(sample_db());
        session
            .add_from_path(
                "subjective_symptoms/category1/Symptom1",
                &topography(&["Eyelids"]),
                1_000,
                3_000,
            )
            .unwrap();
        session
            .add_from_path(
                "objective_symptoms/category3/Symptom4",
                &Selections::new(),
                0,
                500,
            )
            .unwrap();

        let written = session.save_timeline(Some(&path)).unwrap();
        assert_eq!(written, path);
        assert_eq!(session.timeline_path(), Some(path.as_path()));

        let mut other = Session::from_db(sample_db());
        other.load_timeline(&path).unwrap();
        assert_eq!(
            other.timeline().to_json().unwrap(),
            session.timeline().to_json().unwrap()
        );
    }

    #[test]
    fn test_save_without_path() {
        let mut session = Session::from_db(sample_db());
        let err = session.save_timeline(None).unwrap_err();
        assert!(err.is_precondition());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.json");
        session.save_timeline(Some(&path)).unwrap();
        assert_eq!(session.save_timeline(None).unwrap(), path);
    }

    #[test]
    fn test_failed_load_keeps_timeline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        let entries = serde_json::json!([{
            "symptom": { "path": "objective_symptoms/nope/Symptom4", "attributes": {} },
            "start": 0,
            "end": 1
        }]);
        std::fs::write(&path, entries.to_string()).unwrap();

        let mut session = Session::from_db(sample_db());
        session
            .add_from_path(
                "objective_symptoms/category3/Symptom4",
                &Selections::new(),
                0,
                10,
            )
            .unwrap();

        assert!(session.load_timeline(&path).is_err());
        assert_eq!(session.timeline().len(), 1);
        assert!(session.timeline_path().is_none());
    }

    #[test]
    fn test_export_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");

        let mut session = Session::from_db(sample_db());
        session
            .add_from_path(
                "subjective_symptoms/category1/Symptom1",
                &topography(&["Body"]),
                0,
                61_000,
            )
            .unwrap();

        let info = ReportInfo::new(
            "AB12",
            "John Smith",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            "Some notes",
        );
        session.export_report(&path, &info).unwrap();

        let report = std::fs::read_to_string(&path).unwrap();
        assert!(report.starts_with("Patient number: AB12\n"));
        assert!(report.ends_with(
            "   0 - start 00:00, duration 01:01, (end 01:01):\n\tSymptom1\n\t - topography: Body\n"
        ));
    }

    #[test]
    fn test_add_from_bad_path() {
        let mut session = Session::from_db(sample_db());
        let err = session
            .add_from_path("objective_symptoms/category3", &Selections::new(), 0, 1)
            .unwrap_err();

        assert!(err.is_validation_error());
        assert!(session.timeline().is_empty());
    }

    #[test]
    fn test_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.json");

        let mut session = Session::from_db(sample_db());
        session
            .add_from_path(
                "objective_symptoms/category4/Symptom5",
                &Selections::new(),
                0,
                1,
            )
            .unwrap();
        session.save_timeline(Some(&path)).unwrap();

        session.reset();
        assert!(session.timeline().is_empty());
        assert!(session.timeline_path().is_none());
    }
}
