//! Timeline JSON export and import
//!
//! # Format
//!
//! ```text
//! [
//!     {
//!         "symptom": {
//!             "path": "<family>/<category>/<symptom>",
//!             "attributes": { "<name>": ["<value>", ...] }
//!         },
//!         "start": <ms>,
//!         "end": <ms>
//!     },
//!     ...
//! ]
//! ```
//!
//! Entries are written in start order with a 4-space indent. Import accepts
//! entries in any order; a single bad entry fails the whole import.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Timeline;
use crate::core::taxonomy::{SymptomDb, SymptomRecord};
use crate::core::{to_pretty_json, CoreError, CoreResult, TimeMs};

/// One exported timeline item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelineEntry {
    pub symptom: SymptomRecord,
    pub start: TimeMs,
    pub end: TimeMs,
}

impl Timeline {
    /// Serializable entries, in start order
    pub fn entries(&self) -> CoreResult<Vec<TimelineEntry>> {
        self.symptoms()
            .map(|item| {
                Ok(TimelineEntry {
                    symptom: item.symptom.to_record()?,
                    start: item.start,
                    end: item.end(),
                })
            })
            .collect()
    }

    /// Exports the timeline as pretty-printed JSON
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(to_pretty_json(&self.entries()?)?)
    }

    /// Rebuilds a timeline from exported entries, resolving each path in `db`
    pub fn from_entries(db: &SymptomDb, entries: &[TimelineEntry]) -> CoreResult<Self> {
        let mut timeline = Self::new();
        for entry in entries {
            let symptom = db.from_path(&entry.symptom.path, &entry.symptom.attributes)?;
            timeline.add_symptom(symptom, entry.start, entry.end)?;
        }
        Ok(timeline)
    }

    /// Parses an exported timeline document
    pub fn from_json(db: &SymptomDb, text: &str) -> CoreResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let raw_entries = Vec::<serde_json::Value>::deserialize(&value)
            .map_err(|e| CoreError::schema("Timeline", e, &value))?;

        let entries = raw_entries
            .iter()
            .map(|raw| {
                TimelineEntry::deserialize(raw)
                    .map_err(|e| CoreError::schema("TimelineEntry", e, raw))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let timeline = Self::from_entries(db, &entries)?;
        debug!("Imported timeline with {} items", timeline.len());
        Ok(timeline)
    }
}
