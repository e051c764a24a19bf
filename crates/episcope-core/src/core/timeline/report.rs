//! Plain-text clinical report
//!
//! Header block with patient details and free-form observations, followed by
//! the chronology: one line per item in start order plus its indented
//! tooltip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::time::format_minutes_seconds;
use super::Timeline;
use crate::core::CoreResult;

/// Report header supplied by the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportInfo {
    pub patient_id: String,
    pub doctor_name: String,
    /// Rendered as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Free text; line breaks are kept
    #[serde(default)]
    pub notes: String,
}

impl ReportInfo {
    pub fn new(patient_id: &str, doctor_name: &str, date: NaiveDate, notes: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            doctor_name: doctor_name.to_string(),
            date,
            notes: notes.to_string(),
        }
    }
}

impl Timeline {
    /// Renders the report. Ends with a newline.
    pub fn to_report(&self, info: &ReportInfo) -> CoreResult<String> {
        let mut lines = vec![
            format!("Patient number: {}", info.patient_id),
            format!("Doctor name: {}", info.doctor_name),
            format!("Date: {}", info.date.format("%Y-%m-%d")),
            String::new(),
            "Observations:".to_string(),
        ];
        lines.extend(info.notes.split('\n').map(|line| format!("  {}", line)));
        lines.push(String::new());
        lines.push("Chronology:".to_string());

        for (index, item) in self.symptoms().enumerate() {
            lines.push(format!(
                " {:3} - start {}, duration {}, (end {}):",
                index,
                format_minutes_seconds(item.start),
                format_minutes_seconds(item.duration),
                format_minutes_seconds(item.end())
            ));
            let tooltip = item.symptom.tooltip_text()?;
            lines.extend(tooltip.split('\n').map(|line| format!("\t{}", line)));
        }
        lines.push(String::new());

        Ok(lines.join("\n"))
    }
}
