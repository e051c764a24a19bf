//! Timeline Module
//!
//! Placed symptom instances in start order, with JSON export/import and
//! the plain-text report.

mod export;
pub(crate) mod models;
mod report;
mod time;

pub use export::TimelineEntry;
pub use models::{SymptomUpdate, Timeline, TimelineItem};
pub use report::ReportInfo;
pub use time::{format_clock, format_minutes_seconds};
