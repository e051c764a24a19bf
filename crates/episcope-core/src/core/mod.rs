//! Episcope Core Engine
//!
//! Annotation engine for clinical video review: the symptom taxonomy,
//! the timeline of placed symptoms, and their JSON and report exports.

pub mod fs;
pub mod settings;
pub mod taxonomy;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
