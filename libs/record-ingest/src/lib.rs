//! Strict parsing of raw clinical-record JSON
//!
//! Raw records from real-world feeds are heterogeneous and partially
//! populated. This crate decodes them into the validated domain objects of
//! `flowsheet-models`, failing per record rather than per batch: one
//! unusable record never aborts its siblings.

pub mod error;
pub mod medication;
pub mod observation;
pub mod raw;
pub mod report;

pub use error::{Error, Result};
pub use medication::{parse_medication_administration, parse_medication_order};
pub use observation::{parse_observation, parse_observations};
pub use report::parse_diagnostic_report;
