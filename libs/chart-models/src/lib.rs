//! Domain model for the flowsheet clinical-timeline core
//!
//! Immutable value types shared by the ingest and series crates: coded
//! concepts and homogeneous code groups, observations, medication orders
//! and administrations, diagnostic reports, and the render-ready
//! `LabeledSeries` shape handed to the chart layer.

pub mod codes;
pub mod medication;
pub mod observation;
pub mod report;
pub mod series;

pub use codes::{
    ChartStyle, CodeGroup, CodeGroupCodes, CodeKind, CodedConcept, GroupError, LabCode,
    MedicationCode, MicrobioCode, INTERPRETATION_SYSTEM, LAB_SYSTEM, MEDICATION_SYSTEM,
    MICROBIO_SYSTEM,
};
pub use medication::{MedicationAdministration, MedicationAdministrationSet, MedicationOrder};
pub use observation::{Comparator, Interpretation, Observation, Quantity, ReferenceRange};
pub use report::DiagnosticReport;
pub use series::{Bounds, Encounter, LabeledSeries, PointValue, SeriesPoint};
