//! Labeled-series construction and axis dispatch
//!
//! Takes the validated domain objects of `flowsheet-models`, resolves the
//! asynchronous pieces (medication administration histories, in-range
//! observation sets) through the [`ClinicalSource`] seam, and builds the
//! render-ready [`LabeledSeries`](flowsheet_models::LabeledSeries) bundles
//! the chart layer consumes. Inconsistencies across otherwise-valid records
//! fail the one series being built; a silently wrong clinical chart is
//! worse than no chart.

pub mod builder;
pub mod dispatch;
pub mod error;
pub mod observation_set;
pub mod orders;
pub mod source;

pub use builder::{
    continuous_series, discrete_series, order_series, order_set_series, report_series,
    OrderSeriesPair,
};
pub use dispatch::{resolve_axis_data, AxisRequest, SeriesBundle};
pub use error::{Error, Result};
pub use observation_set::{AnnotatedObservation, ObservationSet};
pub use orders::{administrations_for, MedicationOrderSet};
pub use source::{ClinicalSource, DateRange, SourceError, SourceResult};
