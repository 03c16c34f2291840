//! The fetch seam to the transport collaborator
//!
//! All record fetches are asynchronous; the transport itself (network
//! client, auth, timeouts) lives outside this crate. A rejected fetch
//! propagates its own error unchanged through [`crate::Error::Source`].

use crate::observation_set::ObservationSet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowsheet_models::{CodeGroup, DiagnosticReport, MedicationAdministration, MedicationOrder};
use serde::{Deserialize, Serialize};

/// Opaque transport error, surfaced to callers without translation.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// The date window an axis is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Asynchronous access to clinical records for one patient context.
#[async_trait]
pub trait ClinicalSource: Send + Sync {
    /// Observation sets for a lab code group within a date range, one set
    /// per clinical concept.
    async fn observations(
        &self,
        group: &CodeGroup,
        range: &DateRange,
    ) -> SourceResult<Vec<ObservationSet>>;

    /// Administration history for one medication order, keyed by order id.
    async fn medication_administrations(
        &self,
        order_id: &str,
    ) -> SourceResult<Vec<MedicationAdministration>>;

    /// Medication orders for a medication code group within a date range.
    async fn medication_orders(
        &self,
        group: &CodeGroup,
        range: &DateRange,
    ) -> SourceResult<Vec<MedicationOrder>>;

    /// Diagnostic reports for a microbiology code group within a date range.
    async fn diagnostic_reports(
        &self,
        group: &CodeGroup,
        range: &DateRange,
    ) -> SourceResult<Vec<DiagnosticReport>>;
}
