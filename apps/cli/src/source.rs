//! In-process `ClinicalSource` over a parsed bundle

use async_trait::async_trait;
use flowsheet_models::{
    CodeGroup, DiagnosticReport, MedicationAdministration, MedicationOrder, Observation,
};
use flowsheet_series::{ClinicalSource, DateRange, ObservationSet, SourceResult};
use std::collections::HashMap;

/// Serves parsed bundle records through the async fetch seam, applying the
/// same filtering a remote source would.
pub struct BundleSource {
    observations: Vec<Observation>,
    orders: Vec<MedicationOrder>,
    administrations: HashMap<String, Vec<MedicationAdministration>>,
    reports: Vec<DiagnosticReport>,
}

impl BundleSource {
    pub fn new(
        observations: Vec<Observation>,
        orders: Vec<MedicationOrder>,
        administrations: HashMap<String, Vec<MedicationAdministration>>,
        reports: Vec<DiagnosticReport>,
    ) -> Self {
        Self {
            observations,
            orders,
            administrations,
            reports,
        }
    }
}

fn in_range(effective: Option<chrono::DateTime<chrono::Utc>>, range: &DateRange) -> bool {
    effective.map_or(true, |at| range.contains(at))
}

#[async_trait]
impl ClinicalSource for BundleSource {
    async fn observations(
        &self,
        group: &CodeGroup,
        range: &DateRange,
    ) -> SourceResult<Vec<ObservationSet>> {
        let mut sets = Vec::new();
        for code in group.code_strings() {
            let members: Vec<Observation> = self
                .observations
                .iter()
                .filter(|observation| {
                    in_range(observation.effective, range)
                        && observation.concepts.iter().any(|c| c.code == code)
                })
                .cloned()
                .collect();
            let label = members
                .first()
                .map(|observation| observation.label.clone())
                .unwrap_or_else(|| code.to_string());
            sets.push(ObservationSet::new(label, members));
        }
        Ok(sets)
    }

    async fn medication_administrations(
        &self,
        order_id: &str,
    ) -> SourceResult<Vec<MedicationAdministration>> {
        Ok(self
            .administrations
            .get(order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn medication_orders(
        &self,
        group: &CodeGroup,
        _range: &DateRange,
    ) -> SourceResult<Vec<MedicationOrder>> {
        let codes = group.code_strings();
        Ok(self
            .orders
            .iter()
            .filter(|order| codes.contains(&order.code.as_str()))
            .cloned()
            .collect())
    }

    async fn diagnostic_reports(
        &self,
        group: &CodeGroup,
        range: &DateRange,
    ) -> SourceResult<Vec<DiagnosticReport>> {
        let codes = group.code_strings();
        Ok(self
            .reports
            .iter()
            .filter(|report| {
                codes.contains(&report.code.code.as_str()) && in_range(report.effective, range)
            })
            .cloned()
            .collect())
    }
}
