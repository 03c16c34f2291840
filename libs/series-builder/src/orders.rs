//! Medication resolution
//!
//! Administration histories are fetched lazily, memoized per order
//! instance, and resolved concurrently as one joined wait when a whole
//! order set is built.

use crate::error::{Error, Result};
use crate::source::ClinicalSource;
use flowsheet_models::{MedicationAdministration, MedicationAdministrationSet, MedicationOrder};
use futures::future::try_join_all;
use tracing::debug;

/// Memoizing accessor for an order's administration history.
///
/// The first call fetches by order id and populates the order's cache cell;
/// every later call returns the cached set without re-fetching. Fetched
/// administrations are sorted timestamp-ascending before caching.
pub async fn administrations_for<'a>(
    order: &'a MedicationOrder,
    source: &dyn ClinicalSource,
) -> Result<&'a MedicationAdministrationSet> {
    order
        .administration_cell()
        .get_or_try_init(|| async {
            debug!(order_id = %order.id, "resolving administration history");
            let raw = source
                .medication_administrations(&order.id)
                .await
                .map_err(Error::Source)?;
            Ok(MedicationAdministrationSet::new(raw))
        })
        .await
}

/// Multiple orders sharing one medication concept, with their resolved
/// administration histories and aggregate dose bounds.
#[derive(Debug, Clone)]
pub struct MedicationOrderSet {
    label: String,
    unit: Option<String>,
    orders: Vec<MedicationOrder>,
}

impl MedicationOrderSet {
    /// Resolve every member's administrations as a single joined wait,
    /// then validate unit consistency across members.
    pub async fn build(orders: Vec<MedicationOrder>, source: &dyn ClinicalSource) -> Result<Self> {
        let sets = try_join_all(
            orders
                .iter()
                .map(|order| administrations_for(order, source)),
        )
        .await?;

        let mut unit: Option<String> = None;
        for set in sets {
            if let Some(u) = set.unit() {
                match &unit {
                    None => unit = Some(u.to_string()),
                    Some(existing) if existing != u => {
                        return Err(Error::InconsistentUnit(existing.clone(), u.to_string()));
                    }
                    Some(_) => {}
                }
            }
        }

        let label = orders
            .first()
            .map(|order| order.label.clone())
            .unwrap_or_default();

        Ok(Self { label, unit, orders })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn orders(&self) -> &[MedicationOrder] {
        &self.orders
    }

    /// All member administrations merged in timestamp-ascending order.
    pub fn administrations(&self) -> Vec<MedicationAdministration> {
        let mut merged: Vec<MedicationAdministration> = self
            .orders
            .iter()
            .filter_map(|order| order.cached_administrations())
            .flat_map(|set| set.iter().cloned())
            .collect();
        merged.sort_by_key(|a| a.at);
        merged
    }

    pub fn min_dose(&self) -> Option<f64> {
        self.orders
            .iter()
            .filter_map(|order| order.cached_administrations()?.min_dose())
            .fold(None, |min, d| Some(min.map_or(d, |m: f64| m.min(d))))
    }

    pub fn max_dose(&self) -> Option<f64> {
        self.orders
            .iter()
            .filter_map(|order| order.cached_administrations()?.max_dose())
            .fold(None, |max, d| Some(max.map_or(d, |m: f64| m.max(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation_set::ObservationSet;
    use crate::source::{DateRange, SourceResult};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use flowsheet_models::{CodeGroup, DiagnosticReport, MedicationCode};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1988, 3, day, hour, 0, 0).unwrap()
    }

    fn admin(day: u32, hour: u32, dose: f64, unit: &str) -> MedicationAdministration {
        MedicationAdministration {
            at: at(day, hour),
            dose,
            unit: Some(unit.to_string()),
        }
    }

    struct StubSource {
        administrations: HashMap<String, Vec<MedicationAdministration>>,
        fetch_count: AtomicUsize,
    }

    impl StubSource {
        fn new(administrations: HashMap<String, Vec<MedicationAdministration>>) -> Self {
            Self {
                administrations,
                fetch_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ClinicalSource for StubSource {
        async fn observations(
            &self,
            _group: &CodeGroup,
            _range: &DateRange,
        ) -> SourceResult<Vec<ObservationSet>> {
            Ok(Vec::new())
        }

        async fn medication_administrations(
            &self,
            order_id: &str,
        ) -> SourceResult<Vec<MedicationAdministration>> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .administrations
                .get(order_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn medication_orders(
            &self,
            _group: &CodeGroup,
            _range: &DateRange,
        ) -> SourceResult<Vec<MedicationOrder>> {
            Ok(Vec::new())
        }

        async fn diagnostic_reports(
            &self,
            _group: &CodeGroup,
            _range: &DateRange,
        ) -> SourceResult<Vec<DiagnosticReport>> {
            Ok(Vec::new())
        }
    }

    fn order(id: &str) -> MedicationOrder {
        MedicationOrder::new(id, MedicationCode::resolve("11124").unwrap())
    }

    #[tokio::test]
    async fn resolution_is_memoized_per_order_instance() {
        let source = StubSource::new(HashMap::from([(
            "order-1".to_string(),
            vec![admin(23, 8, 500.0, "mg")],
        )]));
        let o = order("order-1");

        administrations_for(&o, &source).await.unwrap();
        administrations_for(&o, &source).await.unwrap();

        assert_eq!(source.fetch_count.load(Ordering::SeqCst), 1);
        assert_eq!(o.cached_administrations().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn order_set_interleaves_administrations_by_timestamp() {
        let source = StubSource::new(HashMap::from([
            (
                "order-1".to_string(),
                vec![admin(25, 8, 100.0, "mg"), admin(23, 8, 50.0, "mg")],
            ),
            (
                "order-2".to_string(),
                vec![admin(24, 8, 75.0, "mg"), admin(26, 8, 25.0, "mg")],
            ),
        ]));

        let set = MedicationOrderSet::build(vec![order("order-2"), order("order-1")], &source)
            .await
            .unwrap();
        let merged = set.administrations();
        let times: Vec<_> = merged.iter().map(|a| a.at).collect();
        assert_eq!(times, vec![at(23, 8), at(24, 8), at(25, 8), at(26, 8)]);
        assert_eq!(set.min_dose(), Some(25.0));
        assert_eq!(set.max_dose(), Some(100.0));
        assert_eq!(set.unit(), Some("mg"));
        assert_eq!(set.label(), "Vancomycin");
    }

    #[tokio::test]
    async fn disagreeing_units_fail_the_order_set() {
        let source = StubSource::new(HashMap::from([
            ("order-1".to_string(), vec![admin(23, 8, 500.0, "mg")]),
            ("order-2".to_string(), vec![admin(24, 8, 1.0, "g")]),
        ]));

        let err = MedicationOrderSet::build(vec![order("order-1"), order("order-2")], &source)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InconsistentUnit(a, b) if a == "mg" && b == "g"));
    }
}
