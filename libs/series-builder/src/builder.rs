//! Labeled-series construction
//!
//! Five entry paths (continuous observations, discrete observations,
//! single medication order, medication order set, diagnostic report) share
//! one post-processing rule: encounter boundaries are appended as break
//! points after the data, and never injected into an empty series.

use crate::error::{Error, Result};
use crate::observation_set::ObservationSet;
use crate::orders::{administrations_for, MedicationOrderSet};
use crate::source::ClinicalSource;
use flowsheet_models::{
    Bounds, DiagnosticReport, Encounter, Interpretation, LabeledSeries, MedicationOrder,
    SeriesPoint,
};
use std::collections::BTreeMap;
use tracing::warn;

/// The dose-over-time line and the administration marker series for one
/// order, aligned point for point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSeriesPair {
    pub dose: LabeledSeries,
    pub markers: LabeledSeries,
}

/// Continuous path: one series from one quantitative observation set.
///
/// Point order is the set's own order; a member without a quantity becomes
/// a break point, interrupting the line. Members must agree on the normal
/// range when they carry one.
pub fn continuous_series(
    set: &ObservationSet,
    encounters: &[Encounter],
) -> Result<LabeledSeries> {
    let mut points = Vec::with_capacity(set.len());
    for observation in set.observations() {
        let Some(at) = observation.effective else {
            warn!(label = %set.label, "skipping observation without a timestamp");
            continue;
        };
        points.push(match observation.value() {
            Some(value) => SeriesPoint::value(at, value),
            None => SeriesPoint::break_at(at),
        });
    }

    let normal_bounds = consistent_normal_bounds(set)?;
    append_encounter_breaks(&mut points, encounters);

    Ok(LabeledSeries::new(
        set.label.clone(),
        set.unit().map(str::to_string),
        points,
        normal_bounds,
    ))
}

/// The single consistent normal range across members, if any.
fn consistent_normal_bounds(set: &ObservationSet) -> Result<Option<Bounds>> {
    let mut bounds: Option<Bounds> = None;
    for observation in set.observations() {
        let Some(range) = observation.reference_range else {
            continue;
        };
        let candidate = Bounds::new(range.low, range.high);
        match bounds {
            None => bounds = Some(candidate),
            Some(existing) if existing != candidate => return Err(Error::InconsistentRange),
            Some(_) => {}
        }
    }
    Ok(bounds)
}

/// Discrete path: one series across all sets at a caller-supplied fixed y.
///
/// Points follow set-then-member input order, not timestamp order.
pub fn discrete_series(
    sets: &[ObservationSet],
    fixed_y: f64,
    label: impl Into<String>,
    encounters: &[Encounter],
) -> LabeledSeries {
    let mut points = Vec::new();
    for set in sets {
        for observation in set.observations() {
            let Some(at) = observation.effective else {
                warn!(label = %set.label, "skipping observation without a timestamp");
                continue;
            };
            points.push(SeriesPoint::value(at, fixed_y));
        }
    }
    append_encounter_breaks(&mut points, encounters);
    LabeledSeries::new(label, None, points, None)
}

/// Single-order path: the dose-over-time line plus the aligned marker
/// series over every administration.
///
/// A `fixed_y` override replaces every dose with the constant; the series
/// then represents presence rather than dosage and carries no unit.
pub async fn order_series(
    order: &MedicationOrder,
    fixed_y: Option<f64>,
    source: &dyn ClinicalSource,
    encounters: &[Encounter],
) -> Result<OrderSeriesPair> {
    let administrations = administrations_for(order, source).await?;

    let mut points = Vec::with_capacity(administrations.len());
    for administration in administrations.iter() {
        let y = fixed_y.unwrap_or(administration.dose);
        points.push(SeriesPoint::value(administration.at, y));
    }
    append_encounter_breaks(&mut points, encounters);

    let unit = match fixed_y {
        Some(_) => None,
        None => administrations.unit().map(str::to_string),
    };
    let dose = LabeledSeries::new(order.label.clone(), unit, points, None);
    let markers = dose.clone();
    Ok(OrderSeriesPair { dose, markers })
}

/// Order-set path: all member administrations merged timestamp-ascending,
/// label/unit/bounds from the aggregate.
pub fn order_set_series(set: &MedicationOrderSet, encounters: &[Encounter]) -> LabeledSeries {
    let mut points: Vec<SeriesPoint> = set
        .administrations()
        .iter()
        .map(|administration| SeriesPoint::value(administration.at, administration.dose))
        .collect();
    append_encounter_breaks(&mut points, encounters);
    LabeledSeries::new(
        set.label().to_string(),
        set.unit().map(str::to_string),
        points,
        None,
    )
}

/// Report path: one series per distinct interpretation category present,
/// each at its externally supplied y value.
///
/// Categories follow report-then-result input order; a category missing
/// from the supplied map is skipped.
pub fn report_series(
    reports: &[DiagnosticReport],
    category_y: &BTreeMap<Interpretation, f64>,
    encounters: &[Encounter],
) -> Vec<LabeledSeries> {
    let mut categories: Vec<Interpretation> = Vec::new();
    for report in reports {
        for result in &report.results {
            if let Some(category) = result.interpretation {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
    }

    let mut series = Vec::with_capacity(categories.len());
    for category in categories {
        let Some(&y) = category_y.get(&category) else {
            warn!(category = category.code(), "no y value supplied for category");
            continue;
        };
        let mut points = Vec::new();
        for report in reports {
            for result in &report.results {
                if result.interpretation != Some(category) {
                    continue;
                }
                let Some(at) = result.effective.or(report.effective) else {
                    warn!(report_id = %report.id, "skipping report result without a timestamp");
                    continue;
                };
                points.push(SeriesPoint::value(at, y));
            }
        }
        append_encounter_breaks(&mut points, encounters);
        series.push(LabeledSeries::new(category.label(), None, points, None));
    }
    series
}

/// Append each encounter's start and end as break points, in ascending
/// encounter order, strictly after the data. An empty base series stays
/// empty: no phantom markers without real data.
fn append_encounter_breaks(points: &mut Vec<SeriesPoint>, encounters: &[Encounter]) {
    if points.is_empty() || encounters.is_empty() {
        return;
    }
    let mut ordered: Vec<Encounter> = encounters.to_vec();
    ordered.sort_by_key(|encounter| encounter.start);
    for encounter in ordered {
        points.push(SeriesPoint::break_at(encounter.start));
        points.push(SeriesPoint::break_at(encounter.end));
    }
}
