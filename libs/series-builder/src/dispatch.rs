//! Axis dispatch
//!
//! The single entry point the chart layer drives: given a code group, a
//! requested style, and a date range, select exactly one construction path
//! and hand back a render-ready bundle. Group homogeneity is validated
//! before any fetch; cheap validation precedes expensive I/O.

use crate::builder::{
    continuous_series, discrete_series, order_series, order_set_series, report_series,
};
use crate::error::{Error, Result};
use crate::observation_set::ObservationSet;
use crate::orders::MedicationOrderSet;
use crate::source::{ClinicalSource, DateRange};
use flowsheet_models::{
    ChartStyle, CodeGroup, CodeKind, CodedConcept, Encounter, Interpretation, LabeledSeries,
    MedicationOrder,
};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Fixed y position for discrete (qualitative) series.
const DISCRETE_Y: f64 = 0.5;

/// One axis request from the chart layer.
#[derive(Debug, Clone)]
pub struct AxisRequest {
    pub concepts: Vec<CodedConcept>,
    pub label: String,
    pub style: ChartStyle,
    pub range: DateRange,
    pub encounters: Vec<Encounter>,
}

/// The render-ready result of one axis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBundle {
    pub label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub series: Vec<LabeledSeries>,
}

/// Resolve one axis: validate the group, fetch, and build.
///
/// Stateless per call; a caller superseding this request with a newer one
/// is responsible for discarding the stale result.
pub async fn resolve_axis_data(
    source: &dyn ClinicalSource,
    request: &AxisRequest,
) -> Result<SeriesBundle> {
    let group = CodeGroup::try_new(&request.concepts, request.label.clone(), request.style)?;
    debug!(label = %group.label(), kind = ?group.kind(), "resolving axis");

    match group.kind() {
        CodeKind::Lab => resolve_lab_axis(source, &group, request).await,
        CodeKind::Medication => match group.style() {
            ChartStyle::Step => resolve_medication_summary(source, &group, request).await,
            ChartStyle::Line => resolve_medication_detail(source, &group, request).await,
        },
        // Microbiology is always step-style, whatever was requested.
        CodeKind::Microbio => resolve_report_axis(source, &group, request).await,
    }
}

/// Lab axis: discrete when every set is uniformly qualitative, continuous
/// when every set is uniformly quantitative, an error otherwise.
async fn resolve_lab_axis(
    source: &dyn ClinicalSource,
    group: &CodeGroup,
    request: &AxisRequest,
) -> Result<SeriesBundle> {
    let sets = source
        .observations(group, &request.range)
        .await
        .map_err(Error::Source)?;

    let populated: Vec<&ObservationSet> = sets.iter().filter(|set| !set.is_empty()).collect();
    let all_qualitative = !populated.is_empty() && populated.iter().all(|s| s.all_qualitative());
    let all_quantitative = populated.iter().all(|s| s.all_quantitative());

    if all_qualitative {
        let series = discrete_series(&sets, DISCRETE_Y, group.label(), &request.encounters);
        return Ok(SeriesBundle {
            label: group.label().to_string(),
            unit: None,
            series: vec![series],
        });
    }
    if !all_quantitative {
        return Err(Error::MixedValueKind);
    }

    let series = sets
        .iter()
        .map(|set| continuous_series(set, &request.encounters))
        .collect::<Result<Vec<_>>>()?;
    let unit = sets.iter().find_map(|set| set.unit().map(str::to_string));
    Ok(SeriesBundle {
        label: group.label().to_string(),
        unit,
        series,
    })
}

/// Medication summary: orders grouped by code, one merged step series per
/// order set.
async fn resolve_medication_summary(
    source: &dyn ClinicalSource,
    group: &CodeGroup,
    request: &AxisRequest,
) -> Result<SeriesBundle> {
    let orders = source
        .medication_orders(group, &request.range)
        .await
        .map_err(Error::Source)?;

    // Group by medication code, preserving first-seen order.
    let mut grouped: Vec<(String, Vec<MedicationOrder>)> = Vec::new();
    for order in orders {
        let code = order.code.as_str().to_string();
        match grouped.iter_mut().find(|(c, _)| *c == code) {
            Some((_, members)) => members.push(order),
            None => grouped.push((code, vec![order])),
        }
    }

    let order_sets = try_join_all(
        grouped
            .into_iter()
            .map(|(_, members)| MedicationOrderSet::build(members, source)),
    )
    .await?;

    let unit = order_sets
        .iter()
        .find_map(|set| set.unit().map(str::to_string));
    let series = order_sets
        .iter()
        .map(|set| order_set_series(set, &request.encounters))
        .collect();
    Ok(SeriesBundle {
        label: group.label().to_string(),
        unit,
        series,
    })
}

/// Medication detail: per order, the dose line and its aligned markers,
/// administrations resolved concurrently across orders.
async fn resolve_medication_detail(
    source: &dyn ClinicalSource,
    group: &CodeGroup,
    request: &AxisRequest,
) -> Result<SeriesBundle> {
    let orders = source
        .medication_orders(group, &request.range)
        .await
        .map_err(Error::Source)?;

    let pairs = try_join_all(
        orders
            .iter()
            .map(|order| order_series(order, None, source, &request.encounters)),
    )
    .await?;

    let unit = pairs
        .iter()
        .find_map(|pair| pair.dose.unit.clone());
    let series = pairs
        .into_iter()
        .flat_map(|pair| [pair.dose, pair.markers])
        .collect();
    Ok(SeriesBundle {
        label: group.label().to_string(),
        unit,
        series,
    })
}

/// Microbiology axis: diagnostic reports plotted per interpretation
/// category, categories assigned ascending y slots in input order.
async fn resolve_report_axis(
    source: &dyn ClinicalSource,
    group: &CodeGroup,
    request: &AxisRequest,
) -> Result<SeriesBundle> {
    let reports = source
        .diagnostic_reports(group, &request.range)
        .await
        .map_err(Error::Source)?;

    let mut category_y: BTreeMap<Interpretation, f64> = BTreeMap::new();
    let mut next_slot = 0.0;
    for report in &reports {
        for result in &report.results {
            if let Some(category) = result.interpretation {
                category_y.entry(category).or_insert_with(|| {
                    let slot = next_slot;
                    next_slot += 1.0;
                    slot
                });
            }
        }
    }

    let series = report_series(&reports, &category_y, &request.encounters);
    Ok(SeriesBundle {
        label: group.label().to_string(),
        unit: None,
        series,
    })
}
