//! Observation aggregation
//!
//! Groups parsed observations for one clinical concept, annotating each
//! member with derived interpretation metadata. Construction is
//! order-preserving and cannot fail; chartability is decided downstream.

use flowsheet_models::{Interpretation, Observation};
use serde::{Deserialize, Serialize};

/// An observation plus its effective interpretation flag.
///
/// The explicit flag from the record wins; otherwise the flag is derived
/// from the quantity against the reference range, when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedObservation {
    pub observation: Observation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<Interpretation>,
}

impl AnnotatedObservation {
    fn annotate(observation: Observation) -> Self {
        let flag = observation.interpretation.or_else(|| derived_flag(&observation));
        Self { observation, flag }
    }
}

fn derived_flag(observation: &Observation) -> Option<Interpretation> {
    let value = observation.value()?;
    let range = observation.reference_range?;
    Some(if value < range.low {
        Interpretation::Low
    } else if value > range.high {
        Interpretation::High
    } else {
        Interpretation::Normal
    })
}

/// A time-ordered collection of observations for one clinical concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationSet {
    pub label: String,
    members: Vec<AnnotatedObservation>,
}

impl ObservationSet {
    /// Build a set from parsed observations, preserving input order.
    pub fn new(label: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            label: label.into(),
            members: observations
                .into_iter()
                .map(AnnotatedObservation::annotate)
                .collect(),
        }
    }

    pub fn members(&self) -> &[AnnotatedObservation] {
        &self.members
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.members.iter().map(|m| &m.observation)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True only if every member carries a qualitative result and none
    /// carries a quantity.
    pub fn all_qualitative(&self) -> bool {
        !self.members.is_empty()
            && self.members.iter().all(|m| {
                m.observation.qualitative.is_some() && m.observation.quantity.is_none()
            })
    }

    /// True only if every member carries a quantity.
    pub fn all_quantitative(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(|m| m.observation.quantity.is_some())
    }

    /// First quantity unit among members.
    pub fn unit(&self) -> Option<&str> {
        self.members
            .iter()
            .find_map(|m| m.observation.quantity.as_ref().and_then(|q| q.unit.as_deref()))
    }
}
