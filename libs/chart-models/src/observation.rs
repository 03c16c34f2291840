//! Observations and their value/interpretation model

use crate::codes::CodedConcept;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quantity comparator, when the raw value is an inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
}

/// A measured quantity, copied verbatim from the raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quantity {
    pub value: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparator: Option<Comparator>,
}

/// A complete low/high normal range.
///
/// Only populated when exactly one unambiguous pair exists on the record;
/// partial or multiple ranges are dropped at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
}

/// Recognized subset of the v3 ObservationInterpretation value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpretation {
    Normal,
    Abnormal,
    High,
    Low,
    CriticalHigh,
    CriticalLow,
    Susceptible,
    Intermediate,
    Resistant,
}

impl Interpretation {
    /// Decode a code from the interpretation value set. Unrecognized codes
    /// yield `None`; the caller decides whether that is an error.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(Self::Normal),
            "A" => Some(Self::Abnormal),
            "H" => Some(Self::High),
            "L" => Some(Self::Low),
            "HH" => Some(Self::CriticalHigh),
            "LL" => Some(Self::CriticalLow),
            "S" => Some(Self::Susceptible),
            "I" => Some(Self::Intermediate),
            "R" => Some(Self::Resistant),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Normal => "N",
            Self::Abnormal => "A",
            Self::High => "H",
            Self::Low => "L",
            Self::CriticalHigh => "HH",
            Self::CriticalLow => "LL",
            Self::Susceptible => "S",
            Self::Intermediate => "I",
            Self::Resistant => "R",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Abnormal => "Abnormal",
            Self::High => "High",
            Self::Low => "Low",
            Self::CriticalHigh => "Critical high",
            Self::CriticalLow => "Critical low",
            Self::Susceptible => "Susceptible",
            Self::Intermediate => "Intermediate",
            Self::Resistant => "Resistant",
        }
    }
}

/// One discrete clinical measurement or qualitative finding.
///
/// Immutable after construction by the ingest crate, which guarantees the
/// record invariants: at least one concept, a label, and at least one of
/// {quantity, qualitative, interpretation, non-empty components}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub concepts: Vec<CodedConcept>,

    pub label: String,

    /// Clinically effective instant; `None` when the record carried neither
    /// an effective nor an issued time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualitative: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Interpretation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<ReferenceRange>,

    /// Nested component observations, each parsed with the same rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Observation>,
}

impl Observation {
    /// Numeric value, when the observation carries a quantity.
    pub fn value(&self) -> Option<f64> {
        self.quantity.as_ref().map(|q| q.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpretation_codes_round_trip() {
        for code in ["N", "A", "H", "L", "HH", "LL", "S", "I", "R"] {
            let interp = Interpretation::from_code(code).unwrap();
            assert_eq!(interp.code(), code);
        }
    }

    #[test]
    fn unknown_interpretation_code_is_none() {
        assert!(Interpretation::from_code("W").is_none());
    }
}
