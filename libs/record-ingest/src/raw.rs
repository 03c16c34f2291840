//! Raw-record serde models
//!
//! Mirrors the subset of the wire shapes this pipeline consumes. Every
//! field a real-world feed may omit is optional here; the parse functions
//! decide which omissions are fatal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One coding entry: system URI, code, and optional display text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A codeable concept: codings plus free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<RawCoding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A measured quantity as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparator: Option<String>,
}

/// One reference-range entry; either bound may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReferenceRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<RawQuantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<RawQuantity>,
}

/// A raw observation record, including nested components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<RawCodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<RawQuantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<RawCodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<RawCodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_range: Vec<RawReferenceRange>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<RawObservation>,
}

/// A raw medication order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedicationOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<RawCodeableConcept>,
}

/// Dosage details of an administration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose: Option<RawQuantity>,
}

/// A raw medication administration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedicationAdministration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Id of the medication order this administration fulfills.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<RawDosage>,
}

/// A raw diagnostic report with inlined result observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiagnosticReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<RawCodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<RawObservation>,
}

/// A bundle of raw records, as delivered by the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBundle {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<RawObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medication_orders: Vec<RawMedicationOrder>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medication_administrations: Vec<RawMedicationAdministration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostic_reports: Vec<RawDiagnosticReport>,
}
