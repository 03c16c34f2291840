//! Diagnostic reports (microbiology)

use crate::codes::MicrobioCode;
use crate::observation::Observation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A diagnostic report: a microbiology concept plus its result observations.
///
/// The report path plots results by interpretation category (susceptible,
/// intermediate, resistant, ...), so results are kept as full observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub id: String,
    pub code: MicrobioCode,
    pub label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<Observation>,
}
