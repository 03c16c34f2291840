//! Diagnostic report parsing

use crate::error::{Error, Result};
use crate::observation::parse_observation;
use crate::raw::RawDiagnosticReport;
use flowsheet_models::{DiagnosticReport, MicrobioCode, MICROBIO_SYSTEM};
use tracing::warn;

/// Parse one raw diagnostic report.
///
/// The report must carry a microbiology coding; its result observations are
/// parsed with the standard observation rules, and a bad result is skipped
/// rather than failing the report.
pub fn parse_diagnostic_report(record: &RawDiagnosticReport) -> Result<DiagnosticReport> {
    let id = record
        .id
        .as_deref()
        .ok_or_else(|| Error::InvalidRecord("diagnostic report without an id".to_string()))?;

    let codings = record
        .code
        .as_ref()
        .map(|concept| concept.coding.as_slice())
        .unwrap_or_default();
    let code = codings
        .iter()
        .filter(|coding| coding.system.as_deref() == Some(MICROBIO_SYSTEM))
        .find_map(|coding| {
            let raw = coding.code.as_deref()?;
            let display = coding.display.as_deref().unwrap_or(raw);
            Some(MicrobioCode::new(raw, display))
        })
        .ok_or_else(|| Error::InvalidRecord("no usable code".to_string()))?;

    let effective = record.effective_date_time.or(record.issued);

    let results = record
        .result
        .iter()
        .filter_map(|result| match parse_observation(result) {
            Ok(observation) => Some(observation),
            Err(err) => {
                warn!(report_id = id, %err, "skipping unusable report result");
                None
            }
        })
        .collect();

    let label = code.display.clone();
    Ok(DiagnosticReport {
        id: id.to_string(),
        code,
        label,
        effective,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawCodeableConcept, RawCoding, RawObservation, RawQuantity};
    use flowsheet_models::LAB_SYSTEM;

    fn report_coding() -> RawCodeableConcept {
        RawCodeableConcept {
            coding: vec![RawCoding {
                system: Some(MICROBIO_SYSTEM.to_string()),
                code: Some("409822003".to_string()),
                display: Some("Pseudomonas aeruginosa".to_string()),
            }],
            text: None,
        }
    }

    fn lab_result(code: &str, value: Option<f64>) -> RawObservation {
        RawObservation {
            code: Some(RawCodeableConcept {
                coding: vec![RawCoding {
                    system: Some(LAB_SYSTEM.to_string()),
                    code: Some(code.to_string()),
                    display: None,
                }],
                text: None,
            }),
            value_quantity: value.map(|v| RawQuantity {
                value: Some(v),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn parses_report_and_skips_bad_results() {
        let record = RawDiagnosticReport {
            id: Some("report-1".to_string()),
            code: Some(report_coding()),
            result: vec![lab_result("718-7", Some(12.0)), lab_result("718-7", None)],
            ..Default::default()
        };
        let parsed = parse_diagnostic_report(&record).unwrap();
        assert_eq!(parsed.label, "Pseudomonas aeruginosa");
        assert_eq!(parsed.results.len(), 1);
    }

    #[test]
    fn report_without_microbio_code_fails() {
        let record = RawDiagnosticReport {
            id: Some("report-1".to_string()),
            ..Default::default()
        };
        assert!(parse_diagnostic_report(&record).is_err());
    }
}
