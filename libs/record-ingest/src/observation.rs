//! Observation record parsing
//!
//! One raw record in, one validated `Observation` out, or a per-record
//! error. Code resolution prefers the microbiology system (codes taken
//! verbatim, label from the coding's display text); otherwise codings are
//! filtered to recognized lab codes. Mixing systems inside one record is
//! tolerated whenever a recognized subset remains.

use crate::error::{Error, Result};
use crate::raw::{RawObservation, RawQuantity, RawReferenceRange};
use chrono::{DateTime, Utc};
use flowsheet_models::{
    CodedConcept, Comparator, Interpretation, Observation, Quantity, ReferenceRange, LabCode,
    INTERPRETATION_SYSTEM, LAB_SYSTEM, MICROBIO_SYSTEM,
};
use tracing::{debug, warn};

/// Parse a batch, isolating failures at record granularity.
pub fn parse_observations(records: &[RawObservation]) -> Vec<Result<Observation>> {
    records
        .iter()
        .map(|record| {
            let parsed = parse_observation(record);
            if let Err(err) = &parsed {
                warn!(record_id = record.id.as_deref(), %err, "skipping unusable observation record");
            }
            parsed
        })
        .collect()
}

/// Parse one raw observation record.
pub fn parse_observation(record: &RawObservation) -> Result<Observation> {
    parse_with_inherited_time(record, None)
}

fn parse_with_inherited_time(
    record: &RawObservation,
    parent_effective: Option<DateTime<Utc>>,
) -> Result<Observation> {
    let (concepts, label) = resolve_concepts(record)?;

    // Effective time wins over issued time; components fall back to the
    // parent's timestamp only when they carry neither.
    let effective = record
        .effective_date_time
        .or(record.issued)
        .or(parent_effective);

    let quantity = record.value_quantity.as_ref().and_then(decode_quantity);
    let qualitative = record
        .value_codeable_concept
        .as_ref()
        .and_then(|concept| concept.text.clone());
    let interpretation = decode_interpretation(record)?;
    let reference_range = decode_reference_range(&record.reference_range);

    let components = record
        .component
        .iter()
        .map(|component| parse_with_inherited_time(component, effective))
        .collect::<Result<Vec<_>>>()?;

    if quantity.is_none() && qualitative.is_none() && interpretation.is_none() && components.is_empty()
    {
        return Err(Error::EmptyObservation);
    }

    Ok(Observation {
        concepts,
        label,
        effective,
        quantity,
        qualitative,
        interpretation,
        reference_range,
        components,
    })
}

/// Resolve the record's clinical codes and display label.
///
/// Microbiology codings are taken verbatim and the label comes from the
/// coding's display text. Otherwise codings are filtered to the recognized
/// lab table and the canonical label wins. The record's own text is never
/// cross-checked against the canonical label.
fn resolve_concepts(record: &RawObservation) -> Result<(Vec<CodedConcept>, String)> {
    let codings = record
        .code
        .as_ref()
        .map(|concept| concept.coding.as_slice())
        .unwrap_or_default();

    let microbio: Vec<CodedConcept> = codings
        .iter()
        .filter(|coding| coding.system.as_deref() == Some(MICROBIO_SYSTEM))
        .filter_map(|coding| {
            let code = coding.code.as_deref()?;
            let display = coding.display.as_deref().unwrap_or(code);
            Some(CodedConcept::new(code, display, MICROBIO_SYSTEM))
        })
        .collect();
    if let Some(first) = microbio.first() {
        return Ok((microbio.clone(), first.label.clone()));
    }

    let lab: Vec<CodedConcept> = codings
        .iter()
        .filter(|coding| coding.system.as_deref() == Some(LAB_SYSTEM))
        .filter_map(|coding| {
            let code = coding.code.as_deref()?;
            match LabCode::resolve(code) {
                Some(resolved) => Some(CodedConcept::new(code, resolved.label(), LAB_SYSTEM)),
                None => {
                    debug!(code, "dropping unrecognized lab coding");
                    None
                }
            }
        })
        .collect();
    if let Some(first) = lab.first() {
        if codings.len() > lab.len() {
            debug!(
                record_id = record.id.as_deref(),
                "record mixes coding systems; keeping recognized subset"
            );
        }
        return Ok((lab.clone(), first.label.clone()));
    }

    Err(Error::InvalidRecord("no usable code".to_string()))
}

fn decode_quantity(raw: &RawQuantity) -> Option<Quantity> {
    let Some(value) = raw.value else {
        debug!("dropping quantity without a numeric value");
        return None;
    };
    Some(Quantity {
        value,
        unit: raw.unit.clone(),
        comparator: raw.comparator.as_deref().and_then(decode_comparator),
    })
}

fn decode_comparator(raw: &str) -> Option<Comparator> {
    match raw {
        "<" => Some(Comparator::Lt),
        "<=" => Some(Comparator::Le),
        ">=" => Some(Comparator::Ge),
        ">" => Some(Comparator::Gt),
        other => {
            debug!(comparator = other, "dropping unrecognized comparator");
            None
        }
    }
}

/// Decode interpretation flags against the recognized value set.
///
/// Codings from other value sets are ignored; an unrecognized code from the
/// interpretation value set itself is an error.
fn decode_interpretation(record: &RawObservation) -> Result<Option<Interpretation>> {
    for concept in &record.interpretation {
        for coding in &concept.coding {
            if coding.system.as_deref() != Some(INTERPRETATION_SYSTEM) {
                continue;
            }
            let Some(code) = coding.code.as_deref() else {
                continue;
            };
            return Interpretation::from_code(code)
                .map(Some)
                .ok_or_else(|| Error::UnsupportedInterpretation(code.to_string()));
        }
    }
    Ok(None)
}

/// A normal range is populated only when exactly one complete low/high
/// entry exists. Multiple or partial ranges favor omission over guessing.
fn decode_reference_range(ranges: &[RawReferenceRange]) -> Option<ReferenceRange> {
    match ranges {
        [only] => match (
            only.low.as_ref().and_then(|q| q.value),
            only.high.as_ref().and_then(|q| q.value),
        ) {
            (Some(low), Some(high)) => Some(ReferenceRange { low, high }),
            _ => {
                debug!("dropping partial reference range");
                None
            }
        },
        [] => None,
        _ => {
            debug!(count = ranges.len(), "dropping ambiguous reference ranges");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawCodeableConcept, RawCoding};
    use chrono::TimeZone;

    fn coding(system: &str, code: &str, display: Option<&str>) -> RawCoding {
        RawCoding {
            system: Some(system.to_string()),
            code: Some(code.to_string()),
            display: display.map(|d| d.to_string()),
        }
    }

    fn lab_record(code: &str, value: f64) -> RawObservation {
        RawObservation {
            code: Some(RawCodeableConcept {
                coding: vec![coding(LAB_SYSTEM, code, None)],
                text: None,
            }),
            effective_date_time: Some(Utc.with_ymd_and_hms(1988, 3, 23, 8, 0, 0).unwrap()),
            value_quantity: Some(RawQuantity {
                value: Some(value),
                unit: Some("g/dL".to_string()),
                comparator: None,
            }),
            ..Default::default()
        }
    }

    fn interpretation_concept(system: &str, code: &str) -> RawCodeableConcept {
        RawCodeableConcept {
            coding: vec![coding(system, code, None)],
            text: None,
        }
    }

    #[test]
    fn parses_recognized_lab_record() {
        let parsed = parse_observation(&lab_record("718-7", 12.5)).unwrap();
        assert_eq!(parsed.label, "Hemoglobin");
        assert_eq!(parsed.value(), Some(12.5));
        assert_eq!(parsed.concepts.len(), 1);
    }

    #[test]
    fn microbio_codes_win_and_keep_display_text() {
        let mut record = lab_record("718-7", 1.0);
        record.code = Some(RawCodeableConcept {
            coding: vec![
                coding(MICROBIO_SYSTEM, "409822003", Some("Pseudomonas aeruginosa")),
                coding(LAB_SYSTEM, "718-7", None),
            ],
            text: None,
        });
        let parsed = parse_observation(&record).unwrap();
        assert_eq!(parsed.label, "Pseudomonas aeruginosa");
        assert_eq!(parsed.concepts[0].system, MICROBIO_SYSTEM);
    }

    #[test]
    fn unrecognized_codes_from_both_paths_fail() {
        let mut record = lab_record("0000-0", 1.0);
        record.code = Some(RawCodeableConcept {
            coding: vec![coding(LAB_SYSTEM, "0000-0", None)],
            text: None,
        });
        let err = parse_observation(&record).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
    }

    #[test]
    fn mixed_systems_are_tolerated_when_a_recognized_subset_exists() {
        let mut record = lab_record("2345-7", 95.0);
        record.code = Some(RawCodeableConcept {
            coding: vec![
                coding("urn:example:local", "XYZ", None),
                coding(LAB_SYSTEM, "2345-7", None),
            ],
            text: None,
        });
        let parsed = parse_observation(&record).unwrap();
        assert_eq!(parsed.label, "Glucose");
        assert_eq!(parsed.concepts.len(), 1);
    }

    #[test]
    fn timestamp_falls_back_to_issued() {
        let issued = Utc.with_ymd_and_hms(1988, 3, 24, 9, 0, 0).unwrap();
        let mut record = lab_record("718-7", 12.0);
        record.effective_date_time = None;
        record.issued = Some(issued);
        let parsed = parse_observation(&record).unwrap();
        assert_eq!(parsed.effective, Some(issued));
    }

    #[test]
    fn record_without_any_time_parses_with_none() {
        let mut record = lab_record("718-7", 12.0);
        record.effective_date_time = None;
        record.issued = None;
        let parsed = parse_observation(&record).unwrap();
        assert_eq!(parsed.effective, None);
    }

    #[test]
    fn empty_record_fails() {
        let mut record = lab_record("718-7", 12.0);
        record.value_quantity = None;
        let err = parse_observation(&record).unwrap_err();
        assert!(matches!(err, Error::EmptyObservation));
    }

    #[test]
    fn unsupported_interpretation_code_fails() {
        let mut record = lab_record("718-7", 12.0);
        record.interpretation = vec![interpretation_concept(INTERPRETATION_SYSTEM, "W")];
        let err = parse_observation(&record).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInterpretation(code) if code == "W"));
    }

    #[test]
    fn foreign_value_set_interpretations_are_ignored() {
        let mut record = lab_record("718-7", 12.0);
        record.interpretation = vec![interpretation_concept("urn:example:flags", "WEIRD")];
        let parsed = parse_observation(&record).unwrap();
        assert_eq!(parsed.interpretation, None);
    }

    #[test]
    fn recognized_interpretation_is_decoded() {
        let mut record = lab_record("718-7", 12.0);
        record.interpretation = vec![interpretation_concept(INTERPRETATION_SYSTEM, "HH")];
        let parsed = parse_observation(&record).unwrap();
        assert_eq!(parsed.interpretation, Some(Interpretation::CriticalHigh));
    }

    #[test]
    fn single_complete_reference_range_is_kept() {
        let mut record = lab_record("718-7", 12.0);
        record.reference_range = vec![RawReferenceRange {
            low: Some(RawQuantity {
                value: Some(1.0),
                ..Default::default()
            }),
            high: Some(RawQuantity {
                value: Some(90.0),
                ..Default::default()
            }),
        }];
        let parsed = parse_observation(&record).unwrap();
        assert_eq!(parsed.reference_range, Some(ReferenceRange { low: 1.0, high: 90.0 }));
    }

    #[test]
    fn partial_or_multiple_reference_ranges_are_dropped() {
        let partial = RawReferenceRange {
            low: Some(RawQuantity {
                value: Some(1.0),
                ..Default::default()
            }),
            high: None,
        };

        let mut record = lab_record("718-7", 12.0);
        record.reference_range = vec![partial.clone()];
        assert_eq!(parse_observation(&record).unwrap().reference_range, None);

        record.reference_range = vec![partial.clone(), partial];
        assert_eq!(parse_observation(&record).unwrap().reference_range, None);
    }

    #[test]
    fn components_are_parsed_recursively() {
        let own_time = Utc.with_ymd_and_hms(1988, 3, 25, 10, 0, 0).unwrap();
        let mut with_own_time = lab_record("2823-3", 4.1);
        with_own_time.effective_date_time = Some(own_time);
        let mut without_time = lab_record("2951-2", 139.0);
        without_time.effective_date_time = None;

        let mut parent = lab_record("718-7", 12.0);
        parent.component = vec![with_own_time, without_time];
        let parsed = parse_observation(&parent).unwrap();

        assert_eq!(parsed.components.len(), 2);
        assert_eq!(parsed.components[0].effective, Some(own_time));
        assert_eq!(parsed.components[1].effective, parent.effective_date_time);
    }

    #[test]
    fn batch_parsing_isolates_bad_records() {
        let good = lab_record("718-7", 12.0);
        let mut bad = lab_record("718-7", 12.0);
        bad.value_quantity = None;

        let results = parse_observations(&[good, bad]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
