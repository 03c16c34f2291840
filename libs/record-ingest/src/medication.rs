//! Medication order and administration parsing

use crate::error::{Error, Result};
use crate::raw::{RawMedicationAdministration, RawMedicationOrder};
use flowsheet_models::{MedicationAdministration, MedicationCode, MedicationOrder, MEDICATION_SYSTEM};
use tracing::debug;

/// Parse one raw medication order.
///
/// The order must carry an id and at least one recognized medication code;
/// codings from other systems are ignored.
pub fn parse_medication_order(record: &RawMedicationOrder) -> Result<MedicationOrder> {
    let id = record
        .id
        .as_deref()
        .ok_or_else(|| Error::InvalidRecord("medication order without an id".to_string()))?;

    let codings = record
        .medication_codeable_concept
        .as_ref()
        .map(|concept| concept.coding.as_slice())
        .unwrap_or_default();

    let code = codings
        .iter()
        .filter(|coding| coding.system.as_deref() == Some(MEDICATION_SYSTEM))
        .find_map(|coding| {
            let raw = coding.code.as_deref()?;
            let resolved = MedicationCode::resolve(raw);
            if resolved.is_none() {
                debug!(code = raw, "dropping unrecognized medication coding");
            }
            resolved
        })
        .ok_or_else(|| Error::InvalidRecord("no usable medication code".to_string()))?;

    Ok(MedicationOrder::new(id, code))
}

/// Parse one raw administration record.
///
/// An administration without an effective time or a numeric dose cannot be
/// charted and fails as invalid.
pub fn parse_medication_administration(
    record: &RawMedicationAdministration,
) -> Result<MedicationAdministration> {
    let at = record.effective_date_time.ok_or_else(|| {
        Error::InvalidRecord("medication administration without an effective time".to_string())
    })?;

    let dose_quantity = record
        .dosage
        .as_ref()
        .and_then(|dosage| dosage.dose.as_ref())
        .ok_or_else(|| {
            Error::InvalidRecord("medication administration without a dose".to_string())
        })?;
    let dose = dose_quantity.value.ok_or_else(|| {
        Error::InvalidRecord("medication administration dose without a value".to_string())
    })?;

    Ok(MedicationAdministration {
        at,
        dose,
        unit: dose_quantity.unit.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawCodeableConcept, RawCoding, RawDosage, RawQuantity};
    use chrono::{TimeZone, Utc};

    fn order(code: &str) -> RawMedicationOrder {
        RawMedicationOrder {
            id: Some("order-1".to_string()),
            medication_codeable_concept: Some(RawCodeableConcept {
                coding: vec![RawCoding {
                    system: Some(MEDICATION_SYSTEM.to_string()),
                    code: Some(code.to_string()),
                    display: None,
                }],
                text: None,
            }),
        }
    }

    #[test]
    fn parses_recognized_order() {
        let parsed = parse_medication_order(&order("11124")).unwrap();
        assert_eq!(parsed.id, "order-1");
        assert_eq!(parsed.label, "Vancomycin");
    }

    #[test]
    fn order_without_recognized_code_fails() {
        let err = parse_medication_order(&order("99999")).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
    }

    #[test]
    fn order_without_id_fails() {
        let mut record = order("11124");
        record.id = None;
        assert!(parse_medication_order(&record).is_err());
    }

    #[test]
    fn parses_administration() {
        let record = RawMedicationAdministration {
            id: Some("admin-1".to_string()),
            request: Some("order-1".to_string()),
            effective_date_time: Some(Utc.with_ymd_and_hms(1988, 3, 23, 12, 0, 0).unwrap()),
            dosage: Some(RawDosage {
                dose: Some(RawQuantity {
                    value: Some(500.0),
                    unit: Some("mg".to_string()),
                    comparator: None,
                }),
            }),
        };
        let parsed = parse_medication_administration(&record).unwrap();
        assert_eq!(parsed.dose, 500.0);
        assert_eq!(parsed.unit.as_deref(), Some("mg"));
    }

    #[test]
    fn administration_without_dose_fails() {
        let record = RawMedicationAdministration {
            effective_date_time: Some(Utc.with_ymd_and_hms(1988, 3, 23, 12, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(parse_medication_administration(&record).is_err());
    }
}
