//! Medication orders and their administration history

use crate::codes::MedicationCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// One recorded administration of an ordered medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAdministration {
    pub at: DateTime<Utc>,
    pub dose: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Timestamp-ascending administration history for one order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MedicationAdministrationSet {
    administrations: Vec<MedicationAdministration>,
}

impl MedicationAdministrationSet {
    /// Build from raw administrations, sorting by timestamp.
    pub fn new(mut administrations: Vec<MedicationAdministration>) -> Self {
        administrations.sort_by_key(|a| a.at);
        Self { administrations }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MedicationAdministration> {
        self.administrations.iter()
    }

    pub fn len(&self) -> usize {
        self.administrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.administrations.is_empty()
    }

    pub fn min_dose(&self) -> Option<f64> {
        self.administrations.iter().map(|a| a.dose).fold(None, |min, d| {
            Some(min.map_or(d, |m: f64| m.min(d)))
        })
    }

    pub fn max_dose(&self) -> Option<f64> {
        self.administrations.iter().map(|a| a.dose).fold(None, |max, d| {
            Some(max.map_or(d, |m: f64| m.max(d)))
        })
    }

    pub fn first_at(&self) -> Option<DateTime<Utc>> {
        self.administrations.first().map(|a| a.at)
    }

    pub fn last_at(&self) -> Option<DateTime<Utc>> {
        self.administrations.last().map(|a| a.at)
    }

    /// First non-empty unit among members.
    pub fn unit(&self) -> Option<&str> {
        self.administrations
            .iter()
            .find_map(|a| a.unit.as_deref().filter(|u| !u.is_empty()))
    }

    pub fn first(&self) -> Option<&MedicationAdministration> {
        self.administrations.first()
    }

    pub fn last(&self) -> Option<&MedicationAdministration> {
        self.administrations.last()
    }
}

/// A medication order, with a lazily resolved administration history.
///
/// The order itself is immutable; the administration cell is populated at
/// most once by the series crate's memoizing accessor, so repeated chart
/// rebuilds for the same order instance never re-fetch.
#[derive(Debug)]
pub struct MedicationOrder {
    pub id: String,
    pub code: MedicationCode,
    pub label: String,
    administrations: OnceCell<MedicationAdministrationSet>,
}

impl MedicationOrder {
    pub fn new(id: impl Into<String>, code: MedicationCode) -> Self {
        let label = code.label().to_string();
        Self {
            id: id.into(),
            code,
            label,
            administrations: OnceCell::new(),
        }
    }

    /// The cached administration history, if it has been resolved.
    pub fn cached_administrations(&self) -> Option<&MedicationAdministrationSet> {
        self.administrations.get()
    }

    /// The cache cell. Exposed for the memoizing accessor only.
    pub fn administration_cell(&self) -> &OnceCell<MedicationAdministrationSet> {
        &self.administrations
    }
}

impl Clone for MedicationOrder {
    fn clone(&self) -> Self {
        let administrations = OnceCell::new();
        if let Some(set) = self.administrations.get() {
            // A populated cache clones populated; set() cannot fail on a
            // freshly created cell.
            let _ = administrations.set(set.clone());
        }
        Self {
            id: self.id.clone(),
            code: self.code.clone(),
            label: self.label.clone(),
            administrations,
        }
    }
}

impl PartialEq for MedicationOrder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.code == other.code && self.label == other.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1988, 3, day, 12, 0, 0).unwrap()
    }

    fn admin(day: u32, dose: f64) -> MedicationAdministration {
        MedicationAdministration {
            at: at(day),
            dose,
            unit: Some("mg".to_string()),
        }
    }

    #[test]
    fn set_sorts_by_timestamp() {
        let set = MedicationAdministrationSet::new(vec![admin(25, 100.0), admin(23, 50.0)]);
        assert_eq!(set.first_at(), Some(at(23)));
        assert_eq!(set.last_at(), Some(at(25)));
    }

    #[test]
    fn dose_bounds_cover_all_members() {
        let set = MedicationAdministrationSet::new(vec![
            admin(23, 50.0),
            admin(24, 75.0),
            admin(25, 100.0),
        ]);
        assert_eq!(set.min_dose(), Some(50.0));
        assert_eq!(set.max_dose(), Some(100.0));
    }

    #[test]
    fn empty_set_has_no_bounds() {
        let set = MedicationAdministrationSet::default();
        assert_eq!(set.min_dose(), None);
        assert_eq!(set.first_at(), None);
    }

    #[test]
    fn clone_carries_a_populated_cache() {
        let order = MedicationOrder::new("order-1", MedicationCode::resolve("11124").unwrap());
        order
            .administration_cell()
            .set(MedicationAdministrationSet::new(vec![admin(23, 50.0)]))
            .unwrap();
        let cloned = order.clone();
        assert_eq!(cloned.cached_administrations().unwrap().len(), 1);
    }
}
