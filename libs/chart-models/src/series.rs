//! Render-ready labeled time series
//!
//! The in-memory model keeps the line-break semantics in a typed
//! `PointValue` sum instead of overloading the numeric domain with nulls.
//! Serialization still emits the renderer-facing aligned `x`/`y` arrays,
//! with breaks as JSON `null`.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A point's value: a plotted number, or an intentional line break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointValue {
    Value(f64),
    Break,
}

impl PointValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Break => None,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Self::Break)
    }
}

/// One timestamped point of a labeled series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub at: DateTime<Utc>,
    pub value: PointValue,
}

impl SeriesPoint {
    pub fn value(at: DateTime<Utc>, value: f64) -> Self {
        Self {
            at,
            value: PointValue::Value(value),
        }
    }

    pub fn break_at(at: DateTime<Utc>) -> Self {
        Self {
            at,
            value: PointValue::Break,
        }
    }
}

/// A closed `[low, high]` interval on the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Smallest interval covering both `self` and `other`.
    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            low: self.low.min(other.low),
            high: self.high.max(other.high),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// A bracketing clinical visit interval.
///
/// Used only to inject break markers at its start and end; never a data
/// point of clinical significance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The canonical render-ready time series.
///
/// `display_bounds` always contains every finite point value and, when
/// present, `normal_bounds`; both are fixed at construction and the series
/// is never mutated after being handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    pub label: String,
    pub unit: Option<String>,
    pub points: Vec<SeriesPoint>,
    pub normal_bounds: Option<Bounds>,
    pub display_bounds: Bounds,
}

impl LabeledSeries {
    /// Build a series, deriving display bounds from the finite point
    /// values and any normal bounds. An empty series gets `[0, 0]`.
    pub fn new(
        label: impl Into<String>,
        unit: Option<String>,
        points: Vec<SeriesPoint>,
        normal_bounds: Option<Bounds>,
    ) -> Self {
        let data_bounds = points
            .iter()
            .filter_map(|p| p.value.as_f64())
            .fold(None, |acc: Option<Bounds>, v| {
                Some(match acc {
                    None => Bounds::new(v, v),
                    Some(b) => b.union(Bounds::new(v, v)),
                })
            });

        let display_bounds = match (data_bounds, normal_bounds) {
            (Some(d), Some(n)) => d.union(n),
            (Some(d), None) => d,
            (None, Some(n)) => n,
            (None, None) => Bounds::new(0.0, 0.0),
        };

        Self {
            label: label.into(),
            unit,
            points,
            normal_bounds,
            display_bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Timestamps, in point order.
    pub fn x_values(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.at).collect()
    }

    /// Values, in point order, with breaks as `None`.
    pub fn y_values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value.as_f64()).collect()
    }
}

impl Serialize for LabeledSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut field_count = 4;
        if self.unit.is_some() {
            field_count += 1;
        }
        if self.normal_bounds.is_some() {
            field_count += 1;
        }

        let mut state = serializer.serialize_struct("LabeledSeries", field_count)?;
        state.serialize_field("label", &self.label)?;
        if let Some(unit) = &self.unit {
            state.serialize_field("unit", unit)?;
        }
        state.serialize_field("x", &self.x_values())?;
        state.serialize_field("y", &self.y_values())?;
        if let Some(normal) = &self.normal_bounds {
            state.serialize_field("yNormalBounds", &[normal.low, normal.high])?;
        }
        state.serialize_field(
            "yDisplayBounds",
            &[self.display_bounds.low, self.display_bounds.high],
        )?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1988, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn display_bounds_cover_data() {
        let series = LabeledSeries::new(
            "Glucose",
            Some("mg/dL".to_string()),
            vec![SeriesPoint::value(at(23), 1.0), SeriesPoint::value(at(24), 100.0)],
            None,
        );
        assert_eq!(series.display_bounds, Bounds::new(1.0, 100.0));
    }

    #[test]
    fn display_bounds_cover_normal_bounds_too() {
        let series = LabeledSeries::new(
            "Glucose",
            None,
            vec![SeriesPoint::value(at(23), 10.0)],
            Some(Bounds::new(1.0, 90.0)),
        );
        assert_eq!(series.display_bounds, Bounds::new(1.0, 90.0));
    }

    #[test]
    fn breaks_do_not_affect_bounds() {
        let series = LabeledSeries::new(
            "Glucose",
            None,
            vec![SeriesPoint::value(at(23), 5.0), SeriesPoint::break_at(at(24))],
            None,
        );
        assert_eq!(series.display_bounds, Bounds::new(5.0, 5.0));
    }

    #[test]
    fn empty_series_gets_zero_bounds() {
        let series = LabeledSeries::new("Empty", None, Vec::new(), None);
        assert_eq!(series.display_bounds, Bounds::new(0.0, 0.0));
    }

    #[test]
    fn serializes_to_renderer_shape() {
        let series = LabeledSeries::new(
            "Glucose",
            Some("mg/dL".to_string()),
            vec![SeriesPoint::value(at(23), 1.0), SeriesPoint::break_at(at(24))],
            Some(Bounds::new(1.0, 90.0)),
        );
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["label"], "Glucose");
        assert_eq!(json["y"][0], 1.0);
        assert!(json["y"][1].is_null());
        assert_eq!(json["yNormalBounds"][0], 1.0);
        assert_eq!(json["yDisplayBounds"][1], 90.0);
        assert_eq!(json["x"].as_array().unwrap().len(), 2);
    }
}
