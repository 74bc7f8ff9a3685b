//! Measurement records and their grouping into time slices.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{FieldError, FieldResult};

/// Timestamp of a sample.
///
/// Keeps the caller's original label so results can be keyed by exactly the
/// string that was supplied, and the parsed UTC instant when the label is a
/// recognisable date/time.
///
/// Two times are equal when they name the same instant, whatever the label
/// spelling; unparsed labels compare as text. Dated times order before
/// unparsed labels.
#[derive(Debug, Clone)]
pub struct SampleTime {
    instant: Option<DateTime<Utc>>,
    label: String,
}

impl SampleTime {
    /// Parse a timestamp label, accepting RFC 3339, `YYYY-MM-DD HH:MM:SS`,
    /// `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`. Other labels order lexically.
    pub fn parse(label: impl Into<String>) -> Self {
        let label = label.into();
        let instant = parse_instant(label.trim());
        Self { instant, label }
    }

    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Some(instant),
            label: instant.to_rfc3339(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.instant
    }

    fn key(&self) -> TimeKey<'_> {
        match self.instant {
            Some(instant) => TimeKey::Dated(instant),
            None => TimeKey::Label(&self.label),
        }
    }
}

/// Identity of a sample time. Variant order puts dated times first.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
enum TimeKey<'a> {
    Dated(DateTime<Utc>),
    Label(&'a str),
}

impl PartialEq for SampleTime {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SampleTime {}

impl Hash for SampleTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for SampleTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SampleTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl fmt::Display for SampleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl From<&str> for SampleTime {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl Serialize for SampleTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for SampleTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Spreadsheet headers sometimes arrive as bare numbers (e.g. years)
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTime {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawTime::deserialize(deserializer)? {
            RawTime::Text(s) => SampleTime::parse(s),
            RawTime::Number(n) => SampleTime::parse(n.to_string()),
        })
    }
}

/// A single measurement: a value at a coordinate at a sampled time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(alias = "sampled_at")]
    pub timestamp: SampleTime,
    pub value: f64,
}

impl MeasurementPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: impl Into<SampleTime>, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: timestamp.into(),
            value,
        }
    }

    /// Reject out-of-range coordinates and non-finite values.
    pub fn validate(&self) -> FieldResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(FieldError::invalid(
                "latitude",
                format!("{} is outside [-90, 90]", self.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(FieldError::invalid(
                "longitude",
                format!("{} is outside [-180, 180]", self.longitude),
            ));
        }
        if !self.value.is_finite() {
            return Err(FieldError::invalid(
                "value",
                format!("non-finite value at ({}, {})", self.latitude, self.longitude),
            ));
        }
        Ok(())
    }
}

/// Points sharing one coordinate within a slice, reduced to their mean value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAggregate {
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
    pub count: usize,
}

/// All measurements sharing one timestamp.
#[derive(Debug, Clone)]
pub struct TimeSlice {
    pub time: SampleTime,
    pub points: Vec<MeasurementPoint>,
}

impl TimeSlice {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(lon, lat, value)` triples in input order.
    pub fn samples(&self) -> Vec<(f64, f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.longitude, p.latitude, p.value))
            .collect()
    }

    /// Average the values of points with identical coordinates.
    ///
    /// Output is ordered by latitude then longitude.
    pub fn aggregate(&self) -> Vec<PointAggregate> {
        let mut sorted: Vec<&MeasurementPoint> = self.points.iter().collect();
        sorted.sort_by(|a, b| {
            a.latitude
                .total_cmp(&b.latitude)
                .then(a.longitude.total_cmp(&b.longitude))
        });

        let mut aggregates: Vec<PointAggregate> = Vec::with_capacity(sorted.len());
        for point in sorted {
            match aggregates.last_mut() {
                Some(last) if same_coordinate(last, point) => {
                    last.value += point.value;
                    last.count += 1;
                }
                _ => aggregates.push(PointAggregate {
                    longitude: point.longitude,
                    latitude: point.latitude,
                    value: point.value,
                    count: 1,
                }),
            }
        }

        for agg in &mut aggregates {
            agg.value /= agg.count as f64;
        }
        aggregates
    }
}

fn same_coordinate(agg: &PointAggregate, point: &MeasurementPoint) -> bool {
    agg.latitude.total_cmp(&point.latitude) == Ordering::Equal
        && agg.longitude.total_cmp(&point.longitude) == Ordering::Equal
}

/// Group points into slices ordered by ascending timestamp.
///
/// Labels naming the same instant share a slice, keyed by the first label
/// seen. Unparsed labels follow all dated slices.
pub fn group_by_time(points: &[MeasurementPoint]) -> Vec<TimeSlice> {
    let mut groups: BTreeMap<SampleTime, Vec<MeasurementPoint>> = BTreeMap::new();
    for point in points {
        groups
            .entry(point.timestamp.clone())
            .or_default()
            .push(point.clone());
    }

    groups
        .into_iter()
        .map(|(time, points)| TimeSlice { time, points })
        .collect()
}
