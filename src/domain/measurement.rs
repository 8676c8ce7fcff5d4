use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Measurement type whose positive value marks an adverse-odor day.
pub const STINK_TYPE: &str = "stink";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementType {
    pub id: String,
    pub active: bool,
}

impl MeasurementType {
    pub fn new(id: impl Into<String>, active: bool) -> Self {
        Self {
            id: id.into(),
            active,
        }
    }
}

/// One reading as returned by the measurement service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub time: NaiveDateTime,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl MeasurementRecord {
    pub fn new(kind: impl Into<String>, time: NaiveDateTime, value: f64) -> Self {
        Self {
            kind: kind.into(),
            time,
            value,
            lat: None,
            lng: None,
        }
    }

    #[must_use]
    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    /// Calendar day of the reading; time of day is discarded.
    pub fn day(&self) -> NaiveDate {
        self.time.date()
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lng?))
    }
}

/// Parses the timestamp shapes the service emits. Offsets are kept as written,
/// so the day of `2024-06-01T23:30:00+02:00` is 2024-06-01.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp {raw:?}")))
}
