//! Query windows: which rectangle and which days a screen asks the
//! measurement service for.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{
    domain::location::{Coordinate, SavedLocation},
    error::EngineError,
};

/// Fixed rectangle covering the Tricity metro area.
pub const METRO_AREA: BoundingBox = BoundingBox {
    min_lat: 54.3012,
    min_lng: 18.0012,
    max_lat: 55.3525,
    max_lng: 19.6482,
};
pub const REGION_MARGIN_DEG: f64 = 0.5;
pub const POINT_MARGIN_DEG: f64 = 0.1;

/// Region queries start at this fixed day rather than today, so their span
/// grows with every passing day.
pub fn region_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Forward days included in a query, always within `0..=Horizon::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Horizon(u8);

impl Horizon {
    pub const MAX: u8 = 5;
    pub const OPTIONS: [u8; 6] = [0, 1, 2, 3, 4, 5];

    pub fn clamped(days: i64) -> Self {
        Self(days.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub fn days(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: Coordinate, margin: f64) -> Self {
        Self {
            min_lat: center.latitude - margin,
            min_lng: center.longitude - margin,
            max_lat: center.latitude + margin,
            max_lng: center.longitude + margin,
        }
    }

    #[must_use]
    pub fn expanded(self, margin: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin,
            min_lng: self.min_lng - margin,
            max_lat: self.max_lat + margin,
            max_lng: self.max_lng + margin,
        }
    }

    /// Strict containment; points on an edge are outside.
    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude > self.min_lat
            && point.latitude < self.max_lat
            && point.longitude > self.min_lng
            && point.longitude < self.max_lng
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }
}

/// Inclusive day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn forward(from: NaiveDate, today: NaiveDate, horizon: Horizon) -> Self {
        let to = today
            .checked_add_days(Days::new(u64::from(horizon.days())))
            .unwrap_or(today);
        Self {
            from: from.min(to),
            to,
        }
    }

    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }
}

/// Where a screen points its query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// Metro rectangle plus margin, from the fixed history start.
    Region,
    /// Metro rectangle as-is, from today.
    Area,
    /// Box around a saved location, from today.
    Point(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRequest {
    pub types: Vec<String>,
    pub bbox: BoundingBox,
    pub range: DateRange,
}

/// JSON body understood by the measurement service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaQuery {
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub x_lat: f64,
    pub x_lng: f64,
    pub y_lat: f64,
    pub y_lng: f64,
    pub from: String,
    pub to: String,
}

impl MeasurementRequest {
    pub fn to_wire(&self) -> AreaQuery {
        AreaQuery {
            types: self.types.clone(),
            x_lat: self.bbox.min_lat,
            x_lng: self.bbox.min_lng,
            y_lat: self.bbox.max_lat,
            y_lng: self.bbox.max_lng,
            from: format_day(self.range.from),
            to: format_day(self.range.to),
        }
    }
}

pub fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Builds the single request for `target`. Point targets must resolve to a
/// saved location with usable coordinates; otherwise nothing is requested.
pub fn build_request(
    target: &QueryTarget,
    active_types: Vec<String>,
    horizon: Horizon,
    locations: &[SavedLocation],
    today: NaiveDate,
) -> Result<MeasurementRequest, EngineError> {
    let (bbox, from) = match target {
        QueryTarget::Region => (
            METRO_AREA.expanded(REGION_MARGIN_DEG),
            region_history_start(),
        ),
        QueryTarget::Area => (METRO_AREA, today),
        QueryTarget::Point(id) => {
            let coordinate = locations
                .iter()
                .find(|location| location.id == *id)
                .and_then(SavedLocation::usable_coordinate)
                .ok_or_else(|| EngineError::MissingCoordinates { id: id.clone() })?;
            (BoundingBox::around(coordinate, POINT_MARGIN_DEG), today)
        }
    };

    Ok(MeasurementRequest {
        types: active_types,
        bbox,
        range: DateRange::forward(from, today, horizon),
    })
}
