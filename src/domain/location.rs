use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Zero on either axis is treated as "never set", matching how the mobile
    /// client stored unplaced pins.
    pub fn is_usable(&self) -> bool {
        self.is_finite() && self.latitude != 0.0 && self.longitude != 0.0
    }
}

/// A user-created named point. Stored as-is in the location registry payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Older payloads may carry a pin without coordinates.
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

impl SavedLocation {
    pub fn usable_coordinate(&self) -> Option<Coordinate> {
        self.coordinate.filter(Coordinate::is_usable)
    }

    pub fn display_name(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.description)
        }
    }
}
