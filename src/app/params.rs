use crate::domain::{
    measurement::{MeasurementType, STINK_TYPE},
    window::Horizon,
};

pub const DEFAULT_TYPES: [&str; 6] = [
    "temperature",
    "pressure",
    "wind_speed",
    "pm25",
    "o3",
    STINK_TYPE,
];
pub const DEFAULT_HORIZON_DAYS: i64 = 3;

/// Fill colors offered for odor areas on the map.
pub const DISPLAY_PALETTE: [&str; 8] = [
    "rgba(255, 0, 0, 0.5)",
    "rgba(200, 0, 0, 0.5)",
    "rgba(255, 69, 0, 0.5)",
    "rgba(255, 140, 0, 0.5)",
    "rgba(255, 165, 0, 0.5)",
    "rgba(255, 215, 0, 0.5)",
    "rgba(255, 255, 0, 0.5)",
    "rgba(255, 99, 71, 0.5)",
];

/// In-memory parameter configuration. Every setter consumes the store and
/// returns the updated one; nothing here is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamStore {
    types: Vec<MeasurementType>,
    horizon: Horizon,
    display_color: String,
}

impl Default for ParamStore {
    fn default() -> Self {
        Self {
            types: DEFAULT_TYPES
                .iter()
                .map(|id| MeasurementType::new(*id, true))
                .collect(),
            horizon: Horizon::clamped(DEFAULT_HORIZON_DAYS),
            display_color: DISPLAY_PALETTE[0].to_string(),
        }
    }
}

impl ParamStore {
    pub fn types(&self) -> &[MeasurementType] {
        &self.types
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn display_color(&self) -> &str {
        &self.display_color
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.types.iter().any(|kind| kind.id == id)
    }

    /// Active type ids in declaration order.
    pub fn active_ids(&self) -> Vec<String> {
        self.types
            .iter()
            .filter(|kind| kind.active)
            .map(|kind| kind.id.clone())
            .collect()
    }

    /// Unknown ids leave the store untouched.
    #[must_use]
    pub fn toggle(mut self, id: &str) -> Self {
        if let Some(kind) = self.types.iter_mut().find(|kind| kind.id == id) {
            kind.active = !kind.active;
        }
        self
    }

    #[must_use]
    pub fn with_active(mut self, id: &str, active: bool) -> Self {
        if let Some(kind) = self.types.iter_mut().find(|kind| kind.id == id) {
            kind.active = active;
        }
        self
    }

    #[must_use]
    pub fn with_horizon(mut self, days: i64) -> Self {
        self.horizon = Horizon::clamped(days);
        self
    }

    /// Any string is accepted; the palette is only a suggestion.
    #[must_use]
    pub fn with_display_color(mut self, color: impl Into<String>) -> Self {
        self.display_color = color.into();
        self
    }

    #[must_use]
    pub fn cycle_horizon(self, direction: i8) -> Self {
        let next = cycle(&Horizon::OPTIONS, self.horizon.days(), direction);
        self.with_horizon(i64::from(next))
    }

    #[must_use]
    pub fn cycle_display_color(self, direction: i8) -> Self {
        let current = DISPLAY_PALETTE
            .iter()
            .copied()
            .find(|color| *color == self.display_color)
            .unwrap_or(DISPLAY_PALETTE[0]);
        let next = cycle(&DISPLAY_PALETTE, current, direction);
        self.with_display_color(next)
    }
}

fn cycle<T: Copy + Eq>(values: &[T], current: T, direction: i8) -> T {
    if values.is_empty() {
        return current;
    }
    let idx = values.iter().position(|v| *v == current).unwrap_or(0);
    let len = values.len();
    let next = if direction >= 0 {
        (idx + 1) % len
    } else if idx == 0 {
        len - 1
    } else {
        idx - 1
    };
    values[next]
}
