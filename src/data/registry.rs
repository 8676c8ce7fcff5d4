use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info, warn};

use crate::{
    data::store::KeyValueStore,
    domain::location::{Coordinate, SavedLocation},
    error::EngineError,
};

pub const STORAGE_KEY: &str = "@saved_locations";

/// Result of [`LocationRegistry::create`]. The location is part of the
/// in-memory list even when `persist_error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub location: SavedLocation,
    pub persist_error: Option<EngineError>,
}

impl Created {
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Saved locations, persisted as one JSON array under [`STORAGE_KEY`].
///
/// Every write replaces the whole array. Mutation goes through `&mut self`,
/// so one registry value is the single writer for its store; two processes
/// sharing the same store can still overwrite each other's additions.
#[derive(Debug)]
pub struct LocationRegistry<S> {
    store: S,
    locations: Vec<SavedLocation>,
    last_id: i64,
}

impl<S: KeyValueStore> LocationRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locations: Vec::new(),
            last_id: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locations(&self) -> &[SavedLocation] {
        &self.locations
    }

    pub fn find_by_id(&self, id: &str) -> Option<&SavedLocation> {
        self.locations.iter().find(|location| location.id == id)
    }

    /// Reloads from storage. Missing data and read failures both yield an
    /// empty list; failures are logged.
    pub async fn load(&mut self) -> Vec<SavedLocation> {
        self.locations = match self.read().await {
            Ok(locations) => locations,
            Err(err) => {
                error!("loading saved locations failed: {err:#}");
                Vec::new()
            }
        };
        let newest = self
            .locations
            .iter()
            .filter_map(|location| location.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        self.last_id = self.last_id.max(newest);
        self.locations.clone()
    }

    pub async fn create(
        &mut self,
        name: &str,
        description: &str,
        coordinate: Coordinate,
    ) -> Result<Created, EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidLocation(
                "name must not be empty".to_string(),
            ));
        }
        if !coordinate.is_finite() {
            return Err(EngineError::InvalidLocation(
                "coordinate must be finite".to_string(),
            ));
        }

        let location = SavedLocation {
            id: self.next_id()?,
            name: name.to_string(),
            description: description.trim().to_string(),
            coordinate: Some(coordinate),
        };
        self.locations.push(location.clone());

        let persist_error = match self.persist().await {
            Ok(()) => {
                info!("saved location {} ({})", location.id, location.name);
                None
            }
            Err(err) => {
                warn!(
                    "location {} kept in memory only, persisting failed: {err:#}",
                    location.id
                );
                Some(EngineError::persistence(&err))
            }
        };

        Ok(Created {
            location,
            persist_error,
        })
    }

    async fn read(&self) -> Result<Vec<SavedLocation>> {
        let Some(payload) = self
            .store
            .get(STORAGE_KEY)
            .await
            .context("reading saved locations failed")?
        else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&payload).context("decoding saved locations failed")
    }

    async fn persist(&self) -> Result<()> {
        let payload = serde_json::to_string(&self.locations)
            .context("serializing saved locations failed")?;
        self.store
            .set(STORAGE_KEY, payload)
            .await
            .context("writing saved locations failed")
    }

    /// Millisecond timestamp, bumped past the newest id already handed out.
    /// When a stored id leaves no room above it, ids restart from the clock
    /// and skip any value already taken.
    fn next_id(&mut self) -> Result<String, EngineError> {
        let now = Utc::now().timestamp_millis();
        let mut candidate = match self.last_id.checked_add(1) {
            Some(next) => now.max(next),
            None => {
                warn!("stored location ids leave no room above them, using the clock");
                now
            }
        };
        while self.is_taken(candidate) {
            candidate = candidate.checked_add(1).ok_or_else(|| {
                EngineError::InvalidLocation("no free location id left".to_string())
            })?;
        }
        self.last_id = candidate;
        Ok(candidate.to_string())
    }

    fn is_taken(&self, id: i64) -> bool {
        self.locations
            .iter()
            .any(|location| location.id.parse::<i64>().ok() == Some(id))
    }
}
