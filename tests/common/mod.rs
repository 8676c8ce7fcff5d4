#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use airsense::{
    app::{clock::FixedClock, context::EngineContext, params::ParamStore},
    data::{
        measurements::MeasurementClient,
        registry::{LocationRegistry, STORAGE_KEY},
        store::MemoryStore,
    },
    domain::{
        location::{Coordinate, SavedLocation},
        measurement::MeasurementRecord,
        window::MeasurementRequest,
    },
};
use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use futures::future::{BoxFuture, FutureExt};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date fixture")
}

pub fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").expect("valid time fixture")
}

pub fn fixed_clock(today: NaiveDate) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(today))
}

pub fn location(id: &str, latitude: f64, longitude: f64) -> SavedLocation {
    SavedLocation {
        id: id.to_string(),
        name: format!("Spot {id}"),
        description: String::new(),
        coordinate: Some(Coordinate::new(latitude, longitude)),
    }
}

pub fn odor_week() -> Vec<MeasurementRecord> {
    vec![
        MeasurementRecord::new("temperature", at("2024-06-01T09:00"), 19.5),
        MeasurementRecord::new("temperature", at("2024-06-01T15:00"), 23.0),
        MeasurementRecord::new("stink", at("2024-06-02T07:00"), 2.0).at(54.52, 18.61),
        MeasurementRecord::new("stink", at("2024-06-03T07:00"), 0.0).at(54.52, 18.61),
    ]
}

pub async fn context_with(locations: &[SavedLocation]) -> EngineContext<MemoryStore> {
    let payload = serde_json::to_string(locations).expect("serialize locations fixture");
    let mut registry = LocationRegistry::new(MemoryStore::with_entry(STORAGE_KEY, payload));
    registry.load().await;
    EngineContext::new(ParamStore::default(), registry)
}

struct Scripted {
    delay: Duration,
    outcome: Result<Vec<MeasurementRecord>, String>,
}

/// Plays back queued outcomes in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<MeasurementRequest>>,
}

impl ScriptedClient {
    pub fn succeed(self, records: Vec<MeasurementRecord>) -> Self {
        self.push(Duration::ZERO, Ok(records))
    }

    pub fn succeed_after(self, delay: Duration, records: Vec<MeasurementRecord>) -> Self {
        self.push(delay, Ok(records))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Duration::ZERO, Err(message.to_string()))
    }

    fn push(self, delay: Duration, outcome: Result<Vec<MeasurementRecord>, String>) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Scripted { delay, outcome });
        self
    }

    pub fn requests(&self) -> Vec<MeasurementRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl MeasurementClient for ScriptedClient {
    fn fetch_measurements(
        &self,
        request: MeasurementRequest,
    ) -> BoxFuture<'_, anyhow::Result<Vec<MeasurementRecord>>> {
        self.requests.lock().expect("requests lock").push(request);
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Scripted {
                delay: Duration::ZERO,
                outcome: Ok(Vec::new()),
            });
        async move {
            if !next.delay.is_zero() {
                tokio::time::sleep(next.delay).await;
            }
            next.outcome.map_err(|message| anyhow!(message))
        }
        .boxed()
    }
}
