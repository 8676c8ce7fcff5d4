use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use crate::domain::measurement::MeasurementRecord;

pub const TICK_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum ScreenEvent {
    BecameVisible,
    LostVisibility,
    Tick,
    ParamsChanged,
    FetchSucceeded {
        token: u64,
        records: Vec<MeasurementRecord>,
    },
    FetchFailed {
        token: u64,
        error: String,
    },
}

/// Owns the repeating tick task; dropping the handle stops the task.
#[derive(Debug)]
pub struct TickHandle(JoinHandle<()>);

impl TickHandle {
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Sends `ScreenEvent::Tick` every `period`, first one a full period from now.
pub fn start_tick_task(tx: mpsc::Sender<ScreenEvent>, period: Duration) -> TickHandle {
    let period = period.max(Duration::from_millis(10));
    TickHandle(tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.send(ScreenEvent::Tick).await.is_err() {
                break;
            }
        }
    }))
}
