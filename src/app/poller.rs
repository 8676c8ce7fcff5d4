use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::{
    app::{
        clock::Clock,
        context::{EngineContext, ParamKey},
        events::{ScreenEvent, TICK_PERIOD, TickHandle, start_tick_task},
    },
    data::{measurements::MeasurementClient, store::KeyValueStore},
    domain::{
        index::RecordIndex,
        measurement::MeasurementRecord,
        window::{MeasurementRequest, QueryTarget},
    },
    error::EngineError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Ready,
    Failed,
}

/// Screens that own a measurement query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Home,
    Map,
    Locations,
    LocationDetail(String),
}

impl Screen {
    pub fn target(&self) -> QueryTarget {
        match self {
            Self::Home => QueryTarget::Region,
            Self::Map | Self::Locations => QueryTarget::Area,
            Self::LocationDetail(id) => QueryTarget::Point(id.clone()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Home => "Home".to_string(),
            Self::Map => "Map".to_string(),
            Self::Locations => "Saved locations".to_string(),
            Self::LocationDetail(id) => format!("Location {id}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshMeta {
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl RefreshMeta {
    pub fn mark_success(&mut self, at: DateTime<Utc>) {
        self.last_success = Some(at);
        self.consecutive_failures = 0;
    }

    pub fn mark_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// Fetch lifecycle of one screen.
///
/// Every trigger issues a new request under a fresh token; a response is
/// applied only if its token is still the newest one, so a slow early request
/// can never overwrite a later one. Requests are never cancelled: a response
/// that lands after the screen lost visibility is still applied if current.
pub struct ScreenController {
    screen: Screen,
    client: Arc<dyn MeasurementClient>,
    clock: Arc<dyn Clock>,
    tick_period: Duration,
    state: PollState,
    visible: bool,
    token: u64,
    tick: Option<TickHandle>,
    today: NaiveDate,
    fetched_key: Option<ParamKey>,
    index: RecordIndex,
    refresh_meta: RefreshMeta,
    last_error: Option<EngineError>,
}

impl std::fmt::Debug for ScreenController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenController")
            .field("screen", &self.screen)
            .field("state", &self.state)
            .field("visible", &self.visible)
            .field("token", &self.token)
            .field("today", &self.today)
            .field("records", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl ScreenController {
    pub fn new(screen: Screen, client: Arc<dyn MeasurementClient>, clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        Self {
            screen,
            client,
            clock,
            tick_period: TICK_PERIOD,
            state: PollState::Idle,
            visible: false,
            token: 0,
            tick: None,
            today,
            fetched_key: None,
            index: RecordIndex::default(),
            refresh_meta: RefreshMeta::default(),
            last_error: None,
        }
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    pub fn refresh_meta(&self) -> &RefreshMeta {
        &self.refresh_meta
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    /// Token of the newest request issued, zero before the first one.
    pub fn current_token(&self) -> u64 {
        self.token
    }

    /// Short status line for the UI, if there is anything to say.
    pub fn notice(&self) -> Option<String> {
        if let Some(EngineError::MissingCoordinates { .. }) = &self.last_error {
            return Some("This location has no coordinates to query".to_string());
        }
        match self.state {
            PollState::Fetching if self.index.is_empty() => {
                Some("Loading measurements...".to_string())
            }
            PollState::Failed if self.index.is_empty() => {
                Some("Could not load measurements".to_string())
            }
            PollState::Failed => {
                Some("Refresh failed; showing the last measurements".to_string())
            }
            _ => None,
        }
    }

    pub fn handle_event<S: KeyValueStore>(
        &mut self,
        event: ScreenEvent,
        ctx: &EngineContext<S>,
        tx: &mpsc::Sender<ScreenEvent>,
    ) {
        match event {
            ScreenEvent::BecameVisible => self.handle_became_visible(ctx, tx),
            ScreenEvent::LostVisibility => self.handle_lost_visibility(),
            ScreenEvent::Tick => self.handle_tick(ctx, tx),
            ScreenEvent::ParamsChanged => self.handle_params_changed(ctx, tx),
            ScreenEvent::FetchSucceeded { token, records } => {
                self.handle_fetch_succeeded(token, records);
            }
            ScreenEvent::FetchFailed { token, error } => self.handle_fetch_failed(token, error),
        }
    }

    fn handle_became_visible<S: KeyValueStore>(
        &mut self,
        ctx: &EngineContext<S>,
        tx: &mpsc::Sender<ScreenEvent>,
    ) {
        self.visible = true;
        // Replacing the handle aborts any tick task left from a previous focus.
        self.tick = Some(start_tick_task(tx.clone(), self.tick_period));
        self.today = self.clock.today();
        self.trigger(ctx, tx);
    }

    fn handle_lost_visibility(&mut self) {
        self.visible = false;
        if let Some(tick) = self.tick.take() {
            tick.stop();
        }
    }

    fn handle_tick<S: KeyValueStore>(
        &mut self,
        ctx: &EngineContext<S>,
        tx: &mpsc::Sender<ScreenEvent>,
    ) {
        if !self.visible {
            return;
        }
        let today = self.clock.today();
        if today != self.today {
            info!("{}: day rolled over to {today}", self.screen.label());
            self.today = today;
            self.trigger(ctx, tx);
        }
    }

    fn handle_params_changed<S: KeyValueStore>(
        &mut self,
        ctx: &EngineContext<S>,
        tx: &mpsc::Sender<ScreenEvent>,
    ) {
        if !self.visible {
            return;
        }
        if self.fetched_key.as_ref() != Some(&ctx.param_key()) {
            self.trigger(ctx, tx);
        }
    }

    fn handle_fetch_succeeded(&mut self, token: u64, records: Vec<MeasurementRecord>) {
        if token != self.token {
            debug!(
                "{}: dropping response for request {token}, newest is {}",
                self.screen.label(),
                self.token
            );
            return;
        }
        info!(
            "{}: received {} records",
            self.screen.label(),
            records.len()
        );
        self.index = RecordIndex::new(records);
        self.state = PollState::Ready;
        self.last_error = None;
        self.refresh_meta.mark_success(self.clock.now());
    }

    fn handle_fetch_failed(&mut self, token: u64, err: String) {
        if token != self.token {
            debug!(
                "{}: ignoring failure of superseded request {token}",
                self.screen.label()
            );
            return;
        }
        error!("{}: {err}", self.screen.label());
        self.state = PollState::Failed;
        self.last_error = Some(EngineError::FetchFailure(err));
        self.refresh_meta.mark_failure();
    }

    /// Builds the request for the current day and parameters and dispatches it.
    /// Returns the token of the new request.
    pub fn refetch<S: KeyValueStore>(
        &mut self,
        ctx: &EngineContext<S>,
        tx: &mpsc::Sender<ScreenEvent>,
    ) -> Result<u64, EngineError> {
        if self.state == PollState::Failed {
            self.state = PollState::Idle;
        }
        let request = match ctx.build_request(&self.screen.target(), self.today) {
            Ok(request) => request,
            Err(err) => {
                warn!("{}: no request issued: {err}", self.screen.label());
                self.state = PollState::Idle;
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };
        self.last_error = None;
        self.fetched_key = Some(ctx.param_key());
        Ok(self.dispatch(request, tx))
    }

    fn trigger<S: KeyValueStore>(&mut self, ctx: &EngineContext<S>, tx: &mpsc::Sender<ScreenEvent>) {
        // Failures are recorded in `last_error`; triggers have no caller to report to.
        let _ = self.refetch(ctx, tx);
    }

    fn dispatch(&mut self, request: MeasurementRequest, tx: &mpsc::Sender<ScreenEvent>) -> u64 {
        self.token = self.token.wrapping_add(1);
        let token = self.token;
        self.state = PollState::Fetching;
        self.refresh_meta.last_attempt = Some(self.clock.now());
        debug!(
            "{}: request {token} for {:?} {}..{}",
            self.screen.label(),
            request.types,
            request.range.from,
            request.range.to
        );

        let client = Arc::clone(&self.client);
        let tx2 = tx.clone();
        tokio::spawn(async move {
            let event = match client.fetch_measurements(request).await {
                Ok(records) => ScreenEvent::FetchSucceeded { token, records },
                Err(err) => ScreenEvent::FetchFailed {
                    token,
                    error: format!("{err:#}"),
                },
            };
            let _ = tx2.send(event).await;
        });
        token
    }
}
