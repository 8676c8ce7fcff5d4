use chrono::NaiveDate;

use crate::{
    app::params::ParamStore,
    data::{registry::LocationRegistry, store::KeyValueStore},
    domain::window::{Horizon, MeasurementRequest, QueryTarget, build_request},
    error::EngineError,
};

/// What a fetch depends on from the parameter store. A controller refetches
/// when this changes.
pub type ParamKey = (Vec<String>, Horizon);

/// App-lifetime state shared by every screen: the parameter configuration and
/// the location registry. Passed explicitly instead of living in a global.
#[derive(Debug)]
pub struct EngineContext<S> {
    pub params: ParamStore,
    pub registry: LocationRegistry<S>,
}

impl<S: KeyValueStore> EngineContext<S> {
    pub fn new(params: ParamStore, registry: LocationRegistry<S>) -> Self {
        Self { params, registry }
    }

    pub fn param_key(&self) -> ParamKey {
        (self.params.active_ids(), self.params.horizon())
    }

    pub fn build_request(
        &self,
        target: &QueryTarget,
        today: NaiveDate,
    ) -> Result<MeasurementRequest, EngineError> {
        build_request(
            target,
            self.params.active_ids(),
            self.params.horizon(),
            self.registry.locations(),
            today,
        )
    }

    /// Applies a parameter update in place.
    pub fn update_params(&mut self, update: impl FnOnce(ParamStore) -> ParamStore) {
        let current = std::mem::take(&mut self.params);
        self.params = update(current);
    }
}
