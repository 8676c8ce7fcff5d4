use thiserror::Error;

/// Failures the engine reports to its callers. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no usable coordinates for saved location {id:?}")]
    MissingCoordinates { id: String },
    #[error("fetching measurements failed: {0}")]
    FetchFailure(String),
    #[error("saved locations storage failed: {0}")]
    PersistenceFailure(String),
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

impl EngineError {
    pub(crate) fn persistence(err: &anyhow::Error) -> Self {
        Self::PersistenceFailure(format!("{err:#}"))
    }
}
