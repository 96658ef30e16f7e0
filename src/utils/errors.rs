use thiserror::Error;

/// `SimulationError` enumerates all possible errors returned by devs
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Represents a coupling endpoint that is not a component of the network
    #[error("A coupling endpoint is not a component of the network")]
    ModelNotFound,

    /// Represents an attempt to add a model that already belongs to a network
    #[error("The model is already a component of a network")]
    ModelAlreadyOwned,

    /// Represents an attempt to nest a network inside itself or a descendant
    #[error("A network cannot contain itself or one of its ancestors")]
    NetworkCycle,

    /// Represents a structural coupling cycle encountered during event routing
    #[error("A cycle was detected in the coupling structure during event routing")]
    CouplingCycle,

    /// Represents a negative or undefined duration produced by a time advance
    #[error("A model produced a negative or undefined time advance")]
    NegativeTimeAdvance,

    /// Represents an invalid model state, for use by client model logic
    #[error("An invalid model state was encountered")]
    InvalidModelState,

    /// Transparent wrapper for errors raised inside client model hooks
    #[error(transparent)]
    ModelError(#[from] Box<dyn std::error::Error + Send + Sync>),
}
