use gibbs_core::{CoreError, DomainType, VariableId};
use thiserror::Error;

/// Failures of a sampling run.
///
/// None of these are recoverable by retrying: they indicate a graph that
/// violates the sampler's construction-time contract or a numerical bug.
/// Callers should abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerError {
    /// A variable whose domain kind the sampler cannot draw from.
    #[error("variable {variable} has unsupported domain type {domain_type:?}")]
    UnsupportedDomain {
        variable: VariableId,
        domain_type: DomainType,
    },

    /// The cumulative selection ran past the end of the domain, or a
    /// boolean draw saw a NaN potential difference.
    #[error("selection for variable {variable} exhausted its domain (residual {residual})")]
    SelectionExhausted { variable: VariableId, residual: f64 },

    #[error("no worker {worker}; sampler has {n_workers}")]
    NoSuchWorker { worker: usize, n_workers: usize },

    /// The OS refused to start a worker thread. Every worker is back in
    /// place and no epoch is in flight.
    #[error("failed to spawn sampler worker {worker}: {reason}")]
    Spawn { worker: usize, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}
