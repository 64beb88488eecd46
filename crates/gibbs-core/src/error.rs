use crate::variable::{VariableId, VariableValue};
use thiserror::Error;

/// Errors raised while building variables or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("a variable domain must contain at least one value")]
    EmptyDomain,

    #[error("domain value {value} appears more than once")]
    DuplicateDomainValue { value: VariableValue },

    #[error("value {value} is not in the domain of variable {variable}")]
    ValueOutOfDomain {
        variable: VariableId,
        value: VariableValue,
    },

    #[error("variable at position {position} has id {id}; ids must match positions")]
    MisplacedVariable { position: usize, id: VariableId },

    #[error("sampler needs at least one worker thread")]
    ZeroThreads,

    #[error("inference state holds {actual} variables, graph has {expected}")]
    StateSizeMismatch { expected: usize, actual: usize },

    #[error("inference state has {available} tally slots, variables need {required}")]
    TalliesTooSmall { required: usize, available: usize },
}
