use crate::factor::{FactorFunction, WeightId};
use gibbs_core::{VariableId, VariableValue};
use thiserror::Error;

/// Errors raised while assembling a [`CompactFactorGraph`](crate::CompactFactorGraph).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("variable added with id {got}, expected {expected}")]
    VariableIdMismatch { expected: VariableId, got: VariableId },

    #[error("factor refers to unknown variable {variable}")]
    UnknownVariable { variable: VariableId },

    #[error("factor refers to unknown weight {weight}")]
    UnknownWeight { weight: WeightId },

    #[error("literal value {value} is not in the domain of variable {variable}")]
    ValueOutOfDomain {
        variable: VariableId,
        value: VariableValue,
    },

    #[error("{function:?} factor cannot take {arity} literals")]
    Arity {
        function: FactorFunction,
        arity: usize,
    },
}
