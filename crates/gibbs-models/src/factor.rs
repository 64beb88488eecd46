//! Weighted logical factors.
//!
//! A factor connects a set of variable *literals* ([`FactorEdge`]s). A literal
//! is satisfied when its variable currently equals `equal_to`; for booleans a
//! positive literal has `equal_to = 1` and a negated one `equal_to = 0`. The
//! factor function maps the satisfaction of its literals to a real value,
//! and contributes `weight · value` to the log-potential of every variable
//! it touches.

use gibbs_core::{VariableId, VariableValue};
use serde::{Deserialize, Serialize};

pub type WeightId = usize;
pub type FactorId = usize;

/// A learnable (or fixed) factor weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub id: WeightId,
    pub initial_value: f64,
    /// Fixed weights are never touched by learning.
    pub is_fixed: bool,
}

/// Function computed by a factor over its literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorFunction {
    /// `[l0]`; exactly one literal.
    IsTrue,
    /// `[l0 ∧ l1 ∧ …]`
    And,
    /// `[l0 ∨ l1 ∨ …]`
    Or,
    /// `[(l0 ∧ … ∧ l_{n-2}) ⇒ l_{n-1}]`; the last literal is the head.
    Imply,
    /// `[l0 = l1 = …]`; every literal agrees.
    Equal,
    /// `Σ_i [l_i ⇒ head]` over the body literals, the last literal being the head.
    /// A single literal counts itself.
    Linear,
}

impl FactorFunction {
    /// Smallest number of literals the function is defined on.
    pub fn min_arity(self) -> usize {
        match self {
            FactorFunction::IsTrue | FactorFunction::And | FactorFunction::Or => 1,
            FactorFunction::Linear => 1,
            FactorFunction::Imply | FactorFunction::Equal => 2,
        }
    }

    pub fn max_arity(self) -> Option<usize> {
        match self {
            FactorFunction::IsTrue => Some(1),
            _ => None,
        }
    }
}

/// One literal of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactorEdge {
    pub variable: VariableId,
    pub equal_to: VariableValue,
}

impl FactorEdge {
    pub fn positive(variable: VariableId) -> Self {
        FactorEdge {
            variable,
            equal_to: 1,
        }
    }

    pub fn negative(variable: VariableId) -> Self {
        FactorEdge {
            variable,
            equal_to: 0,
        }
    }

    pub fn equals(variable: VariableId, value: VariableValue) -> Self {
        FactorEdge {
            variable,
            equal_to: value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub id: FactorId,
    pub function: FactorFunction,
    pub weight: WeightId,
    pub edges: Vec<FactorEdge>,
}

impl Factor {
    /// Evaluate the factor function under the assignment `value_of`.
    pub fn evaluate<F>(&self, value_of: F) -> f64
    where
        F: Fn(VariableId) -> VariableValue,
    {
        let satisfied = |edge: &FactorEdge| value_of(edge.variable) == edge.equal_to;

        let holds = match self.function {
            FactorFunction::IsTrue => self.edges.first().is_some_and(satisfied),
            FactorFunction::And => self.edges.iter().all(satisfied),
            FactorFunction::Or => self.edges.iter().any(satisfied),
            FactorFunction::Imply => match self.edges.split_last() {
                Some((head, body)) => !body.iter().all(satisfied) || satisfied(head),
                None => false,
            },
            FactorFunction::Equal => match self.edges.split_first() {
                Some((first, rest)) => {
                    let expected = satisfied(first);
                    rest.iter().all(|edge| satisfied(edge) == expected)
                }
                None => false,
            },
            FactorFunction::Linear => {
                return match self.edges.split_last() {
                    Some((head, [])) => indicator(satisfied(head)),
                    Some((head, body)) => {
                        let head = satisfied(head);
                        body.iter()
                            .map(|edge| indicator(!satisfied(edge) || head))
                            .sum()
                    }
                    None => 0.0,
                };
            }
        };
        indicator(holds)
    }
}

fn indicator(holds: bool) -> f64 {
    if holds {
        1.0
    } else {
        0.0
    }
}
