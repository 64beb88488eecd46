//! Compact factor graph with a CSR variable → factor index.

use crate::factor::{Factor, FactorId, Weight};
use gibbs_core::{
    AssignmentVector, FactorGraph, InferenceState, Variable, VariableId, VariableValue,
    WeightValues,
};

/// Immutable factor graph assembled by [`FactorGraphBuilder`](crate::FactorGraphBuilder).
///
/// The factors touching variable `v` are
/// `factor_index[factor_offsets[v]..factor_offsets[v + 1]]`; a factor is
/// listed once per variable even if several of its literals name it.
#[derive(Debug, Clone)]
pub struct CompactFactorGraph {
    pub(crate) variables: Vec<Variable>,
    pub(crate) weights: Vec<Weight>,
    pub(crate) factors: Vec<Factor>,
    pub(crate) factor_offsets: Vec<usize>,
    pub(crate) factor_index: Vec<FactorId>,
    pub(crate) n_tallies: usize,
}

impl CompactFactorGraph {
    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Initial value of every weight, indexed by weight id.
    pub fn initial_weight_values(&self) -> Vec<f64> {
        self.weights.iter().map(|w| w.initial_value).collect()
    }

    /// Number of multinomial tally slots the variables' offsets cover.
    pub fn n_tallies(&self) -> usize {
        self.n_tallies
    }

    /// Factors with at least one literal on `vid`.
    pub fn factors_of(&self, vid: VariableId) -> impl Iterator<Item = &Factor> + '_ {
        let range = self.factor_offsets[vid]..self.factor_offsets[vid + 1];
        self.factor_index[range]
            .iter()
            .map(move |&fid| &self.factors[fid])
    }
}

impl FactorGraph for CompactFactorGraph {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn potential(
        &self,
        variable: &Variable,
        value: VariableValue,
        assignments: &AssignmentVector,
        weights: &WeightValues,
    ) -> f64 {
        let value_of = |vid: VariableId| {
            if vid == variable.id {
                value
            } else {
                assignments.get(vid)
            }
        };
        self.factors_of(variable.id)
            .map(|factor| weights.get(factor.weight) * factor.evaluate(value_of))
            .sum()
    }

    fn update_weight(&self, variable: &Variable, state: &InferenceState, stepsize: f64) {
        for factor in self.factors_of(variable.id) {
            if self.weights[factor.weight].is_fixed {
                continue;
            }
            let evid = factor.evaluate(|vid| state.assignments_evid.get(vid));
            let free = factor.evaluate(|vid| state.assignments_free.get(vid));
            state
                .weight_values
                .add(factor.weight, stepsize * (evid - free));
        }
    }
}
