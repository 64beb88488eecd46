//! Shared fixtures for the gibbs-samplers integration tests.

#![allow(dead_code)]

use gibbs_core::{
    AssignmentVector, FactorGraph, InferenceState, Variable, VariableValue, WeightValues,
};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A graph without factors: every variable's conditional is a fixed table of
/// potentials, independent of the rest of the assignment.
///
/// Values missing from a variable's table have potential 0. Weight updates
/// are only counted.
pub struct FixedPotentialGraph {
    variables: Vec<Variable>,
    potentials: Vec<IndexMap<VariableValue, f64>>,
    updates: AtomicUsize,
}

impl FixedPotentialGraph {
    pub fn new(variables: Vec<Variable>) -> Self {
        let potentials = variables.iter().map(|_| IndexMap::new()).collect();
        FixedPotentialGraph {
            variables,
            potentials,
            updates: AtomicUsize::new(0),
        }
    }

    pub fn with_potentials<I>(mut self, id: usize, table: I) -> Self
    where
        I: IntoIterator<Item = (VariableValue, f64)>,
    {
        self.potentials[id].extend(table);
        self
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> InferenceState {
        InferenceState::new(&self.variables, &[]).unwrap()
    }
}

impl FactorGraph for FixedPotentialGraph {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn potential(
        &self,
        variable: &Variable,
        value: VariableValue,
        _assignments: &AssignmentVector,
        _weights: &WeightValues,
    ) -> f64 {
        self.potentials[variable.id]
            .get(&value)
            .copied()
            .unwrap_or(0.0)
    }

    fn update_weight(&self, _variable: &Variable, _state: &InferenceState, _stepsize: f64) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}

/// `n` free booleans, each with `P(1) = sigmoid(bias)`.
pub fn biased_booleans(n: usize, bias: f64) -> FixedPotentialGraph {
    let variables = (0..n).map(Variable::boolean).collect();
    (0..n).fold(FixedPotentialGraph::new(variables), |graph, id| {
        graph.with_potentials(id, [(1, bias)])
    })
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Softmax of `potentials`, in input order.
pub fn softmax(potentials: &[f64]) -> Vec<f64> {
    let max = potentials.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = potentials.iter().map(|p| (p - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
