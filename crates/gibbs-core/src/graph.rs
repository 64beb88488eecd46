use crate::state::{AssignmentVector, InferenceState, WeightValues};
use crate::variable::{Variable, VariableId, VariableValue};

/// The factor graph as seen by the sampler.
///
/// Topology, potentials and the learning rule all live behind this trait;
/// the sampler only decides *which* variable to visit and *what* value to
/// draw. Implementations are shared across worker threads, so every method
/// takes `&self` and reads/writes the shared state through its relaxed
/// atomics.
pub trait FactorGraph: Send + Sync {
    /// All variables; `variables()[i].id == i`.
    fn variables(&self) -> &[Variable];

    fn variable(&self, id: VariableId) -> &Variable {
        &self.variables()[id]
    }

    fn n_variables(&self) -> usize {
        self.variables().len()
    }

    /// Log-domain contribution of every factor touching `variable` when it
    /// takes `value` and every other variable keeps its value in `assignments`.
    fn potential(
        &self,
        variable: &Variable,
        value: VariableValue,
        assignments: &AssignmentVector,
        weights: &WeightValues,
    ) -> f64;

    /// Apply one stochastic-gradient step to the weights of the factors
    /// touching `variable`, from the current evidence and free assignments.
    fn update_weight(&self, variable: &Variable, state: &InferenceState, stepsize: f64);
}
