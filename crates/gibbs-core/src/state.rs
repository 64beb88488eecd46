//! Shared mutable inference state.
//!
//! Every worker of a sampling run holds a shared reference to one
//! [`InferenceState`]. All slots are relaxed atomics: reads never block and
//! may observe a neighbour's value from before or after that neighbour's
//! concurrent update (Hogwild-style). Assignment writes are restricted to
//! the writer's own [`Shard`] through [`ShardWriter`], so no two workers ever
//! store into the same assignment slot.

use crate::error::CoreError;
use crate::shard::Shard;
use crate::variable::{Variable, VariableId, VariableValue};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// An `f64` cell stored as raw bits.
#[derive(Debug, Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        AtomicF64(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Not a read-modify-write: a concurrent `add` on the same cell may be lost.
    fn add(&self, delta: f64) {
        self.store(self.load() + delta);
    }
}

/// A full-length assignment vector indexed by variable id.
#[derive(Debug)]
pub struct AssignmentVector {
    values: Vec<AtomicUsize>,
}

impl AssignmentVector {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = VariableValue>,
    {
        AssignmentVector {
            values: values.into_iter().map(AtomicUsize::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, id: VariableId) -> VariableValue {
        self.values[id].load(Ordering::Relaxed)
    }

    /// Write handle restricted to `shard`.
    pub fn writer(&self, shard: Shard) -> ShardWriter<'_> {
        assert!(
            shard.end() <= self.values.len(),
            "shard {shard:?} exceeds {} assignments",
            self.values.len()
        );
        ShardWriter {
            values: &self.values,
            shard,
        }
    }

    /// Copy of the current values.
    pub fn snapshot(&self) -> Vec<VariableValue> {
        self.values
            .iter()
            .map(|v| v.load(Ordering::Relaxed))
            .collect()
    }
}

/// Write access to the slots of one shard of an [`AssignmentVector`].
#[derive(Debug, Clone, Copy)]
pub struct ShardWriter<'a> {
    values: &'a [AtomicUsize],
    shard: Shard,
}

impl ShardWriter<'_> {
    #[inline]
    pub fn set(&self, id: VariableId, value: VariableValue) {
        debug_assert!(
            self.shard.contains(id),
            "variable {id} is outside writer shard {:?}",
            self.shard
        );
        self.values[id].store(value, Ordering::Relaxed);
    }

    pub fn shard(&self) -> Shard {
        self.shard
    }
}

/// Factor weight values indexed by weight id.
#[derive(Debug)]
pub struct WeightValues {
    values: Vec<AtomicF64>,
}

impl WeightValues {
    pub fn new(values: &[f64]) -> Self {
        WeightValues {
            values: values.iter().copied().map(AtomicF64::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, id: usize) -> f64 {
        self.values[id].load()
    }

    pub fn set(&self, id: usize, value: f64) {
        self.values[id].store(value);
    }

    /// Relaxed `w[id] += delta`; concurrent updates of one weight may be lost.
    pub fn add(&self, id: usize, delta: f64) {
        self.values[id].add(delta);
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.values.iter().map(AtomicF64::load).collect()
    }
}

/// Running sample statistics used to estimate marginals.
///
/// Each slot has a single writer (the worker owning the variable), and the
/// counters only grow during a run.
#[derive(Debug)]
pub struct Aggregates {
    nsamples: Vec<AtomicU64>,
    means: Vec<AtomicF64>,
    tallies: Vec<AtomicU64>,
}

impl Aggregates {
    pub fn new(n_variables: usize, n_tallies: usize) -> Self {
        Aggregates {
            nsamples: (0..n_variables).map(|_| AtomicU64::new(0)).collect(),
            means: (0..n_variables).map(|_| AtomicF64::default()).collect(),
            tallies: (0..n_tallies).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Record one boolean draw.
    pub fn record_boolean(&self, id: VariableId, value: VariableValue) {
        self.nsamples[id].fetch_add(1, Ordering::Relaxed);
        self.means[id].add(value as f64);
    }

    /// Record one multinomial draw landing in tally slot `slot`.
    pub fn record_multinomial(&self, id: VariableId, slot: usize) {
        self.nsamples[id].fetch_add(1, Ordering::Relaxed);
        self.tallies[slot].fetch_add(1, Ordering::Relaxed);
    }

    pub fn nsamples(&self, id: VariableId) -> u64 {
        self.nsamples[id].load(Ordering::Relaxed)
    }

    /// Sum of all boolean draws of `id`.
    pub fn mean_sum(&self, id: VariableId) -> f64 {
        self.means[id].load()
    }

    pub fn tally(&self, slot: usize) -> u64 {
        self.tallies[slot].load(Ordering::Relaxed)
    }

    pub fn n_tallies(&self) -> usize {
        self.tallies.len()
    }

    pub fn n_variables(&self) -> usize {
        self.nsamples.len()
    }

    /// Sum of all per-variable sample counters.
    pub fn total_samples(&self) -> u64 {
        self.nsamples
            .iter()
            .map(|n| n.load(Ordering::Relaxed))
            .sum()
    }
}

/// Everything a sampling run reads and writes besides the graph topology.
#[derive(Debug)]
pub struct InferenceState {
    /// Evidence variables pinned to their observed values.
    pub assignments_evid: AssignmentVector,
    /// Evidence ignored; used for the unconditional pass while learning.
    pub assignments_free: AssignmentVector,
    pub weight_values: WeightValues,
    pub aggregates: Aggregates,
}

impl InferenceState {
    /// Allocate state for `variables` (whose ids must equal their positions)
    /// and the initial `weights`.
    ///
    /// Both assignment vectors start at each variable's evidence-mode value.
    /// Tallies are sized to cover every multinomial's
    /// `tally_offset + cardinality`.
    pub fn new(variables: &[Variable], weights: &[f64]) -> Result<Self, CoreError> {
        if let Some((position, variable)) = variables
            .iter()
            .enumerate()
            .find(|(position, variable)| variable.id != *position)
        {
            return Err(CoreError::MisplacedVariable {
                position,
                id: variable.id,
            });
        }

        let n_tallies = required_tallies(variables);
        let initial = || variables.iter().map(|v| v.assignment_evid);

        Ok(InferenceState {
            assignments_evid: AssignmentVector::from_values(initial()),
            assignments_free: AssignmentVector::from_values(initial()),
            weight_values: WeightValues::new(weights),
            aggregates: Aggregates::new(variables.len(), n_tallies),
        })
    }

    pub fn n_variables(&self) -> usize {
        self.assignments_evid.len()
    }

    /// Check that this state is sized for `variables`: one slot per variable
    /// in both assignment vectors and aggregates, and a tally slot for every
    /// value of every multinomial.
    pub fn check_covers(&self, variables: &[Variable]) -> Result<(), CoreError> {
        let expected = variables.len();
        for actual in [
            self.assignments_evid.len(),
            self.assignments_free.len(),
            self.aggregates.n_variables(),
        ] {
            if actual != expected {
                return Err(CoreError::StateSizeMismatch { expected, actual });
            }
        }

        let required = required_tallies(variables);
        let available = self.aggregates.n_tallies();
        if available < required {
            return Err(CoreError::TalliesTooSmall {
                required,
                available,
            });
        }
        Ok(())
    }
}

fn required_tallies(variables: &[Variable]) -> usize {
    variables
        .iter()
        .filter(|v| !v.is_boolean())
        .map(|v| v.tally_offset + v.cardinality())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_initialized_from_variables() {
        let variables = vec![
            Variable::boolean(0).with_evidence(1).unwrap(),
            Variable::multinomial(1, 3)
                .unwrap()
                .with_initial_value(2)
                .unwrap()
                .with_tally_offset(0),
            Variable::multinomial(2, 4).unwrap().with_tally_offset(3),
        ];
        let state = InferenceState::new(&variables, &[0.5, -1.0]).unwrap();

        assert_eq!(state.assignments_evid.snapshot(), vec![1, 2, 0]);
        assert_eq!(state.assignments_free.snapshot(), vec![1, 2, 0]);
        assert_eq!(state.weight_values.snapshot(), vec![0.5, -1.0]);
        assert_eq!(state.aggregates.n_tallies(), 7);
    }

    #[test]
    fn test_misplaced_variable_rejected() {
        let variables = vec![Variable::boolean(0), Variable::boolean(5)];
        let err = InferenceState::new(&variables, &[]).unwrap_err();
        assert_eq!(err, CoreError::MisplacedVariable { position: 1, id: 5 });
    }

    #[test]
    fn test_check_covers_rejects_undersized_state() {
        let small = vec![Variable::boolean(0), Variable::boolean(1)];
        let state = InferenceState::new(&small, &[]).unwrap();
        assert_eq!(state.check_covers(&small), Ok(()));

        let wider: Vec<Variable> = (0..4).map(Variable::boolean).collect();
        assert_eq!(
            state.check_covers(&wider),
            Err(CoreError::StateSizeMismatch {
                expected: 4,
                actual: 2
            })
        );

        let multinomials = vec![
            Variable::boolean(0),
            Variable::multinomial(1, 3).unwrap().with_tally_offset(2),
        ];
        assert_eq!(
            state.check_covers(&multinomials),
            Err(CoreError::TalliesTooSmall {
                required: 5,
                available: 0
            })
        );
    }

    #[test]
    fn test_shard_writer_writes_in_place() {
        let assignments = AssignmentVector::from_values([0, 0, 0, 0]);
        let writer = assignments.writer(Shard::new(2, 4));
        writer.set(2, 1);
        writer.set(3, 5);
        assert_eq!(assignments.snapshot(), vec![0, 0, 1, 5]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside writer shard")]
    fn test_shard_writer_rejects_foreign_slot() {
        let assignments = AssignmentVector::from_values([0, 0, 0, 0]);
        assignments.writer(Shard::new(0, 2)).set(2, 1);
    }

    #[test]
    fn test_aggregates_accumulate() {
        let aggregates = Aggregates::new(2, 3);
        aggregates.record_boolean(0, 1);
        aggregates.record_boolean(0, 0);
        aggregates.record_boolean(0, 1);
        aggregates.record_multinomial(1, 2);

        assert_eq!(aggregates.nsamples(0), 3);
        assert_eq!(aggregates.mean_sum(0), 2.0);
        assert_eq!(aggregates.tally(2), 1);
        assert_eq!(aggregates.total_samples(), 4);
    }

    #[test]
    fn test_weight_add() {
        let weights = WeightValues::new(&[1.0]);
        weights.add(0, 0.25);
        assert_eq!(weights.get(0), 1.25);
    }
}
