use crate::error::GraphError;
use crate::factor::{Factor, FactorEdge, FactorFunction, FactorId, Weight, WeightId};
use crate::graph::CompactFactorGraph;
use gibbs_core::{Variable, VariableId};
use itertools::Itertools;

/// Incrementally assembles a [`CompactFactorGraph`].
///
/// Variables must be added in id order. Every factor is checked against the
/// variables and weights already added, so `build` itself cannot fail.
///
/// ```
/// use gibbs_models::{FactorEdge, FactorFunction, FactorGraphBuilder};
/// use gibbs_core::{FactorGraph, Variable};
///
/// let mut builder = FactorGraphBuilder::new();
/// let a = builder.add_variable(Variable::boolean(0)).unwrap();
/// let w = builder.add_weight(2.0, false);
/// builder
///     .add_factor(FactorFunction::IsTrue, w, vec![FactorEdge::positive(a)])
///     .unwrap();
///
/// let graph = builder.build();
/// assert_eq!(graph.n_variables(), 1);
/// assert_eq!(graph.initial_weight_values(), vec![2.0]);
/// ```
#[derive(Debug, Default)]
pub struct FactorGraphBuilder {
    variables: Vec<Variable>,
    weights: Vec<Weight>,
    factors: Vec<Factor>,
}

impl FactorGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    /// Add a variable whose id must be the next free id.
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableId, GraphError> {
        let expected = self.variables.len();
        if variable.id != expected {
            return Err(GraphError::VariableIdMismatch {
                expected,
                got: variable.id,
            });
        }
        self.variables.push(variable);
        Ok(expected)
    }

    pub fn add_weight(&mut self, initial_value: f64, is_fixed: bool) -> WeightId {
        let id = self.weights.len();
        self.weights.push(Weight {
            id,
            initial_value,
            is_fixed,
        });
        id
    }

    pub fn add_factor(
        &mut self,
        function: FactorFunction,
        weight: WeightId,
        edges: Vec<FactorEdge>,
    ) -> Result<FactorId, GraphError> {
        if weight >= self.weights.len() {
            return Err(GraphError::UnknownWeight { weight });
        }

        let arity = edges.len();
        if arity < function.min_arity() || function.max_arity().is_some_and(|max| arity > max) {
            return Err(GraphError::Arity { function, arity });
        }

        for edge in &edges {
            let variable = self
                .variables
                .get(edge.variable)
                .ok_or(GraphError::UnknownVariable {
                    variable: edge.variable,
                })?;
            if !variable.domain.contains(edge.equal_to) {
                return Err(GraphError::ValueOutOfDomain {
                    variable: edge.variable,
                    value: edge.equal_to,
                });
            }
        }

        let id = self.factors.len();
        self.factors.push(Factor {
            id,
            function,
            weight,
            edges,
        });
        Ok(id)
    }

    /// Assign multinomial tally offsets and index factors by variable.
    pub fn build(self) -> CompactFactorGraph {
        let FactorGraphBuilder {
            mut variables,
            weights,
            factors,
        } = self;

        let mut n_tallies = 0;
        for variable in variables.iter_mut().filter(|v| !v.is_boolean()) {
            variable.tally_offset = n_tallies;
            n_tallies += variable.cardinality();
        }

        let incidence = factors
            .iter()
            .flat_map(|factor| {
                factor
                    .edges
                    .iter()
                    .map(|edge| edge.variable)
                    .unique()
                    .map(move |vid| (vid, factor.id))
            })
            .sorted_unstable()
            .collect_vec();

        let mut factor_offsets = Vec::with_capacity(variables.len() + 1);
        factor_offsets.push(0);
        let mut cursor = 0;
        for vid in 0..variables.len() {
            while cursor < incidence.len() && incidence[cursor].0 == vid {
                cursor += 1;
            }
            factor_offsets.push(cursor);
        }
        let factor_index = incidence.into_iter().map(|(_, fid)| fid).collect();

        tracing::debug!(
            n_variables = variables.len(),
            n_weights = weights.len(),
            n_factors = factors.len(),
            n_tallies,
            "factor graph built"
        );

        CompactFactorGraph {
            variables,
            weights,
            factors,
            factor_offsets,
            factor_index,
            n_tallies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gibbs_core::FactorGraph;

    #[test]
    fn test_rejects_out_of_order_variable() {
        let mut builder = FactorGraphBuilder::new();
        assert_eq!(
            builder.add_variable(Variable::boolean(1)),
            Err(GraphError::VariableIdMismatch {
                expected: 0,
                got: 1
            })
        );
    }

    #[test]
    fn test_factor_validation() {
        let mut builder = FactorGraphBuilder::new();
        builder.add_variable(Variable::boolean(0)).unwrap();
        builder
            .add_variable(Variable::sparse_multinomial(1, [3, 8]).unwrap())
            .unwrap();
        let w = builder.add_weight(0.0, false);

        assert_eq!(
            builder.add_factor(FactorFunction::IsTrue, 5, vec![FactorEdge::positive(0)]),
            Err(GraphError::UnknownWeight { weight: 5 })
        );
        assert_eq!(
            builder.add_factor(FactorFunction::IsTrue, w, vec![FactorEdge::positive(2)]),
            Err(GraphError::UnknownVariable { variable: 2 })
        );
        assert_eq!(
            builder.add_factor(FactorFunction::IsTrue, w, vec![FactorEdge::equals(1, 4)]),
            Err(GraphError::ValueOutOfDomain {
                variable: 1,
                value: 4
            })
        );
        assert_eq!(
            builder.add_factor(
                FactorFunction::IsTrue,
                w,
                vec![FactorEdge::positive(0), FactorEdge::equals(1, 3)]
            ),
            Err(GraphError::Arity {
                function: FactorFunction::IsTrue,
                arity: 2
            })
        );
        assert_eq!(
            builder.add_factor(FactorFunction::Imply, w, vec![FactorEdge::positive(0)]),
            Err(GraphError::Arity {
                function: FactorFunction::Imply,
                arity: 1
            })
        );
        assert_eq!(
            builder.add_factor(FactorFunction::IsTrue, w, vec![FactorEdge::equals(1, 8)]),
            Ok(0)
        );
    }

    #[test]
    fn test_build_assigns_tally_offsets_and_index() {
        let mut builder = FactorGraphBuilder::new();
        builder.add_variable(Variable::multinomial(0, 3).unwrap()).unwrap();
        builder.add_variable(Variable::boolean(1)).unwrap();
        builder
            .add_variable(Variable::sparse_multinomial(2, [10, 20]).unwrap())
            .unwrap();
        builder.add_variable(Variable::boolean(3)).unwrap();
        let w = builder.add_weight(1.0, false);
        builder
            .add_factor(
                FactorFunction::And,
                w,
                vec![FactorEdge::positive(1), FactorEdge::equals(2, 20)],
            )
            .unwrap();
        builder
            .add_factor(
                FactorFunction::Equal,
                w,
                vec![FactorEdge::positive(1), FactorEdge::negative(1)],
            )
            .unwrap();

        let graph = builder.build();
        assert_eq!(graph.variable(0).tally_offset, 0);
        assert_eq!(graph.variable(2).tally_offset, 3);
        assert_eq!(graph.n_tallies(), 5);

        let ids = |vid| graph.factors_of(vid).map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids(0), Vec::<FactorId>::new());
        assert_eq!(ids(1), vec![0, 1]);
        assert_eq!(ids(2), vec![0]);
        assert_eq!(ids(3), Vec::<FactorId>::new());
    }
}
