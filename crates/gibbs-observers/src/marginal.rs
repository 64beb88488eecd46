//! Marginal estimates from sampling aggregates.
//!
//! Boolean variables estimate `P(1)` as the running sum over the sample
//! count. Multinomial variables estimate each domain value's probability as
//! its tally over the sample count, listed in domain order. Evidence and
//! observations report their pinned value with probability 1, whether or not
//! the run resampled them.

use gibbs_core::{DomainType, FactorGraph, InferenceState, Variable, VariableId, VariableValue};
use serde::Serialize;

/// Estimated distribution of one variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Marginal {
    /// Evidence or observation, fixed at `value`.
    Fixed { value: VariableValue },
    Boolean { p_true: f64 },
    /// `(value, probability)` in domain order.
    Multinomial {
        probabilities: Vec<(VariableValue, f64)>,
    },
}

impl Marginal {
    /// Estimated probability of `value`; zero for values outside the domain.
    pub fn probability(&self, value: VariableValue) -> f64 {
        match self {
            Marginal::Fixed { value: fixed } => {
                if *fixed == value {
                    1.0
                } else {
                    0.0
                }
            }
            Marginal::Boolean { p_true } => match value {
                1 => *p_true,
                0 => 1.0 - p_true,
                _ => 0.0,
            },
            Marginal::Multinomial { probabilities } => probabilities
                .iter()
                .find(|(v, _)| *v == value)
                .map_or(0.0, |(_, p)| *p),
        }
    }

    /// Value with the highest estimated probability; the first one on ties.
    pub fn most_likely(&self) -> Option<VariableValue> {
        match self {
            Marginal::Fixed { value } => Some(*value),
            Marginal::Boolean { p_true } => Some(usize::from(*p_true > 0.5)),
            Marginal::Multinomial { probabilities } => probabilities
                .iter()
                .fold(None, |best: Option<(VariableValue, f64)>, &(v, p)| match best {
                    Some((_, best_p)) if best_p >= p => best,
                    _ => Some((v, p)),
                })
                .map(|(v, _)| v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableMarginal {
    pub variable: VariableId,
    /// Samples aggregated for this variable.
    pub nsamples: u64,
    pub marginal: Marginal,
}

/// Per-variable marginals of one run, indexed by variable id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Marginals {
    entries: Vec<Option<VariableMarginal>>,
}

impl Marginals {
    /// Read the aggregates of `state` into marginals for every variable of
    /// `graph`. Free variables that were never sampled get no estimate.
    pub fn collect<G>(graph: &G, state: &InferenceState) -> Self
    where
        G: FactorGraph + ?Sized,
    {
        let entries = graph
            .variables()
            .iter()
            .map(|variable| estimate(variable, state))
            .collect();
        Marginals { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: VariableId) -> Option<&VariableMarginal> {
        self.entries.get(id).and_then(Option::as_ref)
    }

    /// Shorthand for `get(id)` then [`Marginal::probability`].
    pub fn probability(&self, id: VariableId, value: VariableValue) -> Option<f64> {
        self.get(id).map(|entry| entry.marginal.probability(value))
    }

    /// Variables that have an estimate, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableMarginal> + '_ {
        self.entries.iter().flatten()
    }

    pub fn n_estimated(&self) -> usize {
        self.iter().count()
    }
}

fn estimate(variable: &Variable, state: &InferenceState) -> Option<VariableMarginal> {
    let nsamples = state.aggregates.nsamples(variable.id);

    let marginal = if variable.is_evid {
        Marginal::Fixed {
            value: variable.assignment_evid,
        }
    } else {
        if nsamples == 0 {
            return None;
        }
        let n = nsamples as f64;
        match variable.domain_type {
            DomainType::Boolean => Marginal::Boolean {
                p_true: state.aggregates.mean_sum(variable.id) / n,
            },
            DomainType::Multinomial => Marginal::Multinomial {
                probabilities: variable
                    .domain
                    .iter()
                    .map(|(value, index)| {
                        let tally = state.aggregates.tally(variable.tally_offset + index);
                        (value, tally as f64 / n)
                    })
                    .collect(),
            },
            _ => return None,
        }
    };

    Some(VariableMarginal {
        variable: variable.id,
        nsamples,
        marginal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_lookup() {
        let fixed = Marginal::Fixed { value: 3 };
        assert_eq!(fixed.probability(3), 1.0);
        assert_eq!(fixed.probability(2), 0.0);

        let boolean = Marginal::Boolean { p_true: 0.25 };
        assert_eq!(boolean.probability(1), 0.25);
        assert_eq!(boolean.probability(0), 0.75);
        assert_eq!(boolean.probability(2), 0.0);
        assert_eq!(boolean.most_likely(), Some(0));

        let multinomial = Marginal::Multinomial {
            probabilities: vec![(4, 0.2), (7, 0.5), (9, 0.3)],
        };
        assert_eq!(multinomial.probability(7), 0.5);
        assert_eq!(multinomial.probability(5), 0.0);
        assert_eq!(multinomial.most_likely(), Some(7));
    }

    #[test]
    fn test_most_likely_prefers_first_on_ties() {
        let multinomial = Marginal::Multinomial {
            probabilities: vec![(1, 0.5), (2, 0.5)],
        };
        assert_eq!(multinomial.most_likely(), Some(1));
        let empty = Marginal::Multinomial {
            probabilities: Vec::new(),
        };
        assert_eq!(empty.most_likely(), None);
    }
}
