//! Conditional sampling of a single variable.
//!
//! ## Boolean
//!
//! With potentials `p1` (value 1) and `p0` (value 0), `P(1) = e^p1 / (e^p1 + e^p0)`.
//! Dividing through by `e^p1` gives the acceptance rule
//!
//! ```text
//! accept 1  iff  r · (1 + e^(p0 − p1)) < 1,   r ~ U[0, 1)
//! ```
//!
//! which only exponentiates the *difference*, so large potentials cannot
//! overflow. A NaN difference selects nothing, as in the multinomial walk.
//!
//! ## Multinomial
//!
//! One pass computes every potential and folds it into a log-sum-exp
//! normaliser; a second pass in the same order subtracts each normalised
//! probability from `r` and stops at the first value where `r ≤ 0`.

use crate::error::SamplerError;
use crate::rng::Rand48;
use gibbs_core::{
    AssignmentVector, DomainType, FactorGraph, Variable, VariableValue, WeightValues,
};

/// Largest shortfall of the cumulative selection that is attributed to
/// floating-point rounding rather than a broken distribution.
pub const ROUNDING_SLACK: f64 = 1e-9;

/// `ln(e^a + e^b)` without overflow.
#[inline]
pub fn logadd(log_a: f64, log_b: f64) -> f64 {
    if log_a == f64::NEG_INFINITY {
        return log_b;
    }
    if log_b == f64::NEG_INFINITY {
        return log_a;
    }
    let (hi, lo) = if log_a > log_b {
        (log_a, log_b)
    } else {
        (log_b, log_a)
    };
    hi + (lo - hi).exp().ln_1p()
}

/// Boolean acceptance rule for uniform draw `r`.
#[inline]
pub fn sample_boolean(potential_pos: f64, potential_neg: f64, r: f64) -> Selection {
    let diff = potential_neg - potential_pos;
    if diff.is_nan() {
        return Selection::Exhausted { residual: diff };
    }
    if r * (1.0 + diff.exp()) < 1.0 {
        Selection::Sampled(1)
    } else {
        Selection::Sampled(0)
    }
}

/// Outcome of selecting a value from a conditional distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    Sampled(VariableValue),
    /// The domain ran out within [`ROUNDING_SLACK`]; the last value is taken.
    RoundingFallback(VariableValue),
    /// The domain ran out with `residual` probability mass unaccounted for.
    Exhausted { residual: f64 },
}

/// Walk `(value, index)` entries subtracting `exp(potentials[index] - log_norm)`
/// from `r`; select the first value where `r ≤ 0`.
pub fn select_categorical<I>(entries: I, potentials: &[f64], log_norm: f64, r: f64) -> Selection
where
    I: IntoIterator<Item = (VariableValue, usize)>,
{
    let mut residual = r;
    let mut last = None;
    for (value, index) in entries {
        residual -= (potentials[index] - log_norm).exp();
        if residual <= 0.0 {
            return Selection::Sampled(value);
        }
        last = Some(value);
    }

    match last {
        Some(value) if residual <= ROUNDING_SLACK => Selection::RoundingFallback(value),
        _ => Selection::Exhausted { residual },
    }
}

/// Draws one value from a variable's conditional distribution.
///
/// Owns one worker's RNG stream and its potential scratch buffer; the buffer
/// grows to the largest multinomial cardinality seen and is never shrunk.
#[derive(Debug, Clone)]
pub struct ConditionalSampler {
    rng: Rand48,
    potentials: Vec<f64>,
}

impl ConditionalSampler {
    pub fn new(rng: Rand48) -> Self {
        ConditionalSampler {
            rng,
            potentials: Vec::new(),
        }
    }

    pub fn rng(&self) -> &Rand48 {
        &self.rng
    }

    pub fn reseed(&mut self, seed: [u16; 3]) {
        self.rng.reseed(seed);
    }

    /// Draw a value for `variable` holding every other variable fixed at its
    /// value in `assignments`.
    pub fn draw<G>(
        &mut self,
        graph: &G,
        variable: &Variable,
        assignments: &AssignmentVector,
        weights: &WeightValues,
    ) -> Result<VariableValue, SamplerError>
    where
        G: FactorGraph + ?Sized,
    {
        match variable.domain_type {
            DomainType::Boolean => {
                let potential_pos = graph.potential(variable, 1, assignments, weights);
                let potential_neg = graph.potential(variable, 0, assignments, weights);
                let r = self.rng.next_f64();
                resolve(variable, sample_boolean(potential_pos, potential_neg, r), r)
            }
            DomainType::Multinomial => self.draw_multinomial(graph, variable, assignments, weights),
            domain_type => Err(SamplerError::UnsupportedDomain {
                variable: variable.id,
                domain_type,
            }),
        }
    }

    fn draw_multinomial<G>(
        &mut self,
        graph: &G,
        variable: &Variable,
        assignments: &AssignmentVector,
        weights: &WeightValues,
    ) -> Result<VariableValue, SamplerError>
    where
        G: FactorGraph + ?Sized,
    {
        let cardinality = variable.cardinality();
        if self.potentials.len() < cardinality {
            self.potentials.resize(cardinality, f64::NEG_INFINITY);
        }

        let mut log_norm = f64::NEG_INFINITY;
        for (value, index) in variable.domain.iter() {
            let potential = graph.potential(variable, value, assignments, weights);
            self.potentials[index] = potential;
            log_norm = logadd(log_norm, potential);
        }

        let r = self.rng.next_f64();
        let selection = select_categorical(variable.domain.iter(), &self.potentials, log_norm, r);
        resolve(variable, selection, r)
    }
}

fn resolve(
    variable: &Variable,
    selection: Selection,
    r: f64,
) -> Result<VariableValue, SamplerError> {
    match selection {
        Selection::Sampled(value) => Ok(value),
        Selection::RoundingFallback(value) => {
            tracing::warn!(
                variable = variable.id,
                r,
                "selection fell through by rounding; taking last value"
            );
            Ok(value)
        }
        Selection::Exhausted { residual } => Err(SamplerError::SelectionExhausted {
            variable: variable.id,
            residual,
        }),
    }
}
