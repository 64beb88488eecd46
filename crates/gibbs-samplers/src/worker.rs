use crate::conditional::ConditionalSampler;
use crate::error::SamplerError;
use crate::rng::Rand48;
use gibbs_core::{
    CoreError, DomainType, FactorGraph, InferenceState, SamplerConfig, Shard, ShardWriter,
    Variable, VariableId, VariableValue,
};
use std::sync::Arc;

/// Samples the variables of one shard.
///
/// A worker owns its shard range, RNG stream and scratch buffer. It shares
/// the graph and inference state with every other worker of the run, and
/// writes assignments only inside its own shard.
pub struct ShardWorker<G: FactorGraph + ?Sized> {
    shard: Shard,
    sampler: ConditionalSampler,
    graph: Arc<G>,
    state: Arc<InferenceState>,
    sample_evidence: bool,
    learn_non_evidence: bool,
}

impl<G: FactorGraph + ?Sized> ShardWorker<G> {
    pub fn new(
        graph: Arc<G>,
        state: Arc<InferenceState>,
        shard: Shard,
        rng: Rand48,
        config: &SamplerConfig,
    ) -> Self {
        ShardWorker {
            shard,
            sampler: ConditionalSampler::new(rng),
            graph,
            state,
            sample_evidence: config.sample_evidence,
            learn_non_evidence: config.learn_non_evidence,
        }
    }

    pub fn shard(&self) -> Shard {
        self.shard
    }

    pub fn rng(&self) -> &Rand48 {
        self.sampler.rng()
    }

    /// Reset the RNG stream to the given seed triple.
    pub fn set_random_seed(&mut self, s0: u16, s1: u16, s2: u16) {
        self.sampler.reseed([s0, s1, s2]);
    }

    /// One inference sweep over the shard in increasing id order.
    ///
    /// Returns the number of variables sampled (and aggregated); fixed
    /// observations, and evidence unless resampling is enabled, are skipped.
    pub fn sweep(&mut self) -> Result<usize, SamplerError> {
        let state = Arc::clone(&self.state);
        let writer = state.assignments_evid.writer(self.shard);
        let mut sampled = 0;
        for vid in self.shard.ids() {
            if self.sample_single_variable(vid, writer)? {
                sampled += 1;
            }
        }
        tracing::trace!(shard = ?self.shard, sampled, "inference sweep done");
        Ok(sampled)
    }

    /// One stochastic-gradient sweep over the shard.
    ///
    /// Returns the number of variables whose factors received an update.
    pub fn sgd_sweep(&mut self, stepsize: f64) -> Result<usize, SamplerError> {
        let state = Arc::clone(&self.state);
        let evid_writer = state.assignments_evid.writer(self.shard);
        let free_writer = state.assignments_free.writer(self.shard);
        let mut learned = 0;
        for vid in self.shard.ids() {
            if self.sgd_single_variable(vid, stepsize, evid_writer, free_writer)? {
                learned += 1;
            }
        }
        tracing::trace!(shard = ?self.shard, learned, stepsize, "sgd sweep done");
        Ok(learned)
    }

    fn sample_single_variable(
        &mut self,
        vid: VariableId,
        writer: ShardWriter<'_>,
    ) -> Result<bool, SamplerError> {
        let variable = self.graph.variable(vid);
        if variable.is_observation || (variable.is_evid && !self.sample_evidence) {
            return Ok(false);
        }

        let state = &*self.state;
        let proposal = self.sampler.draw(
            &*self.graph,
            variable,
            &state.assignments_evid,
            &state.weight_values,
        )?;
        writer.set(vid, proposal);

        record_sample(state, variable, proposal)?;
        Ok(true)
    }

    // Gradient of a weight is E[f | evidence] - E[f], each expectation
    // estimated from a single draw: the evidence pass keeps evidence pinned,
    // the free pass ignores it.
    fn sgd_single_variable(
        &mut self,
        vid: VariableId,
        stepsize: f64,
        evid_writer: ShardWriter<'_>,
        free_writer: ShardWriter<'_>,
    ) -> Result<bool, SamplerError> {
        let variable = self.graph.variable(vid);
        if variable.is_observation || (!self.learn_non_evidence && !variable.is_evid) {
            return Ok(false);
        }

        let state = &*self.state;
        let graph = &*self.graph;

        let proposal = if variable.is_evid {
            variable.assignment_evid
        } else {
            self.sampler.draw(
                graph,
                variable,
                &state.assignments_evid,
                &state.weight_values,
            )?
        };
        evid_writer.set(vid, proposal);

        let proposal = self.sampler.draw(
            graph,
            variable,
            &state.assignments_free,
            &state.weight_values,
        )?;
        free_writer.set(vid, proposal);

        graph.update_weight(variable, state, stepsize);
        Ok(true)
    }
}

fn record_sample(
    state: &InferenceState,
    variable: &Variable,
    value: VariableValue,
) -> Result<(), SamplerError> {
    match variable.domain_type {
        DomainType::Boolean => state.aggregates.record_boolean(variable.id, value),
        DomainType::Multinomial => {
            let index = variable
                .domain_index(value)
                .ok_or(CoreError::ValueOutOfDomain {
                    variable: variable.id,
                    value,
                })?;
            state
                .aggregates
                .record_multinomial(variable.id, variable.tally_offset + index);
        }
        domain_type => {
            return Err(SamplerError::UnsupportedDomain {
                variable: variable.id,
                domain_type,
            })
        }
    }
    Ok(())
}
