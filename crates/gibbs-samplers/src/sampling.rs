//! Run loops driving a [`GibbsSampler`] through a schedule.

use crate::coordinator::{EpochSummary, GibbsSampler};
use crate::error::SamplerError;
use crate::schedule::{InferenceSchedule, LearningSchedule};
use gibbs_core::FactorGraph;
use std::time::Instant;

/// Run `schedule.n_epochs` inference epochs, accumulating marginal
/// aggregates in the sampler's state.
pub fn run_inference<G>(
    sampler: &mut GibbsSampler<G>,
    schedule: &InferenceSchedule,
) -> Result<Vec<EpochSummary>, SamplerError>
where
    G: FactorGraph + ?Sized + 'static,
{
    let started = Instant::now();
    let summaries = (0..schedule.n_epochs)
        .map(|epoch| sampler.run_inference_epoch(epoch))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        node = sampler.node_id(),
        n_epochs = schedule.n_epochs,
        elapsed_s = started.elapsed().as_secs_f64(),
        "inference finished"
    );
    Ok(summaries)
}

/// Run `schedule.n_epochs` SGD epochs, decaying the step size after each.
pub fn run_learning<G>(
    sampler: &mut GibbsSampler<G>,
    schedule: &LearningSchedule,
) -> Result<Vec<EpochSummary>, SamplerError>
where
    G: FactorGraph + ?Sized + 'static,
{
    let started = Instant::now();
    let summaries = (0..schedule.n_epochs)
        .map(|epoch| sampler.run_learning_epoch(schedule.stepsize_at(epoch)))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        node = sampler.node_id(),
        n_epochs = schedule.n_epochs,
        final_stepsize = schedule.stepsize_at(schedule.n_epochs.saturating_sub(1)),
        elapsed_s = started.elapsed().as_secs_f64(),
        "learning finished"
    );
    Ok(summaries)
}
