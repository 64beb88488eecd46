//! Multi-threaded sampling coordinator.
//!
//! [`GibbsSampler`] splits the variable ids into one contiguous [`Shard`] per
//! worker and runs epochs fork/join style:
//!
//! ```text
//! Idle ──sample()/sample_sgd()──▶ Dispatched ──wait()──▶ Idle
//! ```
//!
//! Each dispatch moves every [`ShardWorker`] onto its own thread; `wait()`
//! joins them and moves them back. Dispatching always joins the previous
//! epoch first, so two epochs can never be in flight at once.

use crate::error::SamplerError;
use crate::rng::{Rand48, RngKey};
use crate::worker::ShardWorker;
use gibbs_core::{FactorGraph, InferenceState, SamplerConfig, Shard};
use serde::Serialize;
use std::any::Any;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// What an epoch does on every shard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EpochKind {
    /// Inference sweep, aggregating samples for marginals.
    Inference { epoch: usize },
    /// Stochastic-gradient sweep updating weights.
    Learning { stepsize: f64 },
}

/// Result of one joined epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochSummary {
    pub kind: EpochKind,
    /// Variables sampled (inference) or learned from (learning), over all shards.
    pub processed: usize,
    pub elapsed: Duration,
}

type WorkerOutcome<G> = (ShardWorker<G>, Result<usize, SamplerError>);
type WorkerHandle<G> = JoinHandle<WorkerOutcome<G>>;

/// Outcome of joining one epoch's handles.
struct Joined {
    processed: usize,
    first_error: Option<SamplerError>,
    panic: Option<Box<dyn Any + Send>>,
}

enum Phase<G: FactorGraph + ?Sized> {
    Idle,
    Dispatched {
        kind: EpochKind,
        started: Instant,
        handles: Vec<WorkerHandle<G>>,
    },
}

/// Gibbs sampler for one node: `n_threads` shard workers over a shared
/// graph and inference state.
pub struct GibbsSampler<G: FactorGraph + ?Sized + 'static> {
    graph: Arc<G>,
    state: Arc<InferenceState>,
    shards: Vec<Shard>,
    /// Empty while an epoch is dispatched.
    workers: Vec<ShardWorker<G>>,
    phase: Phase<G>,
    config: SamplerConfig,
}

impl<G: FactorGraph + ?Sized + 'static> GibbsSampler<G> {
    /// Build a sampler with fresh inference state seeded from the variables'
    /// evidence-mode values and `weights`.
    pub fn new(
        graph: Arc<G>,
        weights: &[f64],
        config: &SamplerConfig,
    ) -> Result<Self, SamplerError> {
        let state = InferenceState::new(graph.variables(), weights)?;
        Self::with_state(graph, Arc::new(state), config)
    }

    /// Build a sampler over caller-allocated inference state.
    pub fn with_state(
        graph: Arc<G>,
        state: Arc<InferenceState>,
        config: &SamplerConfig,
    ) -> Result<Self, SamplerError> {
        config.validate()?;
        state.check_covers(graph.variables())?;

        let n_variables = graph.n_variables();
        let shards = Shard::partition(n_variables, config.n_threads);
        let base_key = config.seed.map(RngKey::new).unwrap_or_else(RngKey::random);

        let workers = shards
            .iter()
            .zip(base_key.split(config.n_threads))
            .map(|(&shard, key)| {
                ShardWorker::new(
                    Arc::clone(&graph),
                    Arc::clone(&state),
                    shard,
                    Rand48::from_key(key),
                    config,
                )
            })
            .collect();

        tracing::info!(
            node = config.node_id,
            n_threads = config.n_threads,
            n_variables,
            sample_evidence = config.sample_evidence,
            learn_non_evidence = config.learn_non_evidence,
            "gibbs sampler ready"
        );

        Ok(GibbsSampler {
            graph,
            state,
            shards,
            workers,
            phase: Phase::Idle,
            config: config.clone(),
        })
    }

    pub fn graph(&self) -> &Arc<G> {
        &self.graph
    }

    pub fn state(&self) -> &Arc<InferenceState> {
        &self.state
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    pub fn n_threads(&self) -> usize {
        self.shards.len()
    }

    pub fn node_id(&self) -> usize {
        self.config.node_id
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self.phase, Phase::Dispatched { .. })
    }

    /// Dispatch an inference sweep on every shard. Returns once the workers
    /// are running; call [`GibbsSampler::wait`] to join them.
    pub fn sample(&mut self, epoch: usize) -> Result<(), SamplerError> {
        self.dispatch(EpochKind::Inference { epoch })
    }

    /// Dispatch an SGD sweep on every shard.
    pub fn sample_sgd(&mut self, stepsize: f64) -> Result<(), SamplerError> {
        self.dispatch(EpochKind::Learning { stepsize })
    }

    /// Run one inference epoch to completion.
    pub fn run_inference_epoch(&mut self, epoch: usize) -> Result<EpochSummary, SamplerError> {
        self.run(EpochKind::Inference { epoch })
    }

    /// Run one learning epoch to completion.
    pub fn run_learning_epoch(&mut self, stepsize: f64) -> Result<EpochSummary, SamplerError> {
        self.run(EpochKind::Learning { stepsize })
    }

    /// Block until the dispatched epoch's workers have all finished.
    ///
    /// Returns `Ok(None)` when nothing is in flight. If any worker failed,
    /// the first failure (in shard order) is returned after every worker has
    /// been joined. A panicking worker is re-raised here, after its shard has
    /// been given a freshly seeded worker so the sampler stays usable.
    pub fn wait(&mut self) -> Result<Option<EpochSummary>, SamplerError> {
        let Phase::Dispatched {
            kind,
            started,
            handles,
        } = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return Ok(None);
        };

        let Joined {
            processed,
            first_error,
            panic,
        } = self.join_workers(handles);
        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }
        if let Some(err) = first_error {
            tracing::error!(node = self.config.node_id, ?kind, error = %err, "epoch failed");
            return Err(err);
        }

        let summary = EpochSummary {
            kind,
            processed,
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            node = self.config.node_id,
            ?kind,
            processed,
            elapsed_ms = summary.elapsed.as_secs_f64() * 1e3,
            "epoch complete"
        );
        Ok(Some(summary))
    }

    /// Reseed one worker's RNG stream. Joins any in-flight epoch first.
    pub fn set_random_seed(&mut self, worker: usize, seed: [u16; 3]) -> Result<(), SamplerError> {
        self.wait()?;
        let n_workers = self.workers.len();
        let target = self
            .workers
            .get_mut(worker)
            .ok_or(SamplerError::NoSuchWorker { worker, n_workers })?;
        target.set_random_seed(seed[0], seed[1], seed[2]);
        Ok(())
    }

    /// Reseed every worker from independent splits of `key`.
    pub fn reseed_all(&mut self, key: RngKey) -> Result<(), SamplerError> {
        self.wait()?;
        for (worker, key) in self.workers.iter_mut().zip(key.split(self.shards.len())) {
            let [s0, s1, s2] = Rand48::from_key(key).triple();
            worker.set_random_seed(s0, s1, s2);
        }
        Ok(())
    }

    fn run(&mut self, kind: EpochKind) -> Result<EpochSummary, SamplerError> {
        self.dispatch(kind)?;
        Ok(self.wait()?.unwrap_or(EpochSummary {
            kind,
            processed: 0,
            elapsed: Duration::ZERO,
        }))
    }

    fn dispatch(&mut self, kind: EpochKind) -> Result<(), SamplerError> {
        self.wait()?;

        let mut handles = Vec::with_capacity(self.shards.len());
        let mut pending = std::mem::take(&mut self.workers).into_iter().enumerate();
        while let Some((i, worker)) = pending.next() {
            match spawn_worker(self.config.node_id, i, kind, worker) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    let rest = pending.map(|(_, worker)| worker);
                    return Err(self.recover_failed_spawn(i, &err, handles, rest));
                }
            }
        }

        self.phase = Phase::Dispatched {
            kind,
            started: Instant::now(),
            handles,
        };
        Ok(())
    }

    /// Join the workers spawned before worker `failed` could not be, and put
    /// every shard's worker back in place.
    fn recover_failed_spawn(
        &mut self,
        failed: usize,
        err: &io::Error,
        handles: Vec<WorkerHandle<G>>,
        rest: impl Iterator<Item = ShardWorker<G>>,
    ) -> SamplerError {
        let joined = self.join_workers(handles);
        // The failed closure owned the worker, so it is gone with it.
        let replacement = self.fresh_worker(failed);
        self.workers.push(replacement);
        self.workers.extend(rest);
        if let Some(payload) = joined.panic {
            std::panic::resume_unwind(payload);
        }

        tracing::error!(
            node = self.config.node_id,
            worker = failed,
            error = %err,
            "failed to spawn sampler worker"
        );
        SamplerError::Spawn {
            worker: failed,
            reason: err.to_string(),
        }
    }

    /// Join `handles` (in shard order, starting at shard 0) and move their
    /// workers back. A worker lost to a panic is replaced by a fresh one.
    fn join_workers(&mut self, handles: Vec<WorkerHandle<G>>) -> Joined {
        let mut joined = Joined {
            processed: 0,
            first_error: None,
            panic: None,
        };
        for (i, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok((worker, result)) => {
                    self.workers.push(worker);
                    match result {
                        Ok(n) => joined.processed += n,
                        Err(err) => {
                            joined.first_error.get_or_insert(err);
                        }
                    }
                }
                Err(payload) => {
                    tracing::error!(
                        node = self.config.node_id,
                        worker = i,
                        "sampler worker panicked; replacing it"
                    );
                    let replacement = self.fresh_worker(i);
                    self.workers.push(replacement);
                    joined.panic.get_or_insert(payload);
                }
            }
        }
        joined
    }

    fn fresh_worker(&self, i: usize) -> ShardWorker<G> {
        ShardWorker::new(
            Arc::clone(&self.graph),
            Arc::clone(&self.state),
            self.shards[i],
            Rand48::from_key(RngKey::random()),
            &self.config,
        )
    }
}

fn spawn_worker<G: FactorGraph + ?Sized + 'static>(
    node_id: usize,
    i: usize,
    kind: EpochKind,
    mut worker: ShardWorker<G>,
) -> io::Result<WorkerHandle<G>> {
    thread::Builder::new()
        .name(format!("gibbs-n{node_id}-w{i}"))
        .spawn(move || {
            let result = match kind {
                EpochKind::Inference { .. } => worker.sweep(),
                EpochKind::Learning { stepsize } => worker.sgd_sweep(stepsize),
            };
            (worker, result)
        })
}

impl<G: FactorGraph + ?Sized + 'static> Drop for GibbsSampler<G> {
    fn drop(&mut self) {
        if let Phase::Dispatched { handles, .. } = std::mem::replace(&mut self.phase, Phase::Idle) {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}
