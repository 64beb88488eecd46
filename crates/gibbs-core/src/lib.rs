//! # gibbs-core
//!
//! Core types for the Hogwild Gibbs sampler.
//!
//! - [`Variable`]: a boolean or multinomial random variable, with its
//!   [`Domain`] (dense or sparse) and evidence/observation flags
//! - [`Shard`]: a contiguous `[start, end)` range of variable ids owned by one worker
//! - [`InferenceState`]: evidence/free assignment vectors, weight values and
//!   marginal aggregates, shared lock-free between workers
//! - [`FactorGraph`]: the interface a model implements to be sampled
//! - [`SamplerConfig`]: layered run configuration (CLI/env > file > defaults)
//!
//! ## Consistency model
//!
//! Assignment writes are partitioned by shard; reads of other shards'
//! variables are unsynchronized relaxed loads. A worker may see a
//! neighbour's value from just before or just after that neighbour's
//! concurrent update. This is the accepted approximation that keeps sampling
//! lock-free.

pub mod config;
pub mod error;
pub mod graph;
pub mod shard;
pub mod state;
pub mod variable;

pub use config::*;
pub use error::*;
pub use graph::*;
pub use shard::*;
pub use state::*;
pub use variable::*;
