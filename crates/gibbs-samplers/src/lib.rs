//! # gibbs-samplers
//!
//! Multi-threaded Gibbs sampling and weight learning over a [`FactorGraph`].
//!
//! - **Conditional sampler**: draws one variable from its conditional
//!   distribution, boolean or multinomial (dense or sparse), in log space
//!   via [`ConditionalSampler`]
//! - **Shard worker**: sweeps one contiguous shard of variables for inference
//!   or SGD via [`ShardWorker`]
//! - **Coordinator**: partitions the variables and fork/joins one worker per
//!   thread each epoch via [`GibbsSampler`]
//!
//! ## RNG streams
//!
//! ```rust
//! use gibbs_samplers::{Rand48, RngKey};
//!
//! let keys = RngKey::new(42).split(4);
//! let mut rng = Rand48::from_key(keys[0]);
//! let r = rng.next_f64();
//! assert!((0.0..1.0).contains(&r));
//! ```
//!
//! ## Running epochs
//!
//! ```rust,ignore
//! use gibbs_samplers::{GibbsSampler, InferenceSchedule, run_inference};
//!
//! let mut sampler = GibbsSampler::new(graph, &weights, &config)?;
//! run_inference(&mut sampler, &InferenceSchedule::new(1000))?;
//! ```
//!
//! [`FactorGraph`]: gibbs_core::FactorGraph

pub mod conditional;
pub mod coordinator;
pub mod error;
pub mod rng;
pub mod sampling;
pub mod schedule;
pub mod worker;

pub use conditional::*;
pub use coordinator::*;
pub use error::*;
pub use rng::*;
pub use sampling::*;
pub use schedule::*;
pub use worker::*;
