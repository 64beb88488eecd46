//! # gibbs-models
//!
//! A reference [`FactorGraph`](gibbs_core::FactorGraph) implementation: boolean
//! and multinomial variables connected by weighted logical factors.
//!
//! - [`FactorGraphBuilder`] validates variables, weights and factor literals,
//!   assigns multinomial tally offsets and builds the variable → factor index
//! - [`CompactFactorGraph`] computes potentials as
//!   `Σ weight · f(assignment with v := value)` over the factors touching `v`
//!   and learns with `w += stepsize · (f(evid) − f(free))`

pub mod builder;
pub mod error;
pub mod factor;
pub mod graph;

pub use builder::FactorGraphBuilder;
pub use error::GraphError;
pub use factor::{Factor, FactorEdge, FactorFunction, FactorId, Weight, WeightId};
pub use graph::CompactFactorGraph;
