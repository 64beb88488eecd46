//! # gibbs-observers
//!
//! Turns the aggregates a sampling run accumulates into marginal estimates.
//!
//! ```rust,ignore
//! use gibbs_observers::Marginals;
//!
//! let marginals = Marginals::collect(&**sampler.graph(), sampler.state());
//! let p = marginals.probability(vid, 1);
//! ```

pub mod marginal;

pub use marginal::*;
