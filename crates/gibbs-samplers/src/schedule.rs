use serde::{Deserialize, Serialize};

/// How many inference epochs to run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InferenceSchedule {
    /// The number of inference sweeps over every shard.
    pub n_epochs: usize,
}

impl InferenceSchedule {
    pub fn new(n_epochs: usize) -> Self {
        InferenceSchedule { n_epochs }
    }
}

/// Learning loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSchedule {
    /// The number of SGD sweeps over every shard.
    pub n_epochs: usize,
    /// Step size of the first epoch.
    pub stepsize: f64,
    /// Factor applied to the step size after every epoch.
    pub decay: f64,
}

impl LearningSchedule {
    pub fn new(n_epochs: usize, stepsize: f64) -> Self {
        LearningSchedule {
            n_epochs,
            stepsize,
            decay: 1.0,
        }
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Step size used in epoch `epoch` (0-based).
    pub fn stepsize_at(&self, epoch: usize) -> f64 {
        self.stepsize * self.decay.powi(epoch as i32)
    }
}
