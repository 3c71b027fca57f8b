//! Configuration of [`PrioritizedReplayBuffer`](super::PrioritizedReplayBuffer).
use super::{WeightNormalizer, WeightNormalizer::Batch};
use crate::error::PerDqnError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of prioritized experience replay.
///
/// TD errors written back after an optimization step are turned into
/// priorities with $p=\min\left(|\delta|+\epsilon, p_{\max}\right)^\alpha$.
/// A transition entering the buffer is not clipped, so a large TD error on
/// arrival gives a priority above $p_{\max}^\alpha$.
/// As `eps` must be positive, every stored transition keeps a non-zero
/// probability of being sampled.
///
/// ```rust
/// use perdqn_core::replay_buffer::{PerConfig, WeightNormalizer};
///
/// let config = PerConfig::default()
///     .alpha(0.6)
///     .eps(0.01)
///     .clip_max(Some(1.0))
///     .normalize(WeightNormalizer::Batch);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Exponent for prioritization. `0` results in uniform sampling.
    pub alpha: f32,

    /// Offset added to absolute TD errors. Must be positive.
    pub eps: f32,

    /// Upper bound of absolute TD errors (after adding `eps`).
    pub clip_max: Option<f32>,

    /// Method for normalizing importance sampling weights.
    pub normalize: WeightNormalizer,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            eps: 0.01,
            clip_max: Some(1.0),
            normalize: Batch,
        }
    }
}

impl PerConfig {
    /// Sets the prioritization exponent `alpha`.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the offset added to absolute TD errors.
    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Sets the upper bound of absolute TD errors.
    pub fn clip_max(mut self, clip_max: Option<f32>) -> Self {
        self.clip_max = clip_max;
        self
    }

    /// Sets the method for normalizing importance weights.
    pub fn normalize(mut self, normalize: WeightNormalizer) -> Self {
        self.normalize = normalize;
        self
    }

    /// Converts a TD error into a priority, clipped by `clip_max`.
    ///
    /// Used when priorities are written back after an optimization step.
    pub fn priority(&self, td_err: f32) -> Result<f32, PerDqnError> {
        let p = Self::check(td_err)?.abs() + self.eps;
        let p = match self.clip_max {
            Some(max) => p.min(max),
            None => p,
        };
        Ok(p.powf(self.alpha))
    }

    /// Converts the TD error of a newly pushed transition into a priority.
    ///
    /// `clip_max` is not applied.
    pub fn initial_priority(&self, td_err: f32) -> Result<f32, PerDqnError> {
        Ok((Self::check(td_err)?.abs() + self.eps).powf(self.alpha))
    }

    fn check(td_err: f32) -> Result<f32, PerDqnError> {
        if td_err.is_finite() {
            Ok(td_err)
        } else {
            Err(PerDqnError::NumericInstability(format!(
                "TD error {}",
                td_err
            )))
        }
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), PerDqnError> {
        if self.eps.is_nan() || self.eps <= 0.0 || self.eps.is_infinite() {
            return Err(PerDqnError::InvalidConfig(format!(
                "eps must be positive, got {}",
                self.eps
            )));
        }
        if self.alpha.is_nan() || self.alpha < 0.0 || self.alpha.is_infinite() {
            return Err(PerDqnError::InvalidConfig(format!(
                "alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        if let Some(max) = self.clip_max {
            if max.is_nan() || max <= 0.0 {
                return Err(PerDqnError::InvalidConfig(format!(
                    "clip_max must be positive, got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}

/// Configuration of [`PrioritizedReplayBuffer`](super::PrioritizedReplayBuffer).
///
/// ```rust
/// use perdqn_core::replay_buffer::{PerConfig, PrioritizedReplayBufferConfig};
///
/// let config = PrioritizedReplayBufferConfig::default()
///     .capacity(10000)
///     .seed(42)
///     .per_config(PerConfig::default());
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PrioritizedReplayBufferConfig {
    /// Maximum number of transitions. The oldest transitions are overwritten
    /// when the buffer is full.
    pub capacity: usize,

    /// Random seed used for sampling transitions.
    pub seed: u64,

    /// Configuration of prioritization.
    pub per_config: PerConfig,
}

impl Default for PrioritizedReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            seed: 42,
            per_config: PerConfig::default(),
        }
    }
}

impl PrioritizedReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the configuration of prioritization.
    pub fn per_config(mut self, per_config: PerConfig) -> Self {
        self.per_config = per_config;
        self
    }

    /// Loads the configuration from a YAML file.
    ///
    /// Fails with [`PerDqnError::InvalidConfig`] if the parameters of
    /// prioritization are out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b: Self = serde_yaml::from_reader(rdr)?;
        b.per_config.validate()?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
