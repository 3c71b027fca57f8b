//! Environment.
use super::{Info, Step};
use anyhow::Result;
use std::fmt::Debug;

/// Represents an environment with a discrete action space.
///
/// Actions are indices in `0..n_actions()`.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Clone + Debug;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performs an environment step.
    fn step(&mut self, act: usize) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Number of actions.
    fn n_actions(&self) -> usize;

    /// Dimension of observations.
    fn obs_dim(&self) -> usize;
}
