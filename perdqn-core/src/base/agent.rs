//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::{record::Record, replay_buffer::Transition};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
pub trait Agent<E, R>: Policy<E>
where
    E: Env,
    R: ReplayBufferBase<Obs = E::Obs>,
{
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Pushes a transition into `buffer` with an initial priority and
    /// returns the slot where it was stored.
    fn ingest(&mut self, buffer: &mut R, tr: Transition<E::Obs>) -> Result<usize>;

    /// Performs an optimization step.
    ///
    /// Returns `None` without touching `buffer` if the buffer does not yet hold
    /// enough transitions for a batch.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>>;

    /// Copies the parameters of the policy network into the target network.
    fn sync_target(&mut self);

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
