//! Action-value function.
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, path::Path};

/// A parametric action-value function $Q(s, \cdot)$.
///
/// The agent owns two independent instances, the policy network and the target
/// network. The target network is synchronized by cloning the policy network,
/// so implementations must perform a deep copy of their parameters in
/// [`Clone::clone`].
pub trait QFunction: Clone {
    /// Configuration.
    type Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned;

    /// Input of the function, typically an observation.
    type Input;

    /// Builds the function.
    fn build(config: &Self::Config) -> Self;

    /// Number of actions, i.e., the length of the output of [`QFunction::forward`].
    fn n_actions(&self) -> usize;

    /// Returns action values, one value per action.
    fn forward(&self, obs: &Self::Input) -> Vec<f32>;

    /// Performs a parameter update towards the given targets.
    ///
    /// `weight` holds the importance sampling weights of the samples.
    /// Returns TD errors `Q(s, a) - target` computed before the update,
    /// in the same order as the inputs.
    fn update_parameters(
        &mut self,
        obs: &[Self::Input],
        act: &[usize],
        tgt: &[f32],
        weight: &[f32],
    ) -> Result<Vec<f32>>;

    /// Saves the parameters in the given file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads the parameters from the given file.
    fn load(&mut self, path: &Path) -> Result<()>;
}
