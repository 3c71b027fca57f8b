//! Configuration of PER-DQN agent.
use super::EpsilonGreedy;
use crate::replay_buffer::IwScheduler;
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PerDqn`](super::PerDqn).
///
/// `C` is the configuration of the action-value function.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerDqnConfig<C> {
    /// Configuration of the action-value function.
    pub model_config: C,

    /// Batch size.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f32,

    /// Number of transitions in the replay buffer before optimization starts.
    pub min_transitions_warmup: usize,

    /// Explorer.
    pub explorer: EpsilonGreedy,

    /// Scheduler of the exponent of importance sampling weights.
    pub iw_scheduler: IwScheduler,

    /// Random seed for action sampling.
    pub seed: u64,

    /// If `true`, the agent is built in training mode.
    #[serde(default)]
    pub train: bool,
}

impl<C: Default> Default for PerDqnConfig<C> {
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 64,
            discount_factor: 0.95,
            min_transitions_warmup: 64,
            explorer: EpsilonGreedy::default(),
            iw_scheduler: IwScheduler::default(),
            seed: 42,
            train: false,
        }
    }
}

impl<C> PerDqnConfig<C>
where
    C: Serialize + DeserializeOwned,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, v: C) -> Self {
        self.model_config = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Number of transitions before starting optimization.
    pub fn min_transitions_warmup(mut self, v: usize) -> Self {
        self.min_transitions_warmup = v;
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Scheduler of importance sampling weights.
    pub fn iw_scheduler(mut self, v: IwScheduler) -> Self {
        self.iw_scheduler = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Training mode.
    pub fn train(mut self, v: bool) -> Self {
        self.train = v;
        self
    }

    /// Loads [`PerDqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of PER-DQN agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`PerDqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of PER-DQN agent into {}", path_.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dqn::EpsilonDecay;
    use tempdir::TempDir;

    #[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
    struct ModelConfig {
        n_actions: usize,
        lr: f32,
    }

    #[test]
    fn test_serde_per_dqn_config() -> Result<()> {
        let config = PerDqnConfig::<ModelConfig>::default()
            .model_config(ModelConfig {
                n_actions: 2,
                lr: 0.05,
            })
            .batch_size(32)
            .discount_factor(0.9)
            .min_transitions_warmup(100)
            .explorer(EpsilonGreedy::default().decay(EpsilonDecay::Linear { final_step: 1000 }))
            .iw_scheduler(IwScheduler::new(0.5, 1.0, 1000))
            .seed(7);

        let dir = TempDir::new("per_dqn_config")?;
        let path = dir.path().join("per_dqn_config.yaml");
        config.save(&path)?;
        let config_ = PerDqnConfig::<ModelConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
