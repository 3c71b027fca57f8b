use crate::env::CorridorConfig;
use anyhow::Result;
use log::info;
use perdqn_core::{
    dqn::{EpsilonGreedy, PerDqnConfig},
    replay_buffer::{IwScheduler, PerConfig, PrioritizedReplayBufferConfig},
    TrainerConfig,
};
use perdqn_policy_no_backend::LinearQConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

const LENGTH: usize = 5;
const LR: f32 = 0.5;
const BATCH_SIZE: usize = 16;
const MIN_TRANSITIONS_WARMUP: usize = 32;
const DISCOUNT_FACTOR: f32 = 0.9;
const REPLAY_BUFFER_CAPACITY: usize = 10_000;
const TRAIN_EPISODES: usize = 100;
const TEST_EPISODES: usize = 5;
const MAX_STEPS: usize = 50;
const TARGET_UPDATE_INTERVAL: usize = 1;

/// Configuration of the training program.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PerDqnCorridorConfig {
    /// Random seed of the environment.
    pub seed: i64,

    /// Configuration of the environment.
    pub env_config: CorridorConfig,

    /// Configuration of the agent.
    pub agent_config: PerDqnConfig<LinearQConfig>,

    /// Configuration of the replay buffer.
    pub replay_buffer_config: PrioritizedReplayBufferConfig,

    /// Configuration of the training loop.
    pub trainer_config: TrainerConfig,
}

impl Default for PerDqnCorridorConfig {
    fn default() -> Self {
        let env_config = CorridorConfig::default().length(LENGTH);
        let model_config = LinearQConfig::default()
            .obs_dim(LENGTH)
            .n_actions(2)
            .lr(LR);
        let agent_config = PerDqnConfig::default()
            .model_config(model_config)
            .batch_size(BATCH_SIZE)
            .min_transitions_warmup(MIN_TRANSITIONS_WARMUP)
            .discount_factor(DISCOUNT_FACTOR)
            .explorer(EpsilonGreedy::default())
            .iw_scheduler(IwScheduler::default());
        let replay_buffer_config = PrioritizedReplayBufferConfig::default()
            .capacity(REPLAY_BUFFER_CAPACITY)
            .per_config(PerConfig::default());
        let trainer_config = TrainerConfig::default()
            .train_episodes(TRAIN_EPISODES)
            .test_episodes(TEST_EPISODES)
            .max_steps(MAX_STEPS)
            .target_update_interval(TARGET_UPDATE_INTERVAL);

        Self {
            seed: 0,
            env_config,
            agent_config,
            replay_buffer_config,
            trainer_config,
        }
    }
}

impl PerDqnCorridorConfig {
    /// Sets the length of the corridor, changing the observation dimension accordingly.
    pub fn length(mut self, length: usize) -> Self {
        self.env_config.length = length;
        self.agent_config.model_config.obs_dim = length;
        self
    }

    /// Sets the directory where the trained model is saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.trainer_config = self.trainer_config.model_dir(model_dir);
        self
    }

    /// Checks the parameters of the replay buffer and the training loop.
    pub fn validate(&self) -> Result<()> {
        self.replay_buffer_config.per_config.validate()?;
        self.trainer_config.validate()?;
        Ok(())
    }

    /// Loads the configuration from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b: Self = serde_yaml::from_reader(rdr)?;
        b.validate()?;
        info!("Load config from {}", path_.display());
        Ok(b)
    }

    /// Saves the configuration into YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config into {}", path_.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = PerDqnCorridorConfig::default().length(7).model_dir("model");
        assert_eq!(config.agent_config.model_config.obs_dim, 7);

        let dir = TempDir::new("per_dqn_corridor")?;
        let path = dir.path().join("config.yaml");
        config.save(&path)?;
        let config_ = PerDqnCorridorConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_config() -> Result<()> {
        let dir = TempDir::new("per_dqn_corridor")?;
        let path = dir.path().join("config.yaml");

        let mut config = PerDqnCorridorConfig::default();
        config.replay_buffer_config.per_config.eps = 0.0;
        config.save(&path)?;
        assert!(PerDqnCorridorConfig::load(&path).is_err());

        let mut config = PerDqnCorridorConfig::default();
        config.trainer_config.target_update_interval = 0;
        config.save(&path)?;
        assert!(PerDqnCorridorConfig::load(&path).is_err());
        Ok(())
    }
}
