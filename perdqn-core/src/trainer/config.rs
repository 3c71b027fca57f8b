//! Configuration of [`Trainer`](super::Trainer).
use crate::error::PerDqnError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub train_episodes: usize,

    /// The number of evaluation episodes.
    pub test_episodes: usize,

    /// The maximum number of environment steps in an episode.
    pub max_steps: usize,

    /// Interval of synchronizing the target network in episodes.
    ///
    /// Must be at least 1; [`TrainerConfig::load`] and
    /// [`Trainer::train`](super::Trainer::train) reject `0`.
    pub target_update_interval: usize,

    /// Where to save the trained model.
    #[serde(default)]
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            train_episodes: 200,
            test_episodes: 20,
            max_steps: 200,
            target_update_interval: 4,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn train_episodes(mut self, v: usize) -> Self {
        self.train_episodes = v;
        self
    }

    /// Sets the number of evaluation episodes.
    pub fn test_episodes(mut self, v: usize) -> Self {
        self.test_episodes = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the interval of synchronizing the target network in episodes.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the directory where the trained model is saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), PerDqnError> {
        if self.target_update_interval == 0 {
            return Err(PerDqnError::InvalidConfig(
                "target_update_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b: Self = serde_yaml::from_reader(rdr)?;
        b.validate()?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
