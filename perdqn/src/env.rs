//! A corridor environment with discrete actions.
use anyhow::{ensure, Result};
use log::debug;
use perdqn_core::{Env, Step};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration of [`Corridor`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CorridorConfig {
    /// Number of cells, including the start and the goal.
    pub length: usize,

    /// Probability that the action is replaced with the opposite one.
    pub slip: f32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            length: 5,
            slip: 0.0,
        }
    }
}

impl CorridorConfig {
    /// Sets the number of cells.
    pub fn length(mut self, v: usize) -> Self {
        self.length = v;
        self
    }

    /// Sets the slip probability.
    pub fn slip(mut self, v: f32) -> Self {
        self.slip = v;
        self
    }
}

/// A one-dimensional corridor.
///
/// The agent starts at the leftmost cell and moves left (action `0`) or right
/// (action `1`). Reaching the rightmost cell gives reward `1` and terminates the
/// episode; every other step gives reward `0`. Observations are one-hot vectors
/// of the position.
pub struct Corridor {
    length: usize,
    slip: f32,
    pos: usize,
    rng: StdRng,
}

impl Corridor {
    /// Current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn obs(&self) -> Vec<f32> {
        let mut obs = vec![0.0; self.length];
        obs[self.pos] = 1.0;
        obs
    }
}

impl Env for Corridor {
    type Config = CorridorConfig;
    type Obs = Vec<f32>;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        ensure!(config.length >= 2, "Corridor length must be at least 2");
        ensure!(
            (0.0..=1.0).contains(&config.slip),
            "Slip probability must be in [0, 1]"
        );

        Ok(Self {
            length: config.length,
            slip: config.slip,
            pos: 0,
            rng: StdRng::seed_from_u64(seed as u64),
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.pos = 0;
        Ok(self.obs())
    }

    fn step(&mut self, act: usize) -> Result<Step<Self>> {
        ensure!(act < 2, "Invalid action {}", act);
        let right = (act == 1) != (self.slip > 0.0 && self.rng.gen::<f32>() < self.slip);
        self.pos = if right {
            self.pos + 1
        } else {
            self.pos.saturating_sub(1)
        };

        let is_terminated = self.pos == self.length - 1;
        let reward = if is_terminated { 1.0 } else { 0.0 };
        if is_terminated {
            debug!("Reached the goal");
        }

        Ok(Step::new(self.obs(), act, reward, is_terminated, false, ()))
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn obs_dim(&self) -> usize {
        self.length
    }
}
