use crate::Mat;
use anyhow::{ensure, Result};
use log::info;
use perdqn_core::QFunction;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Configuration of [`LinearQ`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LinearQConfig {
    /// Dimension of observations.
    pub obs_dim: usize,

    /// Number of actions.
    pub n_actions: usize,

    /// Learning rate.
    pub lr: f32,

    /// Half width of the uniform distribution for initializing weights.
    pub init_scale: f32,

    /// Random seed for initializing weights.
    pub seed: u64,
}

impl Default for LinearQConfig {
    fn default() -> Self {
        Self {
            obs_dim: 1,
            n_actions: 2,
            lr: 0.1,
            init_scale: 0.01,
            seed: 42,
        }
    }
}

impl LinearQConfig {
    /// Sets the dimension of observations.
    pub fn obs_dim(mut self, v: usize) -> Self {
        self.obs_dim = v;
        self
    }

    /// Sets the number of actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the learning rate.
    pub fn lr(mut self, v: f32) -> Self {
        self.lr = v;
        self
    }

    /// Sets the scale of initial weights.
    pub fn init_scale(mut self, v: f32) -> Self {
        self.init_scale = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct Params {
    w: Mat,
    b: Mat,
}

/// Action-value function linear in observations, `Q(s, .) = W s + b`.
///
/// Parameters are updated with a gradient step on the importance-weighted
/// squared TD error averaged over the batch.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearQ {
    params: Params,
    lr: f32,
}

impl LinearQ {
    /// Weights, a matrix of shape `[n_actions, obs_dim]`.
    pub fn weights(&self) -> &Mat {
        &self.params.w
    }

    /// Biases, a column vector of length `n_actions`.
    pub fn biases(&self) -> &Mat {
        &self.params.b
    }

    fn q_value(&self, obs: &[f32], act: usize) -> f32 {
        let w = self.params.w.row(act);
        w.iter().zip(obs.iter()).map(|(w, x)| w * x).sum::<f32>() + self.params.b.data[act]
    }
}

impl QFunction for LinearQ {
    type Config = LinearQConfig;
    type Input = Vec<f32>;

    fn build(config: &Self::Config) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let scale = config.init_scale;
        let w = Mat::from_fn(config.n_actions, config.obs_dim, || {
            if scale > 0.0 {
                rng.gen_range(-scale..scale)
            } else {
                0.0
            }
        });
        let b = Mat::zeros(config.n_actions, 1);

        Self {
            params: Params { w, b },
            lr: config.lr,
        }
    }

    fn n_actions(&self) -> usize {
        self.params.w.n_rows()
    }

    fn forward(&self, obs: &Vec<f32>) -> Vec<f32> {
        self.params
            .w
            .matmul(&obs.clone().into())
            .add(&self.params.b)
            .into()
    }

    fn update_parameters(
        &mut self,
        obs: &[Vec<f32>],
        act: &[usize],
        tgt: &[f32],
        weight: &[f32],
    ) -> Result<Vec<f32>> {
        let n = obs.len();
        ensure!(
            act.len() == n && tgt.len() == n && weight.len() == n,
            "Inconsistent batch: obs {}, act {}, tgt {}, weight {}",
            n,
            act.len(),
            tgt.len(),
            weight.len()
        );
        if n == 0 {
            return Ok(vec![]);
        }

        let (n_actions, obs_dim) = (self.n_actions(), self.params.w.n_cols());
        let mut td_errs = Vec::with_capacity(n);
        let mut grad_w = Mat::zeros(n_actions, obs_dim);
        let mut grad_b = Mat::zeros(n_actions, 1);

        for i in 0..n {
            ensure!(act[i] < n_actions, "Action {} out of range", act[i]);
            ensure!(obs[i].len() == obs_dim, "Invalid observation size {}", obs[i].len());
            let td_err = self.q_value(&obs[i], act[i]) - tgt[i];
            let g = weight[i] * td_err / n as f32;
            for (gw, x) in grad_w.row_mut(act[i]).iter_mut().zip(obs[i].iter()) {
                *gw += g * x;
            }
            grad_b.data[act[i]] += g;
            td_errs.push(td_err);
        }

        for (w, g) in self.params.w.data.iter_mut().zip(grad_w.data.iter()) {
            *w -= self.lr * g;
        }
        for (b, g) in self.params.b.data.iter_mut().zip(grad_b.data.iter()) {
            *b -= self.lr * g;
        }

        Ok(td_errs)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), &self.params)?;
        info!("Save LinearQ parameters to {:?}", path);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        let params: Params = bincode::deserialize_from(BufReader::new(file))?;
        ensure!(
            params.w.shape == self.params.w.shape,
            "Shape mismatch: {:?} in file, {:?} expected",
            params.w.shape,
            self.params.w.shape
        );
        self.params = params;
        info!("Load LinearQ parameters from {:?}", path);
        Ok(())
    }
}
