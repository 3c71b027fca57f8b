//! PER-DQN agent implemented with a generic action-value function.
use super::{EpsilonGreedy, PerDqnConfig};
use crate::{
    error::PerDqnError,
    record::{Record, RecordValue},
    replay_buffer::{IwScheduler, Transition},
    util::{argmax, max},
    Agent, Configurable, Env, Policy, QFunction, ReplayBufferBase,
};
use anyhow::{anyhow, Result};
use log::{debug, info, trace};
use rand::{rngs::SmallRng, SeedableRng};
use std::{fs, marker::PhantomData, path::Path};

/// DQN agent trained with prioritized experience replay.
///
/// The agent owns two instances of the action-value function: `qnet`, updated
/// at every optimization step, and `qnet_tgt`, used to compute targets and
/// overwritten by a copy of `qnet` in [`Agent::sync_target`].
pub struct PerDqn<E, Q, R>
where
    Q: QFunction,
{
    pub(in crate::dqn) qnet: Q,
    pub(in crate::dqn) qnet_tgt: Q,
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) discount_factor: f32,
    pub(in crate::dqn) min_transitions_warmup: usize,
    pub(in crate::dqn) explorer: EpsilonGreedy,
    pub(in crate::dqn) iw_scheduler: IwScheduler,
    pub(in crate::dqn) train: bool,
    pub(in crate::dqn) n_opts: usize,
    pub(in crate::dqn) n_samples: usize,
    rng: SmallRng,
    phantom: PhantomData<(E, R)>,
}

impl<E, Q, R> PerDqn<E, Q, R>
where
    E: Env,
    Q: QFunction<Input = E::Obs>,
    R: ReplayBufferBase<Obs = E::Obs>,
{
    /// Number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Current epsilon of the explorer.
    pub fn eps(&self) -> f32 {
        self.explorer.eps(self.n_samples)
    }

    /// Returns `true` if `buffer` holds enough transitions for an optimization step.
    pub fn is_ready(&self, buffer: &R) -> bool {
        buffer.len() >= self.batch_size.max(self.min_transitions_warmup)
    }

    /// The action-value function being trained.
    pub fn qnet(&self) -> &Q {
        &self.qnet
    }

    /// Target of the TD error, `r` if terminated, `r + gamma * max_a Q_tgt(s', a)` otherwise.
    fn target(&self, reward: f32, next_obs: &E::Obs, is_terminated: bool) -> f32 {
        if is_terminated {
            reward
        } else {
            reward + self.discount_factor * max(&self.qnet_tgt.forward(next_obs))
        }
    }

    /// TD error `Q(s, a) - target` of a single transition.
    fn td_err(&self, tr: &Transition<E::Obs>) -> Result<f32> {
        let q = self.qnet.forward(&tr.obs);
        let q = *q.get(tr.act).ok_or_else(|| {
            anyhow!("Action {} out of range, n_actions = {}", tr.act, q.len())
        })?;
        Ok(q - self.target(tr.reward, &tr.next_obs, tr.is_terminated))
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let beta = self.iw_scheduler.beta(self.n_opts);
        let batch = buffer.batch(self.batch_size, beta)?;
        let (obs, act, next_obs, reward, is_terminated, ix_sample, weight) = batch.unpack();

        let tgt = next_obs
            .iter()
            .zip(reward.into_iter())
            .zip(is_terminated.into_iter())
            .map(|((o, r), t)| self.target(r, o, t))
            .collect::<Vec<_>>();
        if let Some(t) = tgt.iter().find(|t| !t.is_finite()) {
            return Err(PerDqnError::NumericInstability(format!("TD target = {}", t)).into());
        }

        let td_errs = self.qnet.update_parameters(&obs, &act, &tgt, &weight)?;
        if td_errs.len() != ix_sample.len() {
            return Err(anyhow!(
                "{} TD errors returned for a batch of {}",
                td_errs.len(),
                ix_sample.len()
            ));
        }
        buffer.update_priority(&ix_sample, &td_errs)?;
        self.n_opts += 1;

        let mean_abs_td_err = if td_errs.is_empty() {
            0.0
        } else {
            td_errs.iter().map(|e| e.abs()).sum::<f32>() / td_errs.len() as f32
        };
        trace!(
            "opt {}: beta = {:.3}, mean |td_err| = {:.4}",
            self.n_opts,
            beta,
            mean_abs_td_err
        );

        Ok(Record::from_slice(&[
            ("mean_abs_td_err", RecordValue::Scalar(mean_abs_td_err)),
            ("beta", RecordValue::Scalar(beta)),
            ("eps", RecordValue::Scalar(self.eps())),
        ]))
    }
}

impl<E, Q, R> Configurable for PerDqn<E, Q, R>
where
    E: Env,
    Q: QFunction<Input = E::Obs>,
    R: ReplayBufferBase<Obs = E::Obs>,
{
    type Config = PerDqnConfig<Q::Config>;

    /// Constructs PER-DQN agent.
    fn build(config: Self::Config) -> Self {
        let qnet = Q::build(&config.model_config);
        let qnet_tgt = qnet.clone();

        Self {
            qnet,
            qnet_tgt,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            min_transitions_warmup: config.min_transitions_warmup,
            explorer: config.explorer,
            iw_scheduler: config.iw_scheduler,
            train: config.train,
            n_opts: 0,
            n_samples: 0,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        }
    }
}

impl<E, Q, R> Policy<E> for PerDqn<E, Q, R>
where
    E: Env,
    Q: QFunction<Input = E::Obs>,
    R: ReplayBufferBase<Obs = E::Obs>,
{
    /// In training mode, takes an epsilon-greedy action. Otherwise, greedy.
    fn sample(&mut self, obs: &E::Obs) -> usize {
        let q = self.qnet.forward(obs);
        if self.train {
            let a = self.explorer.action(&q, self.n_samples, &mut self.rng);
            self.n_samples += 1;
            a
        } else {
            argmax(&q)
        }
    }
}

impl<E, Q, R> Agent<E, R> for PerDqn<E, Q, R>
where
    E: Env,
    Q: QFunction<Input = E::Obs>,
    R: ReplayBufferBase<Obs = E::Obs>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn ingest(&mut self, buffer: &mut R, tr: Transition<E::Obs>) -> Result<usize> {
        let td_err = self.td_err(&tr)?;
        let ix = buffer.push_td_err(tr, td_err)?;
        trace!("Pushed a transition into slot {}, td_err = {}", ix, td_err);
        Ok(ix)
    }

    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if self.is_ready(buffer) {
            Ok(Some(self.opt_(buffer)?))
        } else {
            Ok(None)
        }
    }

    fn sync_target(&mut self) {
        self.qnet_tgt = self.qnet.clone();
        debug!("Synchronized the target network, n_opts = {}", self.n_opts);
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(&path.join("qnet.bin"))?;
        self.qnet_tgt.save(&path.join("qnet_tgt.bin"))?;
        info!("Saved the parameters of the agent in {}", path.display());
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(&path.join("qnet.bin"))?;
        self.qnet_tgt.load(&path.join("qnet_tgt.bin"))?;
        info!("Loaded the parameters of the agent from {}", path.display());
        Ok(())
    }
}
