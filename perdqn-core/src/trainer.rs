//! Train [`Agent`].
mod config;
use crate::{
    record::{BufferedRecorder, Record, RecordValue::Scalar, Recorder},
    replay_buffer::Transition,
    util::eval_with_recorder,
    Agent, Env, ReplayBufferBase,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
use std::{marker::PhantomData, path::Path};

/// Statistics of an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Index of the episode.
    pub episode: usize,

    /// Cumulative reward.
    pub reward: f32,

    /// Number of environment steps.
    pub steps: usize,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages training loop and related objects.
///
/// # Training loop
///
/// For each of `train_episodes` episodes:
///
/// 1. Reset [`Env`].
/// 2. Take an action with [`Agent`], apply it to [`Env`] and create a
///    [`Transition`] from the returned [`Step`](crate::Step).
/// 3. Push the transition into the replay buffer with [`Agent::ingest`], which
///    assigns the initial priority from its TD error.
/// 4. Do an optimization step with [`Agent::opt`].
///     * NOTE: The agent skips the optimization step while the replay buffer
///       does not hold enough transitions.
/// 5. Back to step 2 until the episode is terminated or truncated, or
///    `max_steps` steps are done.
/// 6. Every `target_update_interval` episodes, synchronize the target network
///   with [`Agent::sync_target`].
///
/// If `model_dir` is given, the parameters of the agent are saved there
/// after the last episode.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action|B[Env]
///     B -->|"Step&lt;E: Env&gt;"|A
///     A -->|"Transition, TD error"|D[PrioritizedReplayBuffer]
///     D -->|"TransitionBatch, weights"|A
///     A -->|"slots, TD errors"|D
/// ```
pub struct Trainer<E, R>
where
    E: Env,
    R: ReplayBufferBase<Obs = E::Obs>,
{
    config: TrainerConfig,
    env: E,
    phantom: PhantomData<R>,
}

impl<E, R> Trainer<E, R>
where
    E: Env,
    R: ReplayBufferBase<Obs = E::Obs>,
{
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig, env: E) -> Self {
        Self {
            config,
            env,
            phantom: PhantomData,
        }
    }

    /// Runs an episode in training mode.
    fn train_episode<A>(
        &mut self,
        episode: usize,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut impl Recorder,
    ) -> Result<EpisodeStats>
    where
        A: Agent<E, R>,
    {
        let mut obs = self.env.reset()?;
        let mut reward = 0.0;
        let mut steps = 0;

        while steps < self.config.max_steps {
            let act = agent.sample(&obs);
            let step = self.env.step(act)?;
            steps += 1;
            reward += step.reward;

            let is_done = step.is_done();
            let tr = Transition::new(
                obs,
                act,
                step.reward,
                step.obs.clone(),
                step.is_terminated,
            );
            agent.ingest(buffer, tr)?;

            if let Some(mut record) = agent.opt(buffer)? {
                record.insert("episode", Scalar(episode as _));
                recorder.write(record);
            }

            if is_done {
                break;
            }
            obs = step.obs;
        }

        Ok(EpisodeStats {
            episode,
            reward,
            steps,
        })
    }

    /// Train the agent.
    ///
    /// Returns the statistics of the training episodes. Fails if
    /// `target_update_interval` is `0`.
    pub fn train<A>(
        &mut self,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut impl Recorder,
    ) -> Result<Vec<EpisodeStats>>
    where
        A: Agent<E, R>,
    {
        self.config.validate()?;
        info!("Start training");
        agent.train();
        let mut stats = Vec::with_capacity(self.config.train_episodes);

        for episode in 0..self.config.train_episodes {
            let s = self.train_episode(episode, agent, buffer, recorder)?;
            info!(
                "Episode {}/{}, reward = {:.2}, steps = {}",
                episode + 1,
                self.config.train_episodes,
                s.reward,
                s.steps
            );

            let mut record = Record::from_scalar("reward", s.reward);
            record.insert("episode", Scalar(episode as _));
            record.insert("steps", Scalar(s.steps as _));
            recorder.write(record);

            if (episode + 1) % self.config.target_update_interval == 0 {
                agent.sync_target();
            }
            stats.push(s);
        }

        if let Some(model_dir) = &self.config.model_dir {
            match agent.save_params(Path::new(model_dir)) {
                Ok(()) => info!("Saved the model in {:?}.", model_dir),
                Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
            }
        }
        info!("Finish training");

        Ok(stats)
    }

    /// Evaluates the agent with its greedy policy.
    ///
    /// No transition is pushed into any replay buffer.
    pub fn test<A>(
        &mut self,
        agent: &mut A,
        recorder: &mut impl Recorder,
    ) -> Result<Vec<EpisodeStats>>
    where
        A: Agent<E, R>,
    {
        info!("Start testing");
        let is_train = agent.is_train();
        agent.eval();

        let mut rs = Vec::with_capacity(self.config.test_episodes);
        let mut recorder_ = BufferedRecorder::new();
        let rewards = eval_with_recorder(
            &mut self.env,
            agent,
            self.config.test_episodes,
            self.config.max_steps,
            &mut recorder_,
        )?;
        for (episode, (reward, record)) in rewards.into_iter().zip(recorder_.iter()).enumerate() {
            let steps = record.get_scalar("steps")? as usize;
            rs.push(EpisodeStats {
                episode,
                reward,
                steps,
            });
            recorder.write(record.clone());
        }

        if is_train {
            agent.train();
        }
        info!("Finish testing");

        Ok(rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        record::{BufferedRecorder, NullRecorder},
        replay_buffer::{PrioritizedReplayBuffer, PrioritizedReplayBufferConfig},
        Policy, Step,
    };

    /// Episodes end after `len` steps regardless of actions.
    struct FixedLengthEnv {
        len: usize,
        t: usize,
    }

    impl Env for FixedLengthEnv {
        type Config = usize;
        type Obs = usize;
        type Info = ();

        fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
            Ok(Self { len: *config, t: 0 })
        }

        fn reset(&mut self) -> Result<usize> {
            self.t = 0;
            Ok(0)
        }

        fn step(&mut self, act: usize) -> Result<Step<Self>> {
            self.t += 1;
            let is_terminated = self.t >= self.len;
            Ok(Step::new(self.t, act, 1.0, is_terminated, false, ()))
        }

        fn n_actions(&self) -> usize {
            2
        }

        fn obs_dim(&self) -> usize {
            1
        }
    }

    type Buffer = PrioritizedReplayBuffer<usize>;

    /// Counts calls from the trainer.
    #[derive(Default)]
    struct CountingAgent {
        train: bool,
        n_samples: usize,
        n_ingests: usize,
        n_opts: usize,
        n_syncs: usize,
    }

    impl Policy<FixedLengthEnv> for CountingAgent {
        fn sample(&mut self, _obs: &usize) -> usize {
            self.n_samples += 1;
            0
        }
    }

    impl Agent<FixedLengthEnv, Buffer> for CountingAgent {
        fn train(&mut self) {
            self.train = true;
        }

        fn eval(&mut self) {
            self.train = false;
        }

        fn is_train(&self) -> bool {
            self.train
        }

        fn ingest(&mut self, buffer: &mut Buffer, tr: Transition<usize>) -> Result<usize> {
            self.n_ingests += 1;
            Ok(buffer.push_td_err(tr, 0.0)?)
        }

        fn opt(&mut self, _buffer: &mut Buffer) -> Result<Option<Record>> {
            self.n_opts += 1;
            Ok(None)
        }

        fn sync_target(&mut self) {
            self.n_syncs += 1;
        }

        fn save_params(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn trainer(config: TrainerConfig) -> Result<Trainer<FixedLengthEnv, Buffer>> {
        Ok(Trainer::build(config, FixedLengthEnv::build(&3, 0)?))
    }

    fn buffer() -> Buffer {
        Buffer::build(&PrioritizedReplayBufferConfig::default().capacity(100))
    }

    #[test]
    fn test_sync_target_interval() -> Result<()> {
        let config = TrainerConfig::default()
            .train_episodes(5)
            .max_steps(10)
            .target_update_interval(2);
        let mut trainer = trainer(config)?;
        let (mut agent, mut buffer) = (CountingAgent::default(), buffer());

        let stats = trainer.train(&mut agent, &mut buffer, &mut NullRecorder::new())?;

        // After episodes 2 and 4.
        assert_eq!(agent.n_syncs, 2);
        assert_eq!(stats.len(), 5);
        assert!(stats.iter().all(|s| s.steps == 3 && s.reward == 3.0));
        assert_eq!(agent.n_ingests, 15);
        assert_eq!(agent.n_opts, 15);
        assert_eq!(buffer.len(), 15);
        assert!(agent.is_train());
        Ok(())
    }

    #[test]
    fn test_episode_truncated_by_max_steps() -> Result<()> {
        let config = TrainerConfig::default()
            .train_episodes(2)
            .max_steps(2)
            .target_update_interval(1);
        let mut trainer = trainer(config)?;
        let (mut agent, mut buffer) = (CountingAgent::default(), buffer());

        let stats = trainer.train(&mut agent, &mut buffer, &mut NullRecorder::new())?;
        assert!(stats.iter().all(|s| s.steps == 2));
        assert_eq!(agent.n_syncs, 2);
        Ok(())
    }

    #[test]
    fn test_zero_target_update_interval_is_rejected() -> Result<()> {
        let config = TrainerConfig::default().target_update_interval(0);
        let mut trainer = trainer(config)?;
        let (mut agent, mut buffer) = (CountingAgent::default(), buffer());

        assert!(trainer
            .train(&mut agent, &mut buffer, &mut NullRecorder::new())
            .is_err());
        assert_eq!(agent.n_samples, 0);
        Ok(())
    }

    #[test]
    fn test_evaluation_does_not_ingest() -> Result<()> {
        let config = TrainerConfig::default()
            .train_episodes(1)
            .test_episodes(4)
            .max_steps(10);
        let mut trainer = trainer(config)?;
        let (mut agent, mut buffer) = (CountingAgent::default(), buffer());
        trainer.train(&mut agent, &mut buffer, &mut NullRecorder::new())?;
        let (n_ingests, n_opts, len) = (agent.n_ingests, agent.n_opts, buffer.len());

        let mut recorder = BufferedRecorder::new();
        let stats = trainer.test(&mut agent, &mut recorder)?;

        assert_eq!(stats.len(), 4);
        assert!(stats.iter().all(|s| s.steps == 3));
        assert_eq!(recorder.len(), 4);
        assert_eq!(agent.n_ingests, n_ingests);
        assert_eq!(agent.n_opts, n_opts);
        assert_eq!(buffer.len(), len);

        // Back to training mode.
        assert!(agent.is_train());
        Ok(())
    }

    #[test]
    fn test_evaluation_keeps_eval_mode() -> Result<()> {
        let mut trainer = trainer(TrainerConfig::default().test_episodes(1))?;
        let mut agent = CountingAgent::default();
        agent.eval();

        trainer.test(&mut agent, &mut NullRecorder::new())?;
        assert!(!agent.is_train());
        assert_eq!(agent.n_ingests, 0);
        Ok(())
    }
}
