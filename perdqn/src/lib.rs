//! DQN with prioritized experience replay on a corridor environment.
//!
//! The workspace consists of the following crates:
//!
//! * [perdqn-core](perdqn_core) provides the sum tree, the prioritized replay
//!   buffer, the PER-DQN agent and the training loop.
//! * [perdqn-policy-no-backend](perdqn_policy_no_backend) provides a linear
//!   action-value function without a deep learning backend.
//! * `perdqn` (this crate) provides a toy environment and a training program.
mod config;
pub mod env;
pub use config::PerDqnCorridorConfig;

use anyhow::Result;
use env::Corridor;
use perdqn_core::{
    dqn::PerDqn,
    record::Recorder,
    replay_buffer::PrioritizedReplayBuffer,
    Agent, Configurable, EpisodeStats, Env, ReplayBufferBase, Trainer,
};
use perdqn_policy_no_backend::LinearQ;
use std::path::Path;

/// Replay buffer used in the corridor environment.
pub type ReplayBuffer = PrioritizedReplayBuffer<Vec<f32>>;

/// Agent used in the corridor environment.
pub type Dqn = PerDqn<Corridor, LinearQ, ReplayBuffer>;

/// Trains an agent and returns it with the statistics of the training episodes.
pub fn train(
    config: &PerDqnCorridorConfig,
    recorder: &mut impl Recorder,
) -> Result<(Dqn, Vec<EpisodeStats>)> {
    config.validate()?;
    let env = Corridor::build(&config.env_config, config.seed)?;
    let mut agent = Dqn::build(config.agent_config.clone());
    let mut buffer = ReplayBuffer::build(&config.replay_buffer_config);
    let mut trainer = Trainer::build(config.trainer_config.clone(), env);

    let stats = trainer.train(&mut agent, &mut buffer, recorder)?;

    Ok((agent, stats))
}

/// Evaluates an agent with the greedy policy.
pub fn eval(
    config: &PerDqnCorridorConfig,
    agent: &mut Dqn,
    recorder: &mut impl Recorder,
) -> Result<Vec<EpisodeStats>> {
    let env = Corridor::build(&config.env_config, config.seed + 1)?;
    let mut trainer = Trainer::<_, ReplayBuffer>::build(config.trainer_config.clone(), env);
    trainer.test(agent, recorder)
}

/// Builds an agent with parameters loaded from `model_dir`.
pub fn load_agent(config: &PerDqnCorridorConfig, model_dir: impl AsRef<Path>) -> Result<Dqn> {
    let mut agent = Dqn::build(config.agent_config.clone());
    agent.load_params(model_dir.as_ref())?;
    agent.eval();
    Ok(agent)
}
