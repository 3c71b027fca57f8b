#![warn(missing_docs)]
//! Core components of DQN with prioritized experience replay.
//!
//! * [`replay_buffer`] - sum tree, prioritized replay buffer and importance sampling weights
//! * [`dqn`] - the agent, its explorer and configuration
//! * [`Trainer`] - episode loop for training and evaluation
//!
//! Environments and action-value functions are collaborators implementing
//! [`Env`] and [`QFunction`].
pub mod dqn;
pub mod error;
pub mod record;
pub mod replay_buffer;
pub mod util;

mod base;
pub use base::{Agent, Configurable, Env, Info, Policy, QFunction, ReplayBufferBase, Step};

mod trainer;
pub use trainer::{EpisodeStats, Trainer, TrainerConfig};
