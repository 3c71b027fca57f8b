//! Prioritized experience replay.
//!
//! # Key Components
//!
//! - [`PrioritizedReplayBuffer`]: fixed-capacity storage of transitions paired with a sum tree
//! - [`TransitionBatch`]: a batch of sampled transitions with their slots and importance weights
//! - [`PerConfig`]: conversion of TD errors into priorities and weight normalization
//! - [`IwScheduler`]: annealing of the importance sampling exponent
mod base;
mod batch;
mod config;
pub use base::{IwScheduler, PrioritizedReplayBuffer, WeightNormalizer};
pub use batch::{Transition, TransitionBatch};
pub use config::{PerConfig, PrioritizedReplayBufferConfig};
