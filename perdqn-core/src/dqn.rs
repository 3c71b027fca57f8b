//! DQN agent with prioritized experience replay.
mod base;
mod config;
mod explorer;
pub use base::PerDqn;
pub use config::PerDqnConfig;
pub use explorer::{EpsilonDecay, EpsilonGreedy};
