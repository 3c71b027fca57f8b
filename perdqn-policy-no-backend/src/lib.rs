//! Action-value function for PER-DQN without a deep learning backend.
//!
//! [`LinearQ`] implements [`perdqn_core::QFunction`] with plain Rust arithmetic
//! and stores its parameters with `bincode`.
mod linear_q;
mod mat;
pub use linear_q::{LinearQ, LinearQConfig};
pub use mat::Mat;
