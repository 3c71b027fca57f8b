//! Core functionalities.
mod agent;
mod env;
mod policy;
mod q_function;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::{Configurable, Policy};
pub use q_function::QFunction;
pub use replay_buffer::ReplayBufferBase;
pub use step::{Info, Step};
