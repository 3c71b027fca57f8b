//! Environment step.
use super::Env;

/// Additional information to `Obs`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits a [`Step`] object at every interaction step.
pub struct Step<E: Env> {
    /// Action.
    pub act: usize,

    /// Observation.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if the episode is truncated.
    pub is_truncated: bool,

    /// Information defined by user.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: usize,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
