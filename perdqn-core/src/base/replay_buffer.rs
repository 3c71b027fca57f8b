//! Replay buffer interface.
use crate::{
    error::PerDqnError,
    replay_buffer::{Transition, TransitionBatch},
};

/// Interface of prioritized replay buffers used by agents.
///
/// Errors are typed so that callers can tell an expected precondition failure,
/// [`PerDqnError::InsufficientData`], from a corrupted sampling structure.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// Observation stored in transitions.
    type Obs;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Current number of transitions in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no transition.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes a transition with a priority computed from its TD error and
    /// returns the slot where it was stored.
    fn push_td_err(
        &mut self,
        tr: Transition<Self::Obs>,
        td_err: f32,
    ) -> Result<usize, PerDqnError>;

    /// Samples a batch of `size` transitions with importance sampling exponent `beta`.
    fn batch(&mut self, size: usize, beta: f32)
        -> Result<TransitionBatch<Self::Obs>, PerDqnError>;

    /// Updates the priorities of the transitions at `ixs` with the given TD errors.
    fn update_priority(&mut self, ixs: &[usize], td_errs: &[f32]) -> Result<(), PerDqnError>;
}
