//! Transitions and batches of transitions.

/// A transition `(o_t, a_t, r_t, o_t+1, terminated_t)`.
///
/// Transitions are immutable once stored in a replay buffer; they are
/// identified only by their slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O> {
    /// Observation `o_t`.
    pub obs: O,

    /// Action `a_t`.
    pub act: usize,

    /// Reward `r_t`.
    pub reward: f32,

    /// Observation `o_t+1`.
    pub next_obs: O,

    /// Flag denoting if the episode terminated at `o_t+1`.
    pub is_terminated: bool,
}

impl<O> Transition<O> {
    /// Constructs a transition.
    pub fn new(obs: O, act: usize, reward: f32, next_obs: O, is_terminated: bool) -> Self {
        Self {
            obs,
            act,
            reward,
            next_obs,
            is_terminated,
        }
    }
}

/// A batch of transitions sampled from a prioritized replay buffer.
///
/// All fields have the same length and the same order: the `k`-th element of
/// each field belongs to the `k`-th sample.
#[derive(Clone, Debug)]
pub struct TransitionBatch<O> {
    /// Observations.
    pub obs: Vec<O>,

    /// Actions.
    pub act: Vec<usize>,

    /// Next observations.
    pub next_obs: Vec<O>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Termination flags.
    pub is_terminated: Vec<bool>,

    /// Slots of the sampled transitions in the buffer.
    pub ix_sample: Vec<usize>,

    /// Importance sampling weights.
    pub weight: Vec<f32>,
}

impl<O> TransitionBatch<O> {
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_terminated: Vec::with_capacity(capacity),
            ix_sample: Vec::with_capacity(capacity),
            weight: Vec::with_capacity(capacity),
        }
    }

    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no samples.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Unpacks the data `(o_t, a_t, o_t+1, r_t, terminated_t, ix_sample, weight)`.
    #[allow(clippy::type_complexity)]
    pub fn unpack(
        self,
    ) -> (
        Vec<O>,
        Vec<usize>,
        Vec<O>,
        Vec<f32>,
        Vec<bool>,
        Vec<usize>,
        Vec<f32>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
            self.ix_sample,
            self.weight,
        )
    }
}

impl<O: Clone> TransitionBatch<O> {
    pub(super) fn push(&mut self, ix: usize, tr: &Transition<O>, weight: f32) {
        self.obs.push(tr.obs.clone());
        self.act.push(tr.act);
        self.next_obs.push(tr.next_obs.clone());
        self.reward.push(tr.reward);
        self.is_terminated.push(tr.is_terminated);
        self.ix_sample.push(ix);
        self.weight.push(weight);
    }
}
