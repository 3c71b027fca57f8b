//! Prioritized replay buffer.
mod iw_scheduler;
mod sum_tree;
use super::{config::PerConfig, PrioritizedReplayBufferConfig, Transition, TransitionBatch};
use crate::{error::PerDqnError, ReplayBufferBase};
pub use iw_scheduler::IwScheduler;
use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use std::fmt::Debug;
use sum_tree::SumTree;
pub use sum_tree::WeightNormalizer;

/// A fixed-capacity replay buffer with prioritized sampling.
///
/// Transitions are stored in a circular buffer. Slot `i` of the buffer is paired
/// with leaf `i` of a sum tree holding its priority; both are written in the same
/// call and share a single write cursor, so the pairing cannot drift.
/// When the buffer is full, the oldest transition is overwritten.
///
/// ```rust
/// use perdqn_core::replay_buffer::{
///     PrioritizedReplayBuffer, PrioritizedReplayBufferConfig, Transition,
/// };
/// use perdqn_core::ReplayBufferBase;
///
/// let config = PrioritizedReplayBufferConfig::default().capacity(4);
/// let mut buffer = PrioritizedReplayBuffer::<Vec<f32>>::build(&config);
///
/// for i in 0..4 {
///     let tr = Transition::new(vec![i as f32], 0, 1.0, vec![i as f32 + 1.0], false);
///     buffer.push(tr, 1.0).unwrap();
/// }
///
/// let batch = buffer.batch(2, 0.4).unwrap();
/// assert_eq!(batch.len(), 2);
/// ```
pub struct PrioritizedReplayBuffer<O> {
    capacity: usize,

    /// Transitions, grown up to `capacity` and overwritten afterwards.
    data: Vec<Transition<O>>,

    /// Priorities of the transitions.
    sum_tree: SumTree,

    per_config: PerConfig,
    rng: StdRng,
}

impl<O> PrioritizedReplayBuffer<O>
where
    O: Clone + Debug,
{
    /// Stores a transition with the given priority and returns its slot.
    ///
    /// The priority is validated before anything is written.
    pub fn push(&mut self, tr: Transition<O>, priority: f32) -> Result<usize, PerDqnError> {
        let ix = self.sum_tree.insert(priority)?;

        if ix < self.data.len() {
            self.data[ix] = tr;
        } else {
            debug_assert_eq!(ix, self.data.len());
            self.data.push(tr);
            if self.data.len() == self.capacity {
                debug!("Replay buffer is full, capacity = {}", self.capacity);
            }
        }

        Ok(ix)
    }

    /// Stores a transition with the maximum priority seen so far.
    pub fn push_with_max_priority(&mut self, tr: Transition<O>) -> Result<usize, PerDqnError> {
        let p = self.sum_tree.max();
        self.push(tr, p)
    }

    /// Returns the transition at slot `ix`.
    pub fn get(&self, ix: usize) -> Result<&Transition<O>, PerDqnError> {
        self.data.get(ix).ok_or(PerDqnError::InvalidSlot {
            ix,
            len: self.data.len(),
        })
    }

    /// Returns the priority of the transition at slot `ix`.
    pub fn priority(&self, ix: usize) -> Result<f32, PerDqnError> {
        self.sum_tree.priority(ix)
    }

    /// Overwrites the priority of the transition at slot `ix`.
    pub fn set_priority(&mut self, ix: usize, priority: f32) -> Result<(), PerDqnError> {
        self.sum_tree.update(ix, priority)
    }

    /// Total priority mass of the stored transitions.
    pub fn total_priority(&self) -> f32 {
        self.sum_tree.total()
    }

    /// Maximum priority of the stored transitions.
    pub fn max_priority(&self) -> f32 {
        self.sum_tree.max()
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configuration of prioritization.
    pub fn per_config(&self) -> &PerConfig {
        &self.per_config
    }
}

impl<O> ReplayBufferBase for PrioritizedReplayBuffer<O>
where
    O: Clone + Debug,
{
    type Config = PrioritizedReplayBufferConfig;
    type Obs = O;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;

        Self {
            capacity,
            data: Vec::with_capacity(capacity),
            sum_tree: SumTree::new(capacity, config.per_config.normalize),
            per_config: config.per_config.clone(),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push_td_err(&mut self, tr: Transition<O>, td_err: f32) -> Result<usize, PerDqnError> {
        let p = self.per_config.initial_priority(td_err)?;
        self.push(tr, p)
    }

    /// Samples a batch with stratified prioritized sampling.
    ///
    /// Fails with [`PerDqnError::InsufficientData`] if fewer than `size`
    /// transitions are stored; no partial batch is returned.
    fn batch(&mut self, size: usize, beta: f32) -> Result<TransitionBatch<O>, PerDqnError> {
        if self.data.len() < size {
            return Err(PerDqnError::InsufficientData {
                requested: size,
                available: self.data.len(),
            });
        }
        if size == 0 {
            return Ok(TransitionBatch::with_capacity(0));
        }

        let (ixs, ws) = self.sum_tree.sample_batch(size, beta, &mut self.rng)?;
        let mut batch = TransitionBatch::with_capacity(size);
        for (ix, w) in ixs.into_iter().zip(ws.into_iter()) {
            batch.push(ix, &self.data[ix], w);
        }

        Ok(batch)
    }

    /// Writes priorities computed from TD errors back to the sum tree.
    ///
    /// All TD errors are checked before any priority is written.
    fn update_priority(&mut self, ixs: &[usize], td_errs: &[f32]) -> Result<(), PerDqnError> {
        if ixs.len() != td_errs.len() {
            return Err(PerDqnError::NumericInstability(format!(
                "{} slots given with {} TD errors",
                ixs.len(),
                td_errs.len()
            )));
        }

        let ps = td_errs
            .iter()
            .map(|&td_err| self.per_config.priority(td_err))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(&ix) = ixs.iter().find(|&&ix| ix >= self.data.len()) {
            return Err(PerDqnError::InvalidSlot {
                ix,
                len: self.data.len(),
            });
        }

        for (&ix, p) in ixs.iter().zip(ps.into_iter()) {
            self.sum_tree.update(ix, p)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay_buffer::PerConfig;

    fn transition(i: usize) -> Transition<Vec<f32>> {
        Transition::new(vec![i as f32], i % 2, i as f32, vec![i as f32 + 1.0], false)
    }

    fn buffer(capacity: usize) -> PrioritizedReplayBuffer<Vec<f32>> {
        let config = PrioritizedReplayBufferConfig::default()
            .capacity(capacity)
            .seed(42)
            .per_config(PerConfig::default().alpha(1.0));
        PrioritizedReplayBuffer::build(&config)
    }

    #[test]
    fn test_capacity_eviction() {
        let (capacity, k) = (4, 2);
        let mut buffer = buffer(capacity);
        for i in 0..capacity + k {
            buffer.push(transition(i), 1.0).unwrap();
        }

        assert_eq!(buffer.len(), capacity);
        for slot in 0..capacity {
            // Slot `i` holds the transition inserted last at that position.
            let expected = if slot < k { slot + capacity } else { slot };
            assert_eq!(buffer.get(slot).unwrap(), &transition(expected));
        }
    }

    #[test]
    fn test_invalid_slot() {
        let mut buffer = buffer(4);
        buffer.push(transition(0), 1.0).unwrap();

        assert!(matches!(
            buffer.get(1),
            Err(PerDqnError::InvalidSlot { ix: 1, len: 1 })
        ));
        assert!(matches!(
            buffer.get(10),
            Err(PerDqnError::InvalidSlot { ix: 10, len: 1 })
        ));
        assert!(matches!(
            buffer.priority(3),
            Err(PerDqnError::InvalidSlot { .. })
        ));
    }

    #[test]
    fn test_invalid_priority_leaves_buffer_untouched() {
        let mut buffer = buffer(4);
        buffer.push(transition(0), 1.0).unwrap();

        assert!(matches!(
            buffer.push(transition(1), -1.0),
            Err(PerDqnError::InvalidPriority(_))
        ));
        assert!(matches!(
            buffer.push_td_err(transition(1), f32::NAN),
            Err(PerDqnError::NumericInstability(_))
        ));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.total_priority(), 1.0);

        // The next valid push lands on the next slot.
        assert_eq!(buffer.push(transition(1), 1.0).unwrap(), 1);
    }

    #[test]
    fn test_insufficient_data() {
        let mut buffer = buffer(8);
        for i in 0..3 {
            buffer.push(transition(i), 1.0).unwrap();
        }

        match buffer.batch(5, 0.4) {
            Err(PerDqnError::InsufficientData {
                requested,
                available,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            _ => panic!("expected InsufficientData"),
        }
        assert_eq!(buffer.batch(3, 0.4).unwrap().len(), 3);
    }

    #[test]
    fn test_weight_normalization() {
        let mut buffer = buffer(32);
        for i in 0..32 {
            buffer.push(transition(i), 0.05 + 0.1 * i as f32).unwrap();
        }

        for _ in 0..100 {
            let batch = buffer.batch(8, 0.6).unwrap();
            let w_max = batch.weight.iter().cloned().fold(f32::MIN, f32::max);
            assert!((w_max - 1.0).abs() < 1e-6);
            assert!(batch.weight.iter().all(|&w| w > 0.0 && w <= 1.0));
        }
    }

    #[test]
    fn test_global_weight_normalization() {
        let config = PrioritizedReplayBufferConfig::default()
            .capacity(16)
            .per_config(PerConfig::default().normalize(WeightNormalizer::All));
        let mut buffer = PrioritizedReplayBuffer::build(&config);
        for i in 0..16 {
            buffer.push(transition(i), 1.0 + i as f32).unwrap();
        }

        // The weight of the lowest-priority transition is the global maximum.
        let (p_min, p_sum, n) = (1.0f32, buffer.total_priority(), 16.0f32);
        let beta = 0.5;
        let w_max = (n * p_min / p_sum).powf(-beta);

        for _ in 0..50 {
            let batch = buffer.batch(4, beta).unwrap();
            for (&ix, &w) in batch.ix_sample.iter().zip(batch.weight.iter()) {
                let p = buffer.priority(ix).unwrap();
                let expected = (n * p / p_sum).powf(-beta) / w_max;
                assert!((w - expected).abs() < 1e-5);
                assert!(w > 0.0 && w <= 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn test_priority_write_back() {
        let mut buffer = buffer(8);
        for i in 0..8 {
            buffer.push(transition(i), 1.0).unwrap();
        }

        let batch = buffer.batch(4, 0.4).unwrap();
        let td_errs = vec![0.3, -0.2, 5.0, 0.0];
        buffer.update_priority(&batch.ix_sample, &td_errs).unwrap();

        // The last write wins if a slot is sampled more than once.
        let mut expected = std::collections::HashMap::new();
        for (&ix, &td_err) in batch.ix_sample.iter().zip(td_errs.iter()) {
            expected.insert(ix, buffer.per_config().priority(td_err).unwrap());
        }
        for (ix, p) in expected {
            assert_eq!(buffer.priority(ix).unwrap(), p);
        }
    }

    #[test]
    fn test_update_priority_rejects_non_finite() {
        let mut buffer = buffer(4);
        for i in 0..4 {
            buffer.push(transition(i), 1.0).unwrap();
        }

        let res = buffer.update_priority(&[0, 1], &[0.5, f32::INFINITY]);
        assert!(matches!(res, Err(PerDqnError::NumericInstability(_))));

        // Nothing was written.
        assert_eq!(buffer.priority(0).unwrap(), 1.0);
        assert_eq!(buffer.total_priority(), 4.0);
    }

    #[test]
    fn test_push_td_err_keeps_surprise() {
        let config = PrioritizedReplayBufferConfig::default()
            .capacity(4)
            .per_config(PerConfig::default());
        let mut buffer = PrioritizedReplayBuffer::build(&config);
        let ix0 = buffer.push_td_err(transition(0), 5.0).unwrap();
        let ix1 = buffer.push_td_err(transition(1), -0.99).unwrap();

        assert!((buffer.priority(ix0).unwrap() - 5.01f32.powf(0.6)).abs() < 1e-5);
        assert!((buffer.priority(ix1).unwrap() - 1.0).abs() < 1e-6);

        // Priorities written back after an optimization step are clipped.
        buffer.update_priority(&[ix0], &[5.0]).unwrap();
        assert_eq!(buffer.priority(ix0).unwrap(), 1.0);
    }

    #[test]
    fn test_push_with_max_priority() {
        let mut buffer = buffer(4);
        buffer.push_with_max_priority(transition(0)).unwrap();
        assert_eq!(buffer.priority(0).unwrap(), 1.0);

        buffer.push(transition(1), 3.0).unwrap();
        buffer.push_with_max_priority(transition(2)).unwrap();
        assert_eq!(buffer.priority(2).unwrap(), 3.0);
    }

    #[test]
    fn test_end_to_end_sampling_frequency() {
        let mut buffer = buffer(4);
        for i in 0..4 {
            buffer.push(transition(i), 1.0).unwrap();
        }

        let n_batches = 1000;
        let mut counts = [0usize; 4];
        for _ in 0..n_batches {
            let batch = buffer.batch(2, 0.0).unwrap();
            assert!(batch.weight.iter().all(|&w| w == 1.0));
            for &ix in batch.ix_sample.iter() {
                counts[ix] += 1;
            }
        }
        for &c in counts.iter() {
            let share = c as f32 / n_batches as f32;
            assert!((share - 0.5).abs() <= 0.05, "counts = {:?}", counts);
        }

        buffer.set_priority(2, 100.0).unwrap();
        let mut n_hits = 0;
        for _ in 0..n_batches {
            let batch = buffer.batch(2, 0.0).unwrap();
            if batch.ix_sample.contains(&2) {
                n_hits += 1;
            }
        }
        assert!(n_hits as f32 / n_batches as f32 > 0.95);
    }
}
