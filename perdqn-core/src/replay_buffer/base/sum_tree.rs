//! Sum tree for prioritized sampling.
//!
//! The tree is stored in a flat array of `2 * capacity - 1` nodes. Leaves live at
//! indices `capacity - 1 ..= 2 * capacity - 2`, the children of node `i` are
//! `2 * i + 1` and `2 * i + 2`. Each internal node holds the sum of its two
//! children; the root holds the total priority mass.
use crate::error::PerDqnError;
use rand::Rng;
use segment_tree::{
    ops::{MaxIgnoreNaN, MinIgnoreNaN},
    SegmentPoint,
};
use serde::{Deserialize, Serialize};

/// Specifies how to normalize the importance weights in a prioritized batch.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum WeightNormalizer {
    /// Normalize weights by the maximum weight over all samples in the buffer.
    All,

    /// Normalize weights by the maximum weight in the batch.
    Batch,
}

#[derive(Debug)]
pub struct SumTree {
    capacity: usize,

    /// Write cursor, shared with the transition storage.
    i: usize,

    /// Number of written leaves.
    n_samples: usize,
    tree: Vec<f32>,
    min_tree: SegmentPoint<f32, MinIgnoreNaN>,
    max_tree: SegmentPoint<f32, MaxIgnoreNaN>,
    normalize: WeightNormalizer,
}

impl SumTree {
    pub fn new(capacity: usize, normalize: WeightNormalizer) -> Self {
        assert!(capacity > 0, "capacity of the sum tree must be positive");

        Self {
            capacity,
            i: 0,
            n_samples: 0,
            tree: vec![0f32; 2 * capacity - 1],
            min_tree: SegmentPoint::build(vec![f32::MAX; capacity], MinIgnoreNaN),
            max_tree: SegmentPoint::build(vec![0f32; capacity], MaxIgnoreNaN),
            normalize,
        }
    }

    fn check_priority(p: f32) -> Result<(), PerDqnError> {
        if p.is_finite() && p >= 0.0 {
            Ok(())
        } else {
            Err(PerDqnError::InvalidPriority(p))
        }
    }

    /// Writes the leaf and recomputes every ancestor from its children.
    fn set(&mut self, ix: usize, p: f32) {
        self.min_tree.modify(ix, p);
        self.max_tree.modify(ix, p);

        let mut node = ix + self.capacity - 1;
        self.tree[node] = p;
        while node > 0 {
            let parent = (node - 1) / 2;
            self.tree[parent] = self.tree[2 * parent + 1] + self.tree[2 * parent + 2];
            node = parent;
        }
    }

    /// Total priority mass.
    pub fn total(&self) -> f32 {
        self.tree[0]
    }

    /// Maximum priority over the written leaves, `1.0` if nothing was written yet.
    pub fn max(&self) -> f32 {
        if self.n_samples == 0 {
            1.0
        } else {
            self.max_tree.query(0, self.n_samples)
        }
    }

    /// Minimum priority over the written leaves.
    pub fn min(&self) -> f32 {
        if self.n_samples == 0 {
            0.0
        } else {
            self.min_tree.query(0, self.n_samples)
        }
    }

    /// Number of written leaves.
    pub fn len(&self) -> usize {
        self.n_samples
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Priority of the `ix`-th leaf.
    pub fn priority(&self, ix: usize) -> Result<f32, PerDqnError> {
        if ix >= self.n_samples {
            return Err(PerDqnError::InvalidSlot {
                ix,
                len: self.n_samples,
            });
        }
        Ok(self.tree[ix + self.capacity - 1])
    }

    /// Writes `p` at the cursor, advances the cursor and returns the slot used.
    pub fn insert(&mut self, p: f32) -> Result<usize, PerDqnError> {
        Self::check_priority(p)?;

        let ix = self.i;
        self.set(ix, p);
        self.i = (self.i + 1) % self.capacity;
        if self.n_samples < self.capacity {
            self.n_samples += 1;
        }

        Ok(ix)
    }

    /// Replaces the priority of a written leaf.
    pub fn update(&mut self, ix: usize, p: f32) -> Result<(), PerDqnError> {
        if ix >= self.n_samples {
            return Err(PerDqnError::InvalidSlot {
                ix,
                len: self.n_samples,
            });
        }
        Self::check_priority(p)?;
        self.set(ix, p);
        Ok(())
    }

    /// Returns the leaf where the prefix sum of priorities crosses `s`.
    ///
    /// `s` is expected in `[0, total)`. Subtrees with zero mass are never entered,
    /// so a leaf with zero priority is never returned.
    pub fn sample(&self, s: f32) -> usize {
        let mut ix = 0;
        let mut s = s;

        loop {
            let left = 2 * ix + 1;
            if left >= self.tree.len() {
                break;
            }
            let right = left + 1;

            if s < self.tree[left] || self.tree[right] <= 0.0 {
                ix = left;
            } else {
                s -= self.tree[left];
                ix = right;
            }
        }

        debug_assert!(ix >= self.capacity - 1);
        ix + 1 - self.capacity
    }

    /// Samples indices for a batch and returns them with normalized weights.
    ///
    /// One value is drawn from each of `batch_size` equal-width segments of
    /// `[0, total)`. The weight is $w_i=\left(N P(i)\right)^{-\beta}$ with
    /// $P(i)=p_i/\sum_j p_j$, normalized according to [`WeightNormalizer`].
    pub fn sample_batch(
        &self,
        batch_size: usize,
        beta: f32,
        rng: &mut impl Rng,
    ) -> Result<(Vec<usize>, Vec<f32>), PerDqnError> {
        let p_sum = self.total();
        if !(p_sum > 0.0) || !p_sum.is_finite() {
            return Err(PerDqnError::NumericInstability(format!(
                "total priority mass is {}",
                p_sum
            )));
        }

        let segment = p_sum / batch_size as f32;
        let ixs = (0..batch_size)
            .map(|k| {
                let s = (k as f32 + rng.gen::<f32>()) * segment;
                self.sample(s.min(p_sum))
            })
            .collect::<Vec<_>>();

        let n = self.n_samples as f32 / p_sum;
        let ws = ixs
            .iter()
            .map(|ix| (n * self.tree[ix + self.capacity - 1]).powf(-beta))
            .collect::<Vec<_>>();

        let w_max_batch = ws.iter().fold(f32::MIN, |m, &w| w.max(m));
        let w_max = match self.normalize {
            WeightNormalizer::Batch => w_max_batch,
            WeightNormalizer::All => {
                let p_min = self.min();
                if p_min > 0.0 {
                    (n * p_min).powf(-beta)
                } else {
                    w_max_batch
                }
            }
        };

        let ws = ws.into_iter().map(|w| w / w_max).collect::<Vec<_>>();
        if ws.iter().any(|w| !w.is_finite()) {
            return Err(PerDqnError::NumericInstability(format!(
                "importance weights {:?}",
                ws
            )));
        }

        Ok((ixs, ws))
    }
}
