//! Exploration strategies of DQN.
use crate::util::argmax;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Schedule of epsilon.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum EpsilonDecay {
    /// Linear decay reaching `eps_final` after `final_step` steps.
    Linear {
        /// Step at which epsilon reaches its final value.
        final_step: usize,
    },

    /// Exponential decay, `eps_final + (eps_start - eps_final) * exp(-step / decay)`.
    Exponential {
        /// Time constant of the decay in steps.
        decay: f32,
    },
}

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon is a pure function of the number of action samples taken so far,
/// which is passed by the caller.
///
/// ```rust
/// use perdqn_core::dqn::EpsilonGreedy;
///
/// let explorer = EpsilonGreedy::default();
/// assert!((explorer.eps(0) - 0.95).abs() < 1e-6);
/// assert!(explorer.eps(100_000) - 0.01 < 1e-6);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon at the first step.
    pub eps_start: f32,

    /// Epsilon after decay.
    pub eps_final: f32,

    /// Schedule of decay.
    pub decay: EpsilonDecay,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 0.95,
            eps_final: 0.01,
            decay: EpsilonDecay::Exponential { decay: 500.0 },
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer with linear decay.
    pub fn with_final_step(final_step: usize) -> Self {
        Self {
            eps_start: 1.0,
            eps_final: 0.02,
            decay: EpsilonDecay::Linear { final_step },
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f32) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f32) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the schedule of decay.
    pub fn decay(mut self, v: EpsilonDecay) -> Self {
        self.decay = v;
        self
    }

    /// Returns epsilon after `step` action samples.
    pub fn eps(&self, step: usize) -> f32 {
        match self.decay {
            EpsilonDecay::Linear { final_step } => {
                if step >= final_step {
                    self.eps_final
                } else {
                    let d = (self.eps_start - self.eps_final) / final_step as f32;
                    (self.eps_start - d * step as f32).max(self.eps_final)
                }
            }
            EpsilonDecay::Exponential { decay } => {
                if decay <= 0.0 {
                    self.eps_final
                } else {
                    let r = (-(step as f32) / decay).exp();
                    self.eps_final + (self.eps_start - self.eps_final) * r
                }
            }
        }
    }

    /// Takes an action based on action values `q`.
    ///
    /// With probability `eps(step)` the action is drawn uniformly, otherwise the
    /// greedy action is taken.
    pub fn action(&self, q: &[f32], step: usize, rng: &mut impl Rng) -> usize {
        if rng.gen::<f32>() < self.eps(step) {
            rng.gen_range(0..q.len())
        } else {
            argmax(q)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_linear_schedule() {
        let explorer = EpsilonGreedy::with_final_step(100)
            .eps_start(1.0)
            .eps_final(0.1);
        assert_eq!(explorer.eps(0), 1.0);
        assert!((explorer.eps(50) - 0.55).abs() < 1e-6);
        assert_eq!(explorer.eps(100), 0.1);
        assert_eq!(explorer.eps(1_000), 0.1);
    }

    #[test]
    fn test_exponential_schedule() {
        let explorer = EpsilonGreedy::default();
        assert!((explorer.eps(0) - 0.95).abs() < 1e-6);
        let expected = 0.01 + 0.94 * (-1.0f32).exp();
        assert!((explorer.eps(500) - expected).abs() < 1e-6);

        // Monotonically non-increasing and bounded below.
        let mut prev = explorer.eps(0);
        for step in 1..5_000 {
            let eps = explorer.eps(step);
            assert!(eps <= prev && eps >= 0.01);
            prev = eps;
        }
    }

    #[test]
    fn test_greedy_action() {
        let explorer = EpsilonGreedy::with_final_step(0).eps_final(0.0);
        let mut rng = SmallRng::seed_from_u64(42);
        for step in 0..100 {
            assert_eq!(explorer.action(&[0.1, 0.7, 0.7, 0.2], step, &mut rng), 1);
        }
    }

    #[test]
    fn test_random_action_covers_all() {
        let explorer = EpsilonGreedy::with_final_step(1).eps_start(1.0).eps_final(1.0);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for step in 0..300 {
            counts[explorer.action(&[0.0, 1.0, 0.0], step, &mut rng)] += 1;
        }
        assert!(counts.iter().all(|&c| c > 50), "counts = {:?}", counts);
    }
}
