//! Scheduling the exponent of importance weight for PER.
use serde::{Deserialize, Serialize};

/// Scheduler of the exponent of importance weight for PER.
///
/// $\beta$ is annealed linearly from `beta_0` to `beta_final` over `n_opts_final`
/// optimization steps. The scheduler keeps no counter; the caller passes the
/// number of optimization steps done so far.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IwScheduler {
    /// Initial value of $\beta$.
    pub beta_0: f32,

    /// Final value of $\beta$.
    pub beta_final: f32,

    /// Optimization steps when beta reaches its final value.
    pub n_opts_final: usize,
}

impl Default for IwScheduler {
    fn default() -> Self {
        Self {
            beta_0: 0.4,
            beta_final: 1.0,
            n_opts_final: 600,
        }
    }
}

impl IwScheduler {
    /// Creates a scheduler.
    pub fn new(beta_0: f32, beta_final: f32, n_opts_final: usize) -> Self {
        Self {
            beta_0,
            beta_final,
            n_opts_final,
        }
    }

    /// Gets the exponent of importance sampling weight after `n_opts` optimization steps.
    pub fn beta(&self, n_opts: usize) -> f32 {
        if n_opts >= self.n_opts_final {
            self.beta_final
        } else {
            let d = self.beta_final - self.beta_0;
            self.beta_0 + d * (n_opts as f32 / self.n_opts_final as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IwScheduler;

    #[test]
    fn test_beta_annealing() {
        let s = IwScheduler::new(0.4, 1.0, 100);
        assert_eq!(s.beta(0), 0.4);
        assert!((s.beta(50) - 0.7).abs() < 1e-6);
        assert_eq!(s.beta(100), 1.0);
        assert_eq!(s.beta(10_000), 1.0);

        // Pure function of the step counter.
        assert_eq!(s.beta(37), s.beta(37));
    }

    #[test]
    fn test_zero_length_schedule() {
        let s = IwScheduler::new(0.4, 1.0, 0);
        assert_eq!(s.beta(0), 1.0);
    }
}
