//! Utilities for interaction of agents and environments.
use crate::{
    record::{Record, RecordValue, Recorder},
    Env, Policy,
};
use anyhow::Result;
use log::info;

/// Returns the index of the largest value.
///
/// Ties are broken by the lowest index. NaN is selected only if all values are NaN.
pub fn argmax(xs: &[f32]) -> usize {
    let mut ix = 0;
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if x > xs[ix] || xs[ix].is_nan() {
            ix = i;
        }
    }
    ix
}

/// Returns the largest value, `-inf` for an empty slice.
pub fn max(xs: &[f32]) -> f32 {
    xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
}

/// Run episodes with a policy and recorder.
///
/// An episode ends when the environment is terminated or truncated, or after
/// `max_steps` steps. Returns the cumulative reward of each episode.
pub fn eval_with_recorder<E, P, R>(
    env: &mut E,
    policy: &mut P,
    n_episodes: usize,
    max_steps: usize,
    recorder: &mut R,
) -> Result<Vec<f32>>
where
    E: Env,
    P: Policy<E>,
    R: Recorder,
{
    let mut rs = Vec::new();

    for episode in 0..n_episodes {
        let mut prev_obs = env.reset()?;
        let mut r_total = 0.0;
        let mut count_step = 0;

        while count_step < max_steps {
            let act = policy.sample(&prev_obs);
            let step = env.step(act)?;
            r_total += step.reward;
            count_step += 1;
            if step.is_done() {
                break;
            }
            prev_obs = step.obs;
        }

        let mut record = Record::from_scalar("eval_reward", r_total);
        record.insert("episode", RecordValue::Scalar(episode as _));
        record.insert("steps", RecordValue::Scalar(count_step as _));
        recorder.write(record);
        info!(
            "Eval episode {}, {} steps, reward = {:.3}",
            episode, count_step, r_total
        );
        rs.push(r_total);
    }

    Ok(rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[-1.0]), 0);
        assert_eq!(argmax(&[f32::NAN, -5.0, 2.0]), 2);
        assert_eq!(argmax(&[1.0, f32::NAN, 0.5]), 0);
    }

    #[test]
    fn test_max() {
        assert_eq!(max(&[1.0, 4.0, -2.0]), 4.0);
        assert_eq!(max(&[]), f32::NEG_INFINITY);
    }
}
