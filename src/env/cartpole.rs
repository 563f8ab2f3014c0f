use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::Rng;

use super::{Environment, Step, StepInfo};
use crate::error::{BalanceError, Result};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
const HALF_LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * HALF_LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;

/// Cart-pole balancing task with a step limit (500 by default).
///
/// Observation: `[x, x_dot, theta, theta_dot]`. Actions: 0 pushes left,
/// 1 pushes right. Every step, including the last, yields reward 1.0.
#[derive(Clone, Debug)]
pub struct CartPole {
    state: [f32; 4],
    steps: usize,
    max_steps: usize,
    done: bool,
}

impl CartPole {
    pub fn new() -> Self {
        Self::with_max_steps(500)
    }

    pub fn with_max_steps(max_steps: usize) -> Self {
        CartPole {
            state: [0.0; 4],
            steps: 0,
            max_steps,
            done: true,
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    fn observation(&self) -> Array1<f32> {
        array![self.state[0], self.state[1], self.state[2], self.state[3]]
    }

    fn failed(&self) -> bool {
        let [x, _, theta, _] = self.state;
        x.abs() > X_THRESHOLD || theta.abs() > THETA_THRESHOLD
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    fn observation_dim(&self) -> usize {
        4
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self, rng: &mut StdRng) -> Result<Array1<f32>> {
        for value in self.state.iter_mut() {
            *value = rng.gen_range(-0.05..0.05);
        }
        self.steps = 0;
        self.done = false;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        if action >= 2 {
            return Err(BalanceError::InvalidAction { action, max_actions: 2 });
        }
        if self.done {
            return Err(BalanceError::EnvironmentError(
                "step() called on a finished episode; call reset() first".to_string(),
            ));
        }

        let [x, x_dot, theta, theta_dot] = self.state;
        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let cos_theta = theta.cos();
        let sin_theta = theta.sin();

        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (HALF_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];
        self.steps += 1;

        let failed = self.failed();
        let truncated = !failed && self.steps >= self.max_steps;
        self.done = failed || truncated;

        Ok(Step {
            next_state: self.observation(),
            reward: 1.0,
            done: self.done,
            info: StepInfo { truncated },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_reset_is_small_and_seeded() {
        let mut env = CartPole::new();
        let mut rng = StdRng::seed_from_u64(1);
        let a = env.reset(&mut rng).unwrap();
        assert!(a.iter().all(|v| v.abs() < 0.05));

        let mut rng = StdRng::seed_from_u64(1);
        let b = env.reset(&mut rng).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_push_fails_before_limit() {
        let mut env = CartPole::new();
        let mut rng = StdRng::seed_from_u64(0);
        env.reset(&mut rng).unwrap();

        let mut steps = 0;
        loop {
            let step = env.step(1).unwrap();
            steps += 1;
            assert_eq!(step.reward, 1.0);
            if step.done {
                assert!(!step.info.truncated);
                break;
            }
        }
        assert!(steps < 100);
        assert!(env.step(0).is_err());
    }

    #[test]
    fn test_step_limit_truncates() {
        let mut env = CartPole::with_max_steps(3);
        let mut rng = StdRng::seed_from_u64(0);
        env.reset(&mut rng).unwrap();

        assert!(!env.step(0).unwrap().done);
        assert!(!env.step(1).unwrap().done);
        let last = env.step(0).unwrap();
        assert!(last.done);
        assert!(last.info.truncated);
    }

    #[test]
    fn test_invalid_action() {
        let mut env = CartPole::new();
        let mut rng = StdRng::seed_from_u64(0);
        env.reset(&mut rng).unwrap();
        assert!(matches!(env.step(2), Err(BalanceError::InvalidAction { action: 2, .. })));
    }
}
