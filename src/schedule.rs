//! Per-epoch schedules for exploration rate and learning rate.

use serde::{Deserialize, Serialize};

use crate::error::{BalanceError, Result};

/// A value that evolves with the epoch index
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Schedule {
    /// Same value at every step
    Constant { value: f32 },

    /// Linear interpolation from `start` to `end` over `steps`, then `end`
    Linear { start: f32, end: f32, steps: usize },

    /// value = max(initial * decay^step, floor)
    ExponentialDecay { initial: f32, decay: f32, floor: f32 },

    /// value = initial * decay^(step / step_size)
    StepDecay {
        initial: f32,
        decay: f32,
        step_size: usize,
    },

    /// value = min + 0.5 * (max - min) * (1 + cos(pi * (step % period) / period))
    CosineAnnealing { max: f32, min: f32, period: usize },
}

impl Schedule {
    /// Value of the schedule at `step`
    pub fn value_at(&self, step: usize) -> f32 {
        match *self {
            Schedule::Constant { value } => value,

            Schedule::Linear { start, end, steps } => {
                if step >= steps {
                    end
                } else {
                    let progress = step as f32 / steps as f32;
                    start - (start - end) * progress
                }
            }

            Schedule::ExponentialDecay { initial, decay, floor } => {
                // exponent clamped to i32 range
                let exponent = step.min(i32::MAX as usize) as i32;
                (initial * decay.powi(exponent)).max(floor)
            }

            Schedule::StepDecay { initial, decay, step_size } => {
                let num_decays = (step / step_size.max(1)) as f32;
                initial * decay.powf(num_decays)
            }

            Schedule::CosineAnnealing { max, min, period } => {
                let period = period.max(1);
                let progress = (step % period) as f32 / period as f32;
                min + 0.5 * (max - min) * (1.0 + (std::f32::consts::PI * progress).cos())
            }
        }
    }

    pub fn constant(value: f32) -> Self {
        Schedule::Constant { value }
    }

    /// Epsilon schedule: decays from `upper` to `lower` over
    /// `floor(decay_fraction * total_epochs)` epochs.
    pub fn epsilon(upper: f32, lower: f32, decay_fraction: f32, total_epochs: usize) -> Result<Self> {
        for (name, value) in [("epsilon_upper", upper), ("epsilon_lower", lower), ("eps_decay_fraction", decay_fraction)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BalanceError::invalid_parameter(name, format!("{} is outside [0, 1]", value)));
            }
        }
        if lower > upper {
            return Err(BalanceError::invalid_parameter(
                "epsilon_bounds",
                format!("lower bound {} exceeds upper bound {}", lower, upper),
            ));
        }

        let steps = (decay_fraction as f64 * total_epochs as f64).floor() as usize;
        Ok(Schedule::Linear {
            start: upper,
            end: lower,
            steps,
        })
    }

    /// Multiplicative learning-rate decay that holds once it reaches `floor`.
    pub fn learning_rate(initial: f32, decay: f32, floor: f32) -> Result<Self> {
        if !(initial > 0.0 && initial.is_finite()) {
            return Err(BalanceError::invalid_parameter("lr", format!("{} must be positive", initial)));
        }
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(BalanceError::invalid_parameter("lr_decay", format!("{} is outside (0, 1]", decay)));
        }
        if !(0.0..=initial).contains(&floor) {
            return Err(BalanceError::invalid_parameter(
                "min_lr",
                format!("{} must lie in [0, {}]", floor, initial),
            ));
        }
        Ok(Schedule::ExponentialDecay { initial, decay, floor })
    }

    pub fn step_decay(initial: f32, decay: f32, step_size: usize) -> Self {
        Schedule::StepDecay {
            initial,
            decay,
            step_size,
        }
    }

    pub fn cosine_annealing(max: f32, min: f32, period: usize) -> Self {
        Schedule::CosineAnnealing { max, min, period }
    }
}
