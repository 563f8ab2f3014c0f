//! Action-selection primitives shared by the agents.

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{BalanceError, Result};

/// Index of the largest value. Ties go to the first index and NaN entries
/// never win. Returns `None` when no entry is comparable.
pub fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Numerically stable softmax
pub fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Natural log of the softmax probability of `index`
pub fn log_softmax_at(logits: ArrayView1<f32>, index: usize) -> f32 {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let log_sum = logits.mapv(|x| (x - max).exp()).sum().ln();
    logits[index] - max - log_sum
}

/// Draw an index from a discrete distribution.
///
/// Fails with `NumericalError` if any probability is negative or not finite,
/// or if the total mass is not a positive finite number.
pub fn sample_categorical(probs: ArrayView1<f32>, rng: &mut StdRng) -> Result<usize> {
    if probs.iter().any(|&p| !p.is_finite() || p < 0.0) {
        return Err(BalanceError::NumericalError(format!(
            "invalid action distribution {:?}",
            probs.to_vec()
        )));
    }
    let total = probs.sum();
    if !(total > 0.0 && total.is_finite()) {
        return Err(BalanceError::NumericalError(format!(
            "action distribution sums to {}",
            total
        )));
    }

    let threshold = rng.gen::<f32>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &p) in probs.iter().enumerate() {
        if p > 0.0 {
            last_positive = i;
        }
        cumulative += p;
        if threshold < cumulative {
            return Ok(i);
        }
    }
    // rounding left the threshold past the cumulative sum
    Ok(last_positive)
}

/// With probability `epsilon` a uniformly random action, otherwise the argmax
/// of `q_values`.
pub fn epsilon_greedy(q_values: ArrayView1<f32>, epsilon: f32, rng: &mut StdRng) -> Result<usize> {
    if q_values.is_empty() {
        return Err(BalanceError::invalid_parameter("q_values", "no actions to choose from"));
    }
    if rng.gen::<f32>() < epsilon {
        return Ok(rng.gen_range(0..q_values.len()));
    }
    argmax(q_values).ok_or_else(|| BalanceError::NumericalError("all action values are NaN".to_string()))
}
