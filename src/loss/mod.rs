//! Regression losses used when an estimator is fitted towards explicit targets.

pub mod functions;

pub use functions::{HuberLoss, Loss, LossFunction, MSE};
