//! # Activation Functions Module
//!
//! Element-wise non-linearities applied after each dense layer. Hidden layers
//! default to ReLU; the value and policy heads are usually linear (the policy
//! logits are turned into a distribution by `agent::policy::softmax`).
//!
//! Activations can be parsed from the lower-case names used on the command
//! line and in `params.json`:
//!
//! ```rust
//! use balance::activations::Activation;
//!
//! let relu: Activation = "relu".parse().unwrap();
//! assert_eq!(relu, Activation::Relu);
//! assert!("softplus".parse::<Activation>().is_err());
//! ```

pub mod functions;

pub use functions::Activation;
