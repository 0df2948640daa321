//! # losskit
//!
//! losskit is a collection of loss functions for neural-network training,
//! written in Rust on top of `ndarray` and modelled on PyTorch's `torch.nn`
//! losses.
//!
//! ## Features
//!
//! - Thirteen loss kinds: regression (L1, MSE, Smooth L1, KL divergence),
//!   classification (BCE, soft margin, multi-class and multi-label margins),
//!   embedding (hinge, cosine, triplet) and sequence (CTC) losses
//! - Stateless numerical kernels in [`ops`], usable without any module
//! - Configurable modules in [`nn`] with `none`, `mean` and `sum` reductions
//! - Named buffers for class weights, restorable from saved tensors
//! - Serde-tagged [`nn::LossOptions`] so a loss can be picked from a config file
//! - Written 100% in safe Rust
//!
//! ## Example
//!
//! ```rust
//! use losskit::nn::{Loss, LossModule, LossOptions, MSELossOptions};
//! use losskit::{Reduction, Tensor};
//!
//! let options = LossOptions::Mse(MSELossOptions::default().reduction(Reduction::Sum));
//! let loss = LossModule::new(options).unwrap();
//!
//! let input = Tensor::<f64>::from_f64(&[1.0, 2.0, 3.0], &[3]).unwrap();
//! let target = Tensor::from_f64(&[1.0, 0.0, 0.0], &[3]).unwrap();
//! let value = loss.forward(&[&input, &target]).unwrap();
//!
//! assert_eq!(value.first().unwrap(), 13.0);
//! assert_eq!(loss.reduction(), Reduction::Sum);
//! ```
pub mod backend;
pub mod error;
pub mod nn;
pub mod ops;
pub mod tensor;

// Re-export commonly used types for convenience
pub use backend::Float;
pub use error::{LossError, Result};
pub use nn::{Loss, LossModule, LossOptions, Module};
pub use ops::Reduction;
pub use tensor::Tensor;
