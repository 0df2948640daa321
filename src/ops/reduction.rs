// src/ops/reduction.rs
// Reduction strategies shared by every loss kernel.

use crate::backend::Float;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reduction strategy for loss functions.
///
/// Determines how per-element (or per-sample) losses collapse into the value a
/// kernel returns. `Sum` and `Mean` produce 0-dimensional tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// No reduction: return the loss for each element or sample
    None,
    /// Sum divided by the element or sample count of the loss tensor
    #[default]
    Mean,
    /// Sum of all losses
    Sum,
}

impl Reduction {
    pub fn name(&self) -> &'static str {
        match self {
            Reduction::None => "none",
            Reduction::Mean => "mean",
            Reduction::Sum => "sum",
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collapses an unreduced loss tensor according to `reduction`.
///
/// The mean divides by the number of elements of `loss`, which is the element
/// count for pointwise losses and the batch size for per-sample losses.
pub fn apply_reduction<T>(loss: Tensor<T>, reduction: Reduction) -> Tensor<T>
where
    T: Float,
{
    match reduction {
        Reduction::None => loss,
        Reduction::Sum => Tensor::scalar(loss.sum()),
        Reduction::Mean => Tensor::scalar(loss.mean()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_of_vector() {
        let loss = Tensor::<f64>::from_vec(vec![1.0, 2.0, 3.0, 6.0], &[2, 2]).unwrap();

        let none = apply_reduction(loss.clone(), Reduction::None);
        assert_eq!(none.shape(), &[2, 2]);
        assert!(none.ptr_eq(&loss));

        let sum = apply_reduction(loss.clone(), Reduction::Sum);
        assert_eq!(sum.shape(), &[] as &[usize]);
        assert_eq!(sum.first().unwrap(), 12.0);

        let mean = apply_reduction(loss, Reduction::Mean);
        assert_eq!(mean.first().unwrap(), 3.0);
    }

    #[test]
    fn test_mean_of_empty_loss_is_nan() {
        let loss = Tensor::<f32>::zeros(&[0]);
        assert!(apply_reduction(loss.clone(), Reduction::Mean).first().unwrap().is_nan());
        assert_eq!(apply_reduction(loss, Reduction::Sum).first().unwrap(), 0.0);
    }

    #[test]
    fn test_default_and_names() {
        assert_eq!(Reduction::default(), Reduction::Mean);
        assert_eq!(Reduction::Sum.to_string(), "sum");
        assert_eq!(format!("{}", Reduction::None), "none");
    }
}
