// src/nn/losses/options.rs
// Configuration records, one per loss kind. Options are plain data with
// chainable setters; validation happens when a module is built or reset.

use crate::backend::Float;
use crate::ops::Reduction;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Options for [`L1Loss`](super::L1Loss).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct L1LossOptions {
    pub reduction: Reduction,
}

/// Options for [`MSELoss`](super::MSELoss).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MSELossOptions {
    pub reduction: Reduction,
}

/// Options for [`KLDivLoss`](super::KLDivLoss).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KLDivLossOptions {
    pub reduction: Reduction,
    /// Whether the target is given as log-probabilities
    pub log_target: bool,
}

/// Options for [`SmoothL1Loss`](super::SmoothL1Loss).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothL1LossOptions {
    pub reduction: Reduction,
    /// Distance at which the loss switches from quadratic to linear
    pub beta: f64,
}

impl Default for SmoothL1LossOptions {
    fn default() -> Self {
        Self {
            reduction: Reduction::Mean,
            beta: 1.0,
        }
    }
}

/// Options for [`SoftMarginLoss`](super::SoftMarginLoss).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftMarginLossOptions {
    pub reduction: Reduction,
}

/// Options for [`BCELoss`](super::BCELoss).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound = "")]
pub struct BCELossOptions<T>
where
    T: Float,
{
    /// Rescaling weight applied to the unreduced loss
    pub weight: Option<Tensor<T>>,
    pub reduction: Reduction,
}

impl<T> Default for BCELossOptions<T>
where
    T: Float,
{
    fn default() -> Self {
        Self {
            weight: None,
            reduction: Reduction::Mean,
        }
    }
}

/// Options for [`HingeEmbeddingLoss`](super::HingeEmbeddingLoss).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HingeEmbeddingLossOptions {
    pub margin: f64,
    pub reduction: Reduction,
}

impl Default for HingeEmbeddingLossOptions {
    fn default() -> Self {
        Self {
            margin: 1.0,
            reduction: Reduction::Mean,
        }
    }
}

/// Options for [`MultiMarginLoss`](super::MultiMarginLoss).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound = "")]
pub struct MultiMarginLossOptions<T>
where
    T: Float,
{
    /// Exponent of the hinge, 1 or 2
    pub p: u32,
    pub margin: f64,
    /// Per-class weight, indexed by the correct class
    pub weight: Option<Tensor<T>>,
    pub reduction: Reduction,
}

impl<T> Default for MultiMarginLossOptions<T>
where
    T: Float,
{
    fn default() -> Self {
        Self {
            p: 1,
            margin: 1.0,
            weight: None,
            reduction: Reduction::Mean,
        }
    }
}

/// Options for [`CosineEmbeddingLoss`](super::CosineEmbeddingLoss).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CosineEmbeddingLossOptions {
    pub margin: f64,
    pub reduction: Reduction,
}

/// Options for [`MultiLabelMarginLoss`](super::MultiLabelMarginLoss).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiLabelMarginLossOptions {
    pub reduction: Reduction,
}

/// Options for [`MultiLabelSoftMarginLoss`](super::MultiLabelSoftMarginLoss).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound = "")]
pub struct MultiLabelSoftMarginLossOptions<T>
where
    T: Float,
{
    /// Per-class weight
    pub weight: Option<Tensor<T>>,
    pub reduction: Reduction,
}

impl<T> Default for MultiLabelSoftMarginLossOptions<T>
where
    T: Float,
{
    fn default() -> Self {
        Self {
            weight: None,
            reduction: Reduction::Mean,
        }
    }
}

/// Options for [`TripletMarginLoss`](super::TripletMarginLoss).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripletMarginLossOptions {
    pub margin: f64,
    /// Degree of the pairwise distance norm; infinity selects the max-norm
    pub p: f64,
    /// Added to every coordinate difference before taking the norm
    pub eps: f64,
    /// Use the positive-negative distance when it is the smaller one
    pub swap: bool,
    pub reduction: Reduction,
}

impl Default for TripletMarginLossOptions {
    fn default() -> Self {
        Self {
            margin: 1.0,
            p: 2.0,
            eps: 1e-6,
            swap: false,
            reduction: Reduction::Mean,
        }
    }
}

/// Options for [`CTCLoss`](super::CTCLoss).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CTCLossOptions {
    /// Class index reserved for the blank symbol
    pub blank: usize,
    /// Replace infinite per-sample losses with zero
    pub zero_infinity: bool,
    pub reduction: Reduction,
}

// Chainable setters, e.g. `TripletMarginLossOptions::default().margin(0.5).swap(true)`.
macro_rules! setters {
    ($options:ident<T> { $($field:ident : $ty:ty),* $(,)? }) => {
        impl<T> $options<T>
        where
            T: Float,
        {
            $(
                pub fn $field(mut self, $field: $ty) -> Self {
                    self.$field = $field;
                    self
                }
            )*
        }
    };
    ($options:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        impl $options {
            $(
                pub fn $field(mut self, $field: $ty) -> Self {
                    self.$field = $field;
                    self
                }
            )*
        }
    };
}

setters!(L1LossOptions { reduction: Reduction });
setters!(MSELossOptions { reduction: Reduction });
setters!(KLDivLossOptions { reduction: Reduction, log_target: bool });
setters!(SmoothL1LossOptions { reduction: Reduction, beta: f64 });
setters!(SoftMarginLossOptions { reduction: Reduction });
setters!(BCELossOptions<T> { weight: Option<Tensor<T>>, reduction: Reduction });
setters!(HingeEmbeddingLossOptions { margin: f64, reduction: Reduction });
setters!(MultiMarginLossOptions<T> {
    p: u32,
    margin: f64,
    weight: Option<Tensor<T>>,
    reduction: Reduction,
});
setters!(CosineEmbeddingLossOptions { margin: f64, reduction: Reduction });
setters!(MultiLabelMarginLossOptions { reduction: Reduction });
setters!(MultiLabelSoftMarginLossOptions<T> { weight: Option<Tensor<T>>, reduction: Reduction });
setters!(TripletMarginLossOptions {
    margin: f64,
    p: f64,
    eps: f64,
    swap: bool,
    reduction: Reduction,
});
setters!(CTCLossOptions { blank: usize, zero_infinity: bool, reduction: Reduction });
