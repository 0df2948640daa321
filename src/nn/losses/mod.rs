pub mod classification;
pub mod embedding;
pub mod options;
pub mod regression;
pub mod sequence;

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::nn::buffer::BufferMap;
use crate::nn::module::Module;
use crate::ops::Reduction;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use classification::{
    BCELoss, MultiLabelMarginLoss, MultiLabelSoftMarginLoss, MultiMarginLoss, SoftMarginLoss,
};
pub use embedding::{CosineEmbeddingLoss, HingeEmbeddingLoss, TripletMarginLoss};
pub use options::*;
pub use regression::{KLDivLoss, L1Loss, MSELoss, SmoothL1Loss};
pub use sequence::CTCLoss;

/// Base trait for all loss functions.
/// Mirrors PyTorch's loss interface: every loss is a module that maps a fixed
/// number of input tensors to a loss tensor.
pub trait Loss<T>: Module<T>
where
    T: Float,
{
    /// Number of tensors `evaluate` consumes.
    fn arity(&self) -> usize;

    /// Evaluates the loss on positional inputs, in the same order as the
    /// concrete type's `forward`.
    fn evaluate(&self, inputs: &[&Tensor<T>]) -> Result<Tensor<T>>;

    /// Reduction applied to the per-element or per-sample losses.
    fn reduction(&self) -> Reduction {
        Reduction::Mean
    }
}

/// Splits positional inputs into exactly `N` tensors.
pub(crate) fn unpack<'a, T, const N: usize>(
    loss: &'static str,
    inputs: &[&'a Tensor<T>],
) -> Result<[&'a Tensor<T>; N]>
where
    T: Float,
{
    <[&'a Tensor<T>; N]>::try_from(inputs).map_err(|_| LossError::Arity {
        loss,
        expected: N,
        got: inputs.len(),
    })
}

/// Rejects weights that are not 1-D.
pub(crate) fn check_class_weight<T>(loss: &'static str, weight: Option<&Tensor<T>>) -> Result<()>
where
    T: Float,
{
    match weight {
        Some(weight) if weight.ndim() != 1 => Err(LossError::config(
            loss,
            format!("weight must be 1-D, got shape {:?}", weight.shape()),
        )),
        _ => Ok(()),
    }
}

/// Re-registers the single `"weight"` slot of a weighted loss.
pub(crate) fn register_weight<T>(buffers: &mut BufferMap<T>, weight: Option<&Tensor<T>>)
where
    T: Float,
{
    buffers.register("weight", weight.cloned());
}

/// Renders an optional weight as `None` or `Tensor[shape]`.
pub(crate) fn describe_weight<T>(weight: Option<&Tensor<T>>) -> String
where
    T: Float,
{
    match weight {
        Some(weight) => format!("Tensor{:?}", weight.shape()),
        None => "None".to_string(),
    }
}

/// Options for any loss kind, tagged by `"kind"` when serialised.
///
/// ```rust
/// use losskit::nn::{Loss, LossModule, LossOptions};
///
/// let options: LossOptions<f64> =
///     serde_json::from_str(r#"{ "kind": "triplet_margin", "margin": 0.5, "swap": true }"#).unwrap();
/// let loss = LossModule::new(options).unwrap();
/// assert_eq!(loss.arity(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", bound = "")]
pub enum LossOptions<T>
where
    T: Float,
{
    L1(L1LossOptions),
    KlDiv(KLDivLossOptions),
    Mse(MSELossOptions),
    Bce(BCELossOptions<T>),
    HingeEmbedding(HingeEmbeddingLossOptions),
    MultiMargin(MultiMarginLossOptions<T>),
    CosineEmbedding(CosineEmbeddingLossOptions),
    MultiLabelSoftMargin(MultiLabelSoftMarginLossOptions<T>),
    TripletMargin(TripletMarginLossOptions),
    MultiLabelMargin(MultiLabelMarginLossOptions),
    SoftMargin(SoftMarginLossOptions),
    SmoothL1(SmoothL1LossOptions),
    Ctc(CTCLossOptions),
}

/// Any loss module, behind one closed dispatch.
///
/// Lets callers hold a loss chosen at runtime and evaluate it on a slice of
/// inputs; the slice length is checked against the kind's arity.
#[derive(Debug, Clone)]
pub enum LossModule<T>
where
    T: Float,
{
    L1(L1Loss<T>),
    KlDiv(KLDivLoss<T>),
    Mse(MSELoss<T>),
    Bce(BCELoss<T>),
    HingeEmbedding(HingeEmbeddingLoss<T>),
    MultiMargin(MultiMarginLoss<T>),
    CosineEmbedding(CosineEmbeddingLoss<T>),
    MultiLabelSoftMargin(MultiLabelSoftMarginLoss<T>),
    TripletMargin(TripletMarginLoss<T>),
    MultiLabelMargin(MultiLabelMarginLoss<T>),
    SoftMargin(SoftMarginLoss<T>),
    SmoothL1(SmoothL1Loss<T>),
    Ctc(CTCLoss<T>),
}

macro_rules! dispatch {
    ($module:expr, $loss:ident => $body:expr) => {
        match $module {
            LossModule::L1($loss) => $body,
            LossModule::KlDiv($loss) => $body,
            LossModule::Mse($loss) => $body,
            LossModule::Bce($loss) => $body,
            LossModule::HingeEmbedding($loss) => $body,
            LossModule::MultiMargin($loss) => $body,
            LossModule::CosineEmbedding($loss) => $body,
            LossModule::MultiLabelSoftMargin($loss) => $body,
            LossModule::TripletMargin($loss) => $body,
            LossModule::MultiLabelMargin($loss) => $body,
            LossModule::SoftMargin($loss) => $body,
            LossModule::SmoothL1($loss) => $body,
            LossModule::Ctc($loss) => $body,
        }
    };
}

impl<T> LossModule<T>
where
    T: Float,
{
    /// Builds the module for `options`, validating them.
    pub fn new(options: LossOptions<T>) -> Result<Self> {
        Ok(match options {
            LossOptions::L1(o) => Self::L1(L1Loss::new(o)),
            LossOptions::KlDiv(o) => Self::KlDiv(KLDivLoss::new(o)),
            LossOptions::Mse(o) => Self::Mse(MSELoss::new(o)),
            LossOptions::Bce(o) => Self::Bce(BCELoss::new(o)?),
            LossOptions::HingeEmbedding(o) => Self::HingeEmbedding(HingeEmbeddingLoss::new(o)),
            LossOptions::MultiMargin(o) => Self::MultiMargin(MultiMarginLoss::new(o)?),
            LossOptions::CosineEmbedding(o) => Self::CosineEmbedding(CosineEmbeddingLoss::new(o)),
            LossOptions::MultiLabelSoftMargin(o) => {
                Self::MultiLabelSoftMargin(MultiLabelSoftMarginLoss::new(o)?)
            }
            LossOptions::TripletMargin(o) => Self::TripletMargin(TripletMarginLoss::new(o)?),
            LossOptions::MultiLabelMargin(o) => {
                Self::MultiLabelMargin(MultiLabelMarginLoss::new(o))
            }
            LossOptions::SoftMargin(o) => Self::SoftMargin(SoftMarginLoss::new(o)),
            LossOptions::SmoothL1(o) => Self::SmoothL1(SmoothL1Loss::new(o)?),
            LossOptions::Ctc(o) => Self::Ctc(CTCLoss::new(o)),
        })
    }

    /// Snapshot of the options the module currently holds.
    pub fn options(&self) -> LossOptions<T> {
        match self {
            Self::L1(loss) => LossOptions::L1(*loss.options()),
            Self::KlDiv(loss) => LossOptions::KlDiv(*loss.options()),
            Self::Mse(loss) => LossOptions::Mse(*loss.options()),
            Self::Bce(loss) => LossOptions::Bce(loss.options().clone()),
            Self::HingeEmbedding(loss) => LossOptions::HingeEmbedding(*loss.options()),
            Self::MultiMargin(loss) => LossOptions::MultiMargin(loss.options().clone()),
            Self::CosineEmbedding(loss) => LossOptions::CosineEmbedding(*loss.options()),
            Self::MultiLabelSoftMargin(loss) => {
                LossOptions::MultiLabelSoftMargin(loss.options().clone())
            }
            Self::TripletMargin(loss) => LossOptions::TripletMargin(*loss.options()),
            Self::MultiLabelMargin(loss) => LossOptions::MultiLabelMargin(*loss.options()),
            Self::SoftMargin(loss) => LossOptions::SoftMargin(*loss.options()),
            Self::SmoothL1(loss) => LossOptions::SmoothL1(*loss.options()),
            Self::Ctc(loss) => LossOptions::Ctc(*loss.options()),
        }
    }

    /// Evaluates the loss on positional inputs.
    pub fn forward(&self, inputs: &[&Tensor<T>]) -> Result<Tensor<T>> {
        self.evaluate(inputs)
    }
}

impl<T> fmt::Display for LossModule<T>
where
    T: Float,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, loss => fmt::Display::fmt(loss, f))
    }
}

impl<T> Module<T> for LossModule<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        dispatch!(self, loss => loss.name())
    }

    fn reset(&mut self) -> Result<()> {
        dispatch!(self, loss => loss.reset())
    }

    fn buffers(&self) -> Option<&BufferMap<T>> {
        dispatch!(self, loss => loss.buffers())
    }

    fn load_buffer(&mut self, name: &str, tensor: Tensor<T>) -> Result<()> {
        dispatch!(self, loss => loss.load_buffer(name, tensor))
    }
}

impl<T> Loss<T> for LossModule<T>
where
    T: Float,
{
    fn arity(&self) -> usize {
        dispatch!(self, loss => loss.arity())
    }

    fn evaluate(&self, inputs: &[&Tensor<T>]) -> Result<Tensor<T>> {
        dispatch!(self, loss => loss.evaluate(inputs))
    }

    fn reduction(&self) -> Reduction {
        dispatch!(self, loss => loss.reduction())
    }
}
