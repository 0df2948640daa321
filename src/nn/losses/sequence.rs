// src/nn/losses/sequence.rs
// Sequence losses that marginalise over alignments.

use crate::backend::Float;
use crate::error::Result;
use crate::nn::losses::{CTCLossOptions, Loss, unpack};
use crate::nn::module::Module;
use crate::ops::{self, Reduction};
use crate::tensor::Tensor;
use std::fmt;
use std::marker::PhantomData;

/// Connectionist Temporal Classification loss.
///
/// Scores every alignment of a label sequence to a longer sequence of
/// per-timestep log-probabilities, with `blank` marking "no label".
///
/// Inputs, in order:
/// * `log_probs` - (T, N, C) log-probabilities, or (T, C) for one sample
/// * `targets` - padded (N, S) labels or all labels concatenated in 1-D
/// * `input_lengths` - (N) valid timesteps per sample
/// * `target_lengths` - (N) valid labels per sample
#[derive(Debug, Clone)]
pub struct CTCLoss<T> {
    options: CTCLossOptions,
    _phantom: PhantomData<T>,
}

impl<T> CTCLoss<T>
where
    T: Float,
{
    pub fn new(options: CTCLossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &CTCLossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut CTCLossOptions {
        &mut self.options
    }

    pub fn forward(
        &self,
        log_probs: &Tensor<T>,
        targets: &Tensor<T>,
        input_lengths: &Tensor<T>,
        target_lengths: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        ops::ctc_loss(
            log_probs,
            targets,
            input_lengths,
            target_lengths,
            self.options.blank,
            self.options.zero_infinity,
            self.options.reduction,
        )
    }
}

impl<T> Default for CTCLoss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(CTCLossOptions::default())
    }
}

impl<T> fmt::Display for CTCLoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CTCLoss(blank={}, zero_infinity={}, reduction={})",
            self.options.blank, self.options.zero_infinity, self.options.reduction
        )
    }
}

impl<T> Module<T> for CTCLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "CTCLoss"
    }
}

impl<T> Loss<T> for CTCLoss<T>
where
    T: Float,
{
    fn arity(&self) -> usize {
        4
    }

    fn evaluate(&self, inputs: &[&Tensor<T>]) -> Result<Tensor<T>> {
        let [log_probs, targets, input_lengths, target_lengths] =
            unpack::<T, 4>(self.name(), inputs)?;
        self.forward(log_probs, targets, input_lengths, target_lengths)
    }

    fn reduction(&self) -> Reduction {
        self.options.reduction
    }
}
