// src/nn/losses/embedding.rs
// Losses that judge whether embeddings are similar or dissimilar.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::nn::losses::{
    CosineEmbeddingLossOptions, HingeEmbeddingLossOptions, Loss, TripletMarginLossOptions, unpack,
};
use crate::nn::module::Module;
use crate::ops::{self, Reduction};
use crate::tensor::Tensor;
use std::fmt;
use std::marker::PhantomData;

/// Hinge embedding loss over distances and ±1 targets.
///
/// Similar pairs (y = 1) pay their distance, dissimilar pairs (y = -1) pay
/// `max(0, margin - x)`.
#[derive(Debug, Clone)]
pub struct HingeEmbeddingLoss<T> {
    options: HingeEmbeddingLossOptions,
    _phantom: PhantomData<T>,
}

impl<T> HingeEmbeddingLoss<T>
where
    T: Float,
{
    pub fn new(options: HingeEmbeddingLossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &HingeEmbeddingLossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut HingeEmbeddingLossOptions {
        &mut self.options
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::hinge_embedding_loss(input, target, self.options.margin, self.options.reduction)
    }
}

impl<T> Default for HingeEmbeddingLoss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(HingeEmbeddingLossOptions::default())
    }
}

impl<T> fmt::Display for HingeEmbeddingLoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HingeEmbeddingLoss(margin={}, reduction={})",
            self.options.margin, self.options.reduction
        )
    }
}

impl<T> Module<T> for HingeEmbeddingLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "HingeEmbeddingLoss"
    }
}

impl<T> Loss<T> for HingeEmbeddingLoss<T>
where
    T: Float,
{
    fn arity(&self) -> usize {
        2
    }

    fn evaluate(&self, inputs: &[&Tensor<T>]) -> Result<Tensor<T>> {
        let [input, target] = unpack::<T, 2>(self.name(), inputs)?;
        self.forward(input, target)
    }

    fn reduction(&self) -> Reduction {
        self.options.reduction
    }
}

/// Cosine embedding loss over paired rows and ±1 targets.
#[derive(Debug, Clone)]
pub struct CosineEmbeddingLoss<T> {
    options: CosineEmbeddingLossOptions,
    _phantom: PhantomData<T>,
}

impl<T> CosineEmbeddingLoss<T>
where
    T: Float,
{
    pub fn new(options: CosineEmbeddingLossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &CosineEmbeddingLossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut CosineEmbeddingLossOptions {
        &mut self.options
    }

    pub fn forward(
        &self,
        input1: &Tensor<T>,
        input2: &Tensor<T>,
        target: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        ops::cosine_embedding_loss(
            input1,
            input2,
            target,
            self.options.margin,
            self.options.reduction,
        )
    }
}

impl<T> Default for CosineEmbeddingLoss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(CosineEmbeddingLossOptions::default())
    }
}

impl<T> fmt::Display for CosineEmbeddingLoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CosineEmbeddingLoss(margin={}, reduction={})",
            self.options.margin, self.options.reduction
        )
    }
}

impl<T> Module<T> for CosineEmbeddingLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "CosineEmbeddingLoss"
    }
}

impl<T> Loss<T> for CosineEmbeddingLoss<T>
where
    T: Float,
{
    fn arity(&self) -> usize {
        3
    }

    fn evaluate(&self, inputs: &[&Tensor<T>]) -> Result<Tensor<T>> {
        let [input1, input2, target] = unpack::<T, 3>(self.name(), inputs)?;
        self.forward(input1, input2, target)
    }

    fn reduction(&self) -> Reduction {
        self.options.reduction
    }
}

/// Triplet margin loss over (anchor, positive, negative) rows.
///
/// Pulls the anchor towards the positive and pushes it at least `margin`
/// further from the negative, measuring with the `p`-norm distance.
///
/// # Examples
///
/// ```rust
/// use losskit::nn::{TripletMarginLoss, TripletMarginLossOptions};
/// use losskit::Tensor;
///
/// let options = TripletMarginLossOptions::default().eps(0.0);
/// let loss = TripletMarginLoss::new(options).unwrap();
///
/// let anchor = Tensor::<f64>::from_f64(&[0.0, 0.0], &[1, 2]).unwrap();
/// let positive = Tensor::from_f64(&[3.0, 4.0], &[1, 2]).unwrap();
/// let negative = Tensor::from_f64(&[0.0, 5.5], &[1, 2]).unwrap();
///
/// // max(0, 5 - 5.5 + 1) = 0.5
/// let value = loss.forward(&anchor, &positive, &negative).unwrap().first().unwrap();
/// assert!((value - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct TripletMarginLoss<T> {
    options: TripletMarginLossOptions,
    _phantom: PhantomData<T>,
}

impl<T> TripletMarginLoss<T>
where
    T: Float,
{
    /// Fails unless `p` is positive and `eps` is non-negative.
    pub fn new(options: TripletMarginLossOptions) -> Result<Self> {
        let mut loss = Self {
            options,
            _phantom: PhantomData,
        };
        loss.reset()?;
        Ok(loss)
    }

    pub fn options(&self) -> &TripletMarginLossOptions {
        &self.options
    }

    /// Mutable options. Call [`Module::reset`] afterwards to revalidate.
    pub fn options_mut(&mut self) -> &mut TripletMarginLossOptions {
        &mut self.options
    }

    pub fn forward(
        &self,
        anchor: &Tensor<T>,
        positive: &Tensor<T>,
        negative: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        let o = &self.options;
        ops::triplet_margin_loss(
            anchor,
            positive,
            negative,
            o.margin,
            o.p,
            o.eps,
            o.swap,
            o.reduction,
        )
    }
}

impl<T> fmt::Display for TripletMarginLoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.options;
        write!(
            f,
            "TripletMarginLoss(margin={}, p={}, eps={}, swap={}, reduction={})",
            o.margin, o.p, o.eps, o.swap, o.reduction
        )
    }
}

impl<T> Module<T> for TripletMarginLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "TripletMarginLoss"
    }

    fn reset(&mut self) -> Result<()> {
        let TripletMarginLossOptions { p, eps, .. } = self.options;
        if !(p > 0.0) {
            return Err(LossError::config(
                self.name(),
                format!("norm degree p must be positive, got {p}"),
            ));
        }
        if !(eps >= 0.0) {
            return Err(LossError::config(
                self.name(),
                format!("eps must be non-negative, got {eps}"),
            ));
        }
        Ok(())
    }
}

impl<T> Loss<T> for TripletMarginLoss<T>
where
    T: Float,
{
    fn arity(&self) -> usize {
        3
    }

    fn evaluate(&self, inputs: &[&Tensor<T>]) -> Result<Tensor<T>> {
        let [anchor, positive, negative] = unpack::<T, 3>(self.name(), inputs)?;
        self.forward(anchor, positive, negative)
    }

    fn reduction(&self) -> Reduction {
        self.options.reduction
    }
}
