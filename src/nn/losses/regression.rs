// src/nn/losses/regression.rs
// Element-wise losses between a prediction and a target of broadcastable shape.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::nn::losses::{
    KLDivLossOptions, L1LossOptions, Loss, MSELossOptions, SmoothL1LossOptions, unpack,
};
use crate::nn::module::Module;
use crate::ops::{self, Reduction};
use crate::tensor::Tensor;
use std::fmt;
use std::marker::PhantomData;

/// Mean Absolute Error Loss: L1 = |input - target|
/// Less sensitive to outliers than MSE, used for robust regression
#[derive(Debug, Clone)]
pub struct L1Loss<T> {
    options: L1LossOptions,
    _phantom: PhantomData<T>,
}

impl<T> L1Loss<T>
where
    T: Float,
{
    pub fn new(options: L1LossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &L1LossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut L1LossOptions {
        &mut self.options
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::l1_loss(input, target, self.options.reduction)
    }
}

impl<T> Default for L1Loss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(L1LossOptions::default())
    }
}

impl<T> fmt::Display for L1Loss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L1Loss(reduction={})", self.options.reduction)
    }
}

impl<T> Module<T> for L1Loss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "L1Loss"
    }
}

impl<T> Loss<T> for L1Loss<T>
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

/// Mean Squared Error Loss: MSE = (input - target)²
/// Used for regression tasks where targets are continuous values
#[derive(Debug, Clone)]
pub struct MSELoss<T> {
    options: MSELossOptions,
    _phantom: PhantomData<T>,
}

impl<T> MSELoss<T>
where
    T: Float,
{
    pub fn new(options: MSELossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &MSELossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut MSELossOptions {
        &mut self.options
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::mse_loss(input, target, self.options.reduction)
    }
}

impl<T> Default for MSELoss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(MSELossOptions::default())
    }
}

impl<T> fmt::Display for MSELoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MSELoss(reduction={})", self.options.reduction)
    }
}

impl<T> Module<T> for MSELoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "MSELoss"
    }
}

impl<T> Loss<T> for MSELoss<T>
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

/// Smooth L1 (Huber-style) loss.
///
/// Quadratic for differences below `beta`, linear above. `beta == 0`
/// degenerates to [`L1Loss`].
#[derive(Debug, Clone)]
pub struct SmoothL1Loss<T> {
    options: SmoothL1LossOptions,
    _phantom: PhantomData<T>,
}

impl<T> SmoothL1Loss<T>
where
    T: Float,
{
    /// Fails if `beta` is negative or NaN.
    pub fn new(options: SmoothL1LossOptions) -> Result<Self> {
        let mut loss = Self {
            options,
            _phantom: PhantomData,
        };
        loss.reset()?;
        Ok(loss)
    }

    pub fn options(&self) -> &SmoothL1LossOptions {
        &self.options
    }

    /// Mutable options. Call [`Module::reset`] afterwards to revalidate.
    pub fn options_mut(&mut self) -> &mut SmoothL1LossOptions {
        &mut self.options
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::smooth_l1_loss(input, target, self.options.beta, self.options.reduction)
    }
}

impl<T> fmt::Display for SmoothL1Loss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SmoothL1Loss(beta={}, reduction={})",
            self.options.beta, self.options.reduction
        )
    }
}

impl<T> Module<T> for SmoothL1Loss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "SmoothL1Loss"
    }

    fn reset(&mut self) -> Result<()> {
        let beta = self.options.beta;
        if !(beta >= 0.0) {
            return Err(LossError::config(
                "SmoothL1Loss",
                format!("beta must be non-negative, got {beta}"),
            ));
        }
        Ok(())
    }
}

impl<T> Loss<T> for SmoothL1Loss<T>
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

/// Kullback-Leibler divergence loss.
///
/// `input` holds log-probabilities. `target` holds probabilities, or
/// log-probabilities when `log_target` is set.
#[derive(Debug, Clone)]
pub struct KLDivLoss<T> {
    options: KLDivLossOptions,
    _phantom: PhantomData<T>,
}

impl<T> KLDivLoss<T>
where
    T: Float,
{
    pub fn new(options: KLDivLossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &KLDivLossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut KLDivLossOptions {
        &mut self.options
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::kl_div(input, target, self.options.log_target, self.options.reduction)
    }
}

impl<T> Default for KLDivLoss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(KLDivLossOptions::default())
    }
}

impl<T> fmt::Display for KLDivLoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KLDivLoss(log_target={}, reduction={})",
            self.options.log_target, self.options.reduction
        )
    }
}

impl<T> Module<T> for KLDivLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "KLDivLoss"
    }
}

impl<T> Loss<T> for KLDivLoss<T>
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
