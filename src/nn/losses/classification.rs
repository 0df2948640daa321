// src/nn/losses/classification.rs
// Classification losses over probabilities, ±1 labels or class scores.
// Weighted losses keep their weight in a "weight" buffer that shares storage
// with the options.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::nn::buffer::BufferMap;
use crate::nn::losses::{
    BCELossOptions, Loss, MultiLabelMarginLossOptions, MultiLabelSoftMarginLossOptions,
    MultiMarginLossOptions, SoftMarginLossOptions, check_class_weight, describe_weight,
    register_weight, unpack,
};
use crate::nn::module::Module;
use crate::ops::{self, Reduction};
use crate::tensor::Tensor;
use std::fmt;
use std::mem;
use std::marker::PhantomData;

/// Binary Cross Entropy Loss over probabilities.
///
/// Both input and target must lie in [0, 1]; log terms are clamped so that
/// saturated predictions give a finite loss. An optional 1-D weight rescales
/// the unreduced loss and must broadcast against its trailing dimension.
#[derive(Debug, Clone)]
pub struct BCELoss<T>
where
    T: Float,
{
    options: BCELossOptions<T>,
    buffers: BufferMap<T>,
}

impl<T> BCELoss<T>
where
    T: Float,
{
    /// Fails if the weight, if any, is not 1-D.
    pub fn new(options: BCELossOptions<T>) -> Result<Self> {
        let mut loss = Self {
            options,
            buffers: BufferMap::new(),
        };
        loss.reset()?;
        Ok(loss)
    }

    pub fn options(&self) -> &BCELossOptions<T> {
        &self.options
    }

    /// Mutable options. Call [`Module::reset`] afterwards to re-register the weight.
    pub fn options_mut(&mut self) -> &mut BCELossOptions<T> {
        &mut self.options
    }

    /// Replaces the rescaling weight, leaving the module unchanged on failure.
    pub fn set_weight(&mut self, weight: Option<Tensor<T>>) -> Result<()> {
        check_class_weight(self.name(), weight.as_ref())?;
        let previous = mem::replace(&mut self.options.weight, weight);
        if let Err(err) = self.reset() {
            self.options.weight = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::binary_cross_entropy(
            input,
            target,
            self.options.weight.as_ref(),
            self.options.reduction,
        )
    }
}

impl<T> Default for BCELoss<T>
where
    T: Float,
{
    fn default() -> Self {
        let mut buffers = BufferMap::new();
        register_weight(&mut buffers, None);
        Self {
            options: BCELossOptions::default(),
            buffers,
        }
    }
}

impl<T> fmt::Display for BCELoss<T>
where
    T: Float,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BCELoss(weight={}, reduction={})",
            describe_weight(self.options.weight.as_ref()),
            self.options.reduction
        )
    }
}

impl<T> Module<T> for BCELoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "BCELoss"
    }

    fn reset(&mut self) -> Result<()> {
        check_class_weight(self.name(), self.options.weight.as_ref())?;
        register_weight(&mut self.buffers, self.options.weight.as_ref());
        Ok(())
    }

    fn buffers(&self) -> Option<&BufferMap<T>> {
        Some(&self.buffers)
    }

    fn load_buffer(&mut self, name: &str, tensor: Tensor<T>) -> Result<()> {
        match name {
            "weight" => self.set_weight(Some(tensor)),
            _ => Err(LossError::UnknownBuffer {
                module: self.name(),
                name: name.to_string(),
            }),
        }
    }
}

impl<T> Loss<T> for BCELoss<T>
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

/// Two-class logistic loss: log(1 + exp(-y * x)) for ±1 targets.
#[derive(Debug, Clone)]
pub struct SoftMarginLoss<T> {
    options: SoftMarginLossOptions,
    _phantom: PhantomData<T>,
}

impl<T> SoftMarginLoss<T>
where
    T: Float,
{
    pub fn new(options: SoftMarginLossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &SoftMarginLossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut SoftMarginLossOptions {
        &mut self.options
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::soft_margin_loss(input, target, self.options.reduction)
    }
}

impl<T> Default for SoftMarginLoss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(SoftMarginLossOptions::default())
    }
}

impl<T> fmt::Display for SoftMarginLoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SoftMarginLoss(reduction={})", self.options.reduction)
    }
}

impl<T> Module<T> for SoftMarginLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "SoftMarginLoss"
    }
}

impl<T> Loss<T> for SoftMarginLoss<T>
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

/// Multi-class hinge loss over (N, C) scores and (N) class indices.
///
/// `p` selects a linear (1) or squared (2) hinge. An optional 1-D weight of
/// length C scales each sample's loss by the weight of its correct class.
///
/// # Examples
///
/// ```rust
/// use losskit::nn::{MultiMarginLoss, MultiMarginLossOptions};
/// use losskit::Tensor;
///
/// let loss = MultiMarginLoss::new(MultiMarginLossOptions::default()).unwrap();
/// let input = Tensor::<f64>::from_f64(&[0.1, 0.2, 0.4, 0.8], &[1, 4]).unwrap();
/// let target = Tensor::from_f64(&[3.0], &[1]).unwrap();
///
/// let value = loss.forward(&input, &target).unwrap().first().unwrap();
/// assert!((value - 0.325).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct MultiMarginLoss<T>
where
    T: Float,
{
    options: MultiMarginLossOptions<T>,
    buffers: BufferMap<T>,
}

impl<T> MultiMarginLoss<T>
where
    T: Float,
{
    /// Fails unless `p` is 1 or 2 and the weight, if any, is 1-D.
    pub fn new(options: MultiMarginLossOptions<T>) -> Result<Self> {
        let mut loss = Self {
            options,
            buffers: BufferMap::new(),
        };
        loss.reset()?;
        Ok(loss)
    }

    pub fn options(&self) -> &MultiMarginLossOptions<T> {
        &self.options
    }

    /// Mutable options. Call [`Module::reset`] afterwards to revalidate and
    /// re-register the weight.
    pub fn options_mut(&mut self) -> &mut MultiMarginLossOptions<T> {
        &mut self.options
    }

    /// Replaces the class weight. A weight that is not 1-D is rejected and
    /// the module is left unchanged.
    pub fn set_weight(&mut self, weight: Option<Tensor<T>>) -> Result<()> {
        check_class_weight(self.name(), weight.as_ref())?;
        let previous = mem::replace(&mut self.options.weight, weight);
        if let Err(err) = self.reset() {
            self.options.weight = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::multi_margin_loss(
            input,
            target,
            self.options.p,
            self.options.margin,
            self.options.weight.as_ref(),
            self.options.reduction,
        )
    }
}

impl<T> fmt::Display for MultiMarginLoss<T>
where
    T: Float,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MultiMarginLoss(p={}, margin={}, weight={}, reduction={})",
            self.options.p,
            self.options.margin,
            describe_weight(self.options.weight.as_ref()),
            self.options.reduction
        )
    }
}

impl<T> Module<T> for MultiMarginLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "MultiMarginLoss"
    }

    fn reset(&mut self) -> Result<()> {
        let p = self.options.p;
        if p != 1 && p != 2 {
            return Err(LossError::config(
                self.name(),
                format!("only p == 1 and p == 2 supported, got {p}"),
            ));
        }
        check_class_weight(self.name(), self.options.weight.as_ref())?;
        register_weight(&mut self.buffers, self.options.weight.as_ref());
        Ok(())
    }

    fn buffers(&self) -> Option<&BufferMap<T>> {
        Some(&self.buffers)
    }

    fn load_buffer(&mut self, name: &str, tensor: Tensor<T>) -> Result<()> {
        match name {
            "weight" => self.set_weight(Some(tensor)),
            _ => Err(LossError::UnknownBuffer {
                module: self.name(),
                name: name.to_string(),
            }),
        }
    }
}

impl<T> Loss<T> for MultiMarginLoss<T>
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

/// Multi-label hinge loss.
///
/// Each target row lists correct class indices and ends at the first
/// negative entry; every other class is an incorrect one.
#[derive(Debug, Clone)]
pub struct MultiLabelMarginLoss<T> {
    options: MultiLabelMarginLossOptions,
    _phantom: PhantomData<T>,
}

impl<T> MultiLabelMarginLoss<T>
where
    T: Float,
{
    pub fn new(options: MultiLabelMarginLossOptions) -> Self {
        Self {
            options,
            _phantom: PhantomData,
        }
    }

    pub fn options(&self) -> &MultiLabelMarginLossOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut MultiLabelMarginLossOptions {
        &mut self.options
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::multilabel_margin_loss(input, target, self.options.reduction)
    }
}

impl<T> Default for MultiLabelMarginLoss<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(MultiLabelMarginLossOptions::default())
    }
}

impl<T> fmt::Display for MultiLabelMarginLoss<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MultiLabelMarginLoss(reduction={})", self.options.reduction)
    }
}

impl<T> Module<T> for MultiLabelMarginLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "MultiLabelMarginLoss"
    }
}

impl<T> Loss<T> for MultiLabelMarginLoss<T>
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

/// Multi-label one-versus-all logistic loss over multi-hot targets.
#[derive(Debug, Clone)]
pub struct MultiLabelSoftMarginLoss<T>
where
    T: Float,
{
    options: MultiLabelSoftMarginLossOptions<T>,
    buffers: BufferMap<T>,
}

impl<T> MultiLabelSoftMarginLoss<T>
where
    T: Float,
{
    /// Fails if the weight, if any, is not 1-D.
    pub fn new(options: MultiLabelSoftMarginLossOptions<T>) -> Result<Self> {
        let mut loss = Self {
            options,
            buffers: BufferMap::new(),
        };
        loss.reset()?;
        Ok(loss)
    }

    pub fn options(&self) -> &MultiLabelSoftMarginLossOptions<T> {
        &self.options
    }

    /// Mutable options. Call [`Module::reset`] afterwards to revalidate and
    /// re-register the weight.
    pub fn options_mut(&mut self) -> &mut MultiLabelSoftMarginLossOptions<T> {
        &mut self.options
    }

    /// Replaces the class weight, leaving the module unchanged on failure.
    pub fn set_weight(&mut self, weight: Option<Tensor<T>>) -> Result<()> {
        check_class_weight(self.name(), weight.as_ref())?;
        let previous = mem::replace(&mut self.options.weight, weight);
        if let Err(err) = self.reset() {
            self.options.weight = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<Tensor<T>> {
        ops::multilabel_soft_margin_loss(
            input,
            target,
            self.options.weight.as_ref(),
            self.options.reduction,
        )
    }
}

impl<T> fmt::Display for MultiLabelSoftMarginLoss<T>
where
    T: Float,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MultiLabelSoftMarginLoss(weight={}, reduction={})",
            describe_weight(self.options.weight.as_ref()),
            self.options.reduction
        )
    }
}

impl<T> Module<T> for MultiLabelSoftMarginLoss<T>
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "MultiLabelSoftMarginLoss"
    }

    fn reset(&mut self) -> Result<()> {
        check_class_weight(self.name(), self.options.weight.as_ref())?;
        register_weight(&mut self.buffers, self.options.weight.as_ref());
        Ok(())
    }

    fn buffers(&self) -> Option<&BufferMap<T>> {
        Some(&self.buffers)
    }

    fn load_buffer(&mut self, name: &str, tensor: Tensor<T>) -> Result<()> {
        match name {
            "weight" => self.set_weight(Some(tensor)),
            _ => Err(LossError::UnknownBuffer {
                module: self.name(),
                name: name.to_string(),
            }),
        }
    }
}

impl<T> Loss<T> for MultiLabelSoftMarginLoss<T>
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
