// src/nn/buffer.rs
// Named, non-learnable state owned by a loss module.

use crate::backend::Float;
use crate::tensor::Tensor;

/// An ordered table of named tensor slots.
///
/// Buffers are module state that is not trained, such as the class weights of
/// [`MultiMarginLoss`](crate::nn::MultiMarginLoss). A slot may be empty: a loss
/// configured without a weight still owns its `"weight"` slot, it just holds
/// no tensor. Registering a name that already exists replaces the slot in
/// place, so repeated `reset()` calls never grow the table.
///
/// # Examples
///
/// ```rust
/// use losskit::Tensor;
/// use losskit::nn::BufferMap;
///
/// let mut buffers = BufferMap::<f64>::new();
/// buffers.register("weight", None);
/// assert_eq!(buffers.len(), 1);
/// assert_eq!(buffers.element_count(), 0);
///
/// buffers.register("weight", Some(Tensor::ones(&[3])));
/// assert_eq!(buffers.len(), 1);
/// assert_eq!(buffers.element_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BufferMap<T>
where
    T: Float,
{
    slots: Vec<(String, Option<Tensor<T>>)>,
}

impl<T> BufferMap<T>
where
    T: Float,
{
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Registers `tensor` under `name`, replacing any existing slot of that name.
    pub fn register(&mut self, name: &str, tensor: Option<Tensor<T>>) {
        match self.slots.iter_mut().find(|(slot, _)| slot == name) {
            Some((_, value)) => *value = tensor,
            None => self.slots.push((name.to_string(), tensor)),
        }
    }

    /// Tensor held in the `name` slot, if the slot exists and is filled.
    pub fn get(&self, name: &str) -> Option<&Tensor<T>> {
        self.slots
            .iter()
            .find(|(slot, _)| slot == name)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Number of registered slots, including empty ones.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Tensor<T>>)> {
        self.slots
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Total number of elements across filled slots.
    pub fn element_count(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|(_, value)| value.as_ref())
            .map(|tensor| tensor.len())
            .sum()
    }
}

impl<T> Default for BufferMap<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new()
    }
}
