use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::nn::buffer::BufferMap;
use crate::tensor::Tensor;
use std::fmt;

/// The base trait for all loss modules.
///
/// A module owns its options and the buffers derived from them. The forward
/// computation lives on each concrete type (and on [`Loss`](crate::nn::Loss)),
/// this trait covers the lifecycle around it: naming, re-initialisation and
/// buffer inspection.
///
/// # Design Philosophy
///
/// Similar to PyTorch's Module class, this trait allows for:
/// - Re-deriving internal state from the options through `reset()`
/// - Enumerating and restoring named buffers
/// - A one-line diagnostic rendering through `Display`
///
/// # Examples
///
/// ```rust
/// use losskit::nn::{Module, MultiMarginLoss, MultiMarginLossOptions};
/// use losskit::Tensor;
///
/// let options = MultiMarginLossOptions::default().weight(Some(Tensor::<f64>::ones(&[4])));
/// let mut loss = MultiMarginLoss::new(options).unwrap();
/// loss.reset().unwrap();
///
/// assert_eq!(loss.named_buffers().len(), 1);
/// assert_eq!(loss.buffer_element_count(), 4);
/// ```
pub trait Module<T>: fmt::Display
where
    T: Float,
{
    /// Kind name used in diagnostics and errors, e.g. `"MultiMarginLoss"`.
    fn name(&self) -> &'static str;

    /// Re-derives internal state from the current options.
    ///
    /// Validates the options and re-registers every buffer. Calling it any
    /// number of times leaves exactly one slot per buffer name.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// The buffer table, for modules that own one.
    fn buffers(&self) -> Option<&BufferMap<T>> {
        None
    }

    /// Registered buffers in registration order. Empty slots are included.
    fn named_buffers(&self) -> Vec<(&str, Option<&Tensor<T>>)> {
        self.buffers()
            .map(|buffers| buffers.iter().collect())
            .unwrap_or_default()
    }

    /// Tensor held by the `name` buffer, if present and filled.
    fn buffer(&self, name: &str) -> Option<&Tensor<T>> {
        self.buffers().and_then(|buffers| buffers.get(name))
    }

    /// Total number of elements held across all buffers.
    fn buffer_element_count(&self) -> usize {
        self.buffers().map_or(0, BufferMap::element_count)
    }

    /// Restores a previously saved buffer and revalidates the module.
    ///
    /// Modules without buffers reject every name.
    fn load_buffer(&mut self, name: &str, _tensor: Tensor<T>) -> Result<()> {
        Err(LossError::UnknownBuffer {
            module: self.name(),
            name: name.to_string(),
        })
    }
}
