pub mod cputensor;

mod tests;

pub use cputensor::{CPUTensor, broadcast_shape};

// Only the CPU tensor exists; the alias keeps call sites backend-agnostic.
pub type Tensor<T> = CPUTensor<T>;
