// Neural Network Module for losskit
// Loss modules built on top of the kernels in `crate::ops`: each module owns
// its options, validates them, and forwards to the matching kernel.

pub mod buffer;
pub mod losses;
pub mod module;

// Re-export the main types and traits for convenience
pub use buffer::BufferMap;
pub use losses::*;
pub use module::Module;
