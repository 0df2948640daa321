// ops/mod.rs
// Numerical loss kernels. Every kernel is a pure function of its tensors and
// scalar options; the modules in `crate::nn::losses` only forward to them.
// Kernels compute values only: nothing here records operations for backprop.

pub mod ctc;
pub mod embedding;
pub mod margin;
pub mod pointwise;
pub mod reduction;

pub use ctc::ctc_loss;
pub use embedding::{cosine_embedding_loss, pairwise_distance, triplet_margin_loss};
pub use margin::{multi_margin_loss, multilabel_margin_loss, multilabel_soft_margin_loss};
pub use pointwise::{
    binary_cross_entropy, hinge_embedding_loss, kl_div, l1_loss, mse_loss, smooth_l1_loss,
    soft_margin_loss,
};
pub use reduction::{Reduction, apply_reduction};
