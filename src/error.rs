//! losskit error types

/// losskit result type
pub type Result<T> = std::result::Result<T, LossError>;

/// Errors raised while building a loss module or evaluating a loss kernel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LossError {
    /// Rejected options, raised by constructors and `reset()`
    #[error("invalid configuration for {loss}: {reason}")]
    InvalidConfig {
        /// Loss kind the options belong to
        loss: &'static str,
        /// Why the options were rejected
        reason: String,
    },

    /// Input shapes that cannot be broadcast or paired
    #[error("shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        /// Kernel that detected the mismatch
        op: &'static str,
        /// Left-hand shape
        lhs: Vec<usize>,
        /// Right-hand shape
        rhs: Vec<usize>,
    },

    /// Values or ranks a kernel does not accept
    #[error("invalid input to {op}: {reason}")]
    InvalidInput {
        /// Kernel that rejected the input
        op: &'static str,
        /// Description of what went wrong
        reason: String,
    },

    /// Wrong number of tensors passed through `LossModule::forward`
    #[error("{loss} expects {expected} input tensors, got {got}")]
    Arity {
        /// Loss kind
        loss: &'static str,
        /// Number of tensors the kind consumes
        expected: usize,
        /// Number of tensors supplied
        got: usize,
    },

    /// Buffer slot the module does not own
    #[error("{module} has no buffer named '{name}'")]
    UnknownBuffer {
        /// Module kind
        module: &'static str,
        /// Requested slot
        name: String,
    },

    /// Tensor construction failure
    #[error("tensor error: {0}")]
    Tensor(String),
}

impl LossError {
    pub(crate) fn config(loss: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            loss,
            reason: reason.into(),
        }
    }

    pub(crate) fn input(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            op,
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(op: &'static str, lhs: &[usize], rhs: &[usize]) -> Self {
        Self::ShapeMismatch {
            op,
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }
}
