pub mod number;

pub use number::Float;
