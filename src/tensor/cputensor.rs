use crate::backend::Float;
use crate::error::{LossError, Result};
use ndarray::{ArrayD, ArrayView2, Axis, Ix2, IxDyn, Zip};
use rand::Rng;
use rand::distr::Uniform;
use rand_distr::{Distribution, StandardNormal};
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Computes the shape two operands broadcast to under trailing-dimension rules.
///
/// Returns `None` when some aligned pair of dimensions differs and neither is 1.
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Option<Vec<usize>> {
    let ndim = lhs.len().max(rhs.len());
    let lhs_offset = ndim - lhs.len();
    let rhs_offset = ndim - rhs.len();

    let mut shape = Vec::with_capacity(ndim);
    for i in 0..ndim {
        let l = if i < lhs_offset { 1 } else { lhs[i - lhs_offset] };
        let r = if i < rhs_offset { 1 } else { rhs[i - rhs_offset] };
        let dim = match (l, r) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => return None,
        };
        shape.push(dim);
    }
    Some(shape)
}

/// Dense n-dimensional tensor living in host memory.
///
/// The array sits behind an `Arc`, so cloning a tensor shares its storage.
/// Tensors are never mutated in place: every operation allocates a new array,
/// which makes a shared tensor safe to read from many threads while its owner
/// swaps in a replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct CPUTensor<T>
where
    T: Float,
{
    data: Arc<ArrayD<T>>,
}

impl<T> CPUTensor<T>
where
    T: Float,
{
    pub fn new(data: ArrayD<T>) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    // Creates a tensor from a Rust vector laid out in row-major order.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let total_elements: usize = shape.iter().product();
        if data.len() != total_elements {
            return Err(LossError::Tensor(format!(
                "Data length {} doesn't match shape {:?} (expected {})",
                data.len(),
                shape,
                total_elements
            )));
        }

        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(Self::new)
            .map_err(|e| LossError::Tensor(format!("Failed to create tensor: {e}")))
    }

    /// Convenience constructor for tests and configs written with f64 literals.
    pub fn from_f64(data: &[f64], shape: &[usize]) -> Result<Self> {
        Self::from_vec(data.iter().map(|&v| T::from_f64_lossy(v)).collect(), shape)
    }

    /// Zero-dimensional tensor holding a single value.
    pub fn scalar(value: T) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::new(ArrayD::ones(IxDyn(shape)))
    }

    pub fn full(shape: &[usize], value: T) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), value))
    }

    /// Samples from a standard normal distribution.
    pub fn randn_with_rng<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Self {
        let data = ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            let sample: f64 = StandardNormal.sample(&mut *rng);
            T::from_f64_lossy(sample)
        });
        Self::new(data)
    }

    /// Samples uniformly from `[low, high)`.
    pub fn rand_uniform_with_rng<R: Rng + ?Sized>(
        shape: &[usize],
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let dist = Uniform::new(low, high)
            .map_err(|e| LossError::Tensor(format!("Invalid uniform range: {e}")))?;
        let data =
            ArrayD::from_shape_simple_fn(IxDyn(shape), || T::from_f64_lossy(dist.sample(&mut *rng)));
        Ok(Self::new(data))
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Copies the elements out in logical row-major order.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().copied().collect()
    }

    /// First element in logical order, typically the value of a reduced loss.
    pub fn first(&self) -> Result<T> {
        self.data
            .iter()
            .next()
            .copied()
            .ok_or_else(|| LossError::Tensor("Cannot read an element of an empty tensor".into()))
    }

    /// Whether both tensors share the same storage allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Self::new(self.data.mapv(f))
    }

    /// Applies `f` elementwise after broadcasting both operands to a common shape.
    pub fn zip_with<F>(&self, other: &Self, op: &'static str, f: F) -> Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        let shape = broadcast_shape(self.shape(), other.shape())
            .ok_or_else(|| LossError::shape(op, self.shape(), other.shape()))?;
        let dim = IxDyn(&shape);
        let lhs = self
            .data
            .broadcast(dim.clone())
            .ok_or_else(|| LossError::shape(op, self.shape(), &shape))?;
        let rhs = other
            .data
            .broadcast(dim)
            .ok_or_else(|| LossError::shape(op, other.shape(), &shape))?;

        let out = Zip::from(lhs).and(rhs).map_collect(|&a, &b| f(a, b));
        Ok(Self::new(out))
    }

    pub fn sum(&self) -> T {
        self.data.iter().copied().sum()
    }

    /// Arithmetic mean of all elements; NaN for an empty tensor.
    pub fn mean(&self) -> T {
        self.sum() / T::from_count(self.len())
    }

    /// Views a rank-2 tensor, or a rank-1 tensor as a single row.
    ///
    /// The flag is `true` when the input was rank-1, so callers can drop the
    /// batch dimension from their output again.
    pub fn as_batch(&self, op: &'static str) -> Result<(ArrayView2<'_, T>, bool)> {
        let view = self.data.view();
        let (view, unbatched) = match self.ndim() {
            1 => (view.insert_axis(Axis(0)), true),
            2 => (view, false),
            n => {
                return Err(LossError::input(
                    op,
                    format!("expected a 1-D or 2-D tensor, got {n}-D with shape {:?}", self.shape()),
                ));
            }
        };
        let view = view
            .into_dimensionality::<Ix2>()
            .map_err(|e| LossError::input(op, e.to_string()))?;
        Ok((view, unbatched))
    }

    /// Reads the tensor as integral indices, rejecting fractional or non-finite values.
    pub fn to_indices(&self, op: &'static str) -> Result<Vec<i64>> {
        self.data
            .iter()
            .map(|&v| {
                let value = v.to_f64_lossy();
                if value.is_finite() && value.fract() == 0.0 {
                    Ok(value as i64)
                } else {
                    Err(LossError::input(op, format!("expected an integral index, got {v}")))
                }
            })
            .collect()
    }
}

impl<T> Serialize for CPUTensor<T>
where
    T: Float,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Tensor", 2)?;
        state.serialize_field("shape", self.shape())?;
        state.serialize_field("data", &self.to_vec())?;
        state.end()
    }
}

impl<'de, T> Deserialize<'de> for CPUTensor<T>
where
    T: Float,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr<T> {
            shape: Vec<usize>,
            data: Vec<T>,
        }

        let repr = Repr::<T>::deserialize(deserializer)?;
        Self::from_vec(repr.data, &repr.shape).map_err(D::Error::custom)
    }
}
