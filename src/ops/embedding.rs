// src/ops/embedding.rs
// Kernels comparing pairs or triples of embedding rows.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::ops::margin::per_sample;
use crate::ops::reduction::{Reduction, apply_reduction};
use crate::tensor::Tensor;
use ndarray::ArrayView1;

// Added to squared norms before the cosine similarity divides by them.
const COSINE_EPSILON: f64 = 1e-12;

/// p-norm distance between two rows, with `eps` added to every difference.
///
/// An infinite `p` gives the max-norm.
pub fn pairwise_distance<T>(a: ArrayView1<'_, T>, b: ArrayView1<'_, T>, p: f64, eps: f64) -> T
where
    T: Float,
{
    let eps = T::from_f64_lossy(eps);
    let diffs = a.iter().zip(b.iter()).map(|(&x, &y)| (x - y + eps).abs());
    if p.is_infinite() {
        return diffs.fold(T::zero(), |acc, d| acc.max(d));
    }
    let p = T::from_f64_lossy(p);
    let total: T = diffs.map(|d| d.powf(p)).sum();
    total.powf(p.recip())
}

/// Cosine embedding loss over paired rows.
///
/// `target` holds one ±1 label per row: similar pairs pay `1 - cos`,
/// dissimilar pairs pay `max(0, cos - margin)`.
pub fn cosine_embedding_loss<T>(
    input1: &Tensor<T>,
    input2: &Tensor<T>,
    target: &Tensor<T>,
    margin: f64,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    const OP: &str = "cosine_embedding_loss";
    if input1.shape() != input2.shape() {
        return Err(LossError::shape(OP, input1.shape(), input2.shape()));
    }

    let (lhs, unbatched) = input1.as_batch(OP)?;
    let (rhs, _) = input2.as_batch(OP)?;
    let labels = target.to_vec();
    if labels.len() != lhs.nrows() {
        return Err(LossError::shape(OP, input1.shape(), target.shape()));
    }

    let eps = T::from_f64_lossy(COSINE_EPSILON);
    let margin = T::from_f64_lossy(margin);
    let zero = T::zero();
    let one = T::one();

    let losses = lhs
        .rows()
        .into_iter()
        .zip(rhs.rows())
        .zip(labels)
        .map(|((a, b), y)| {
            let dot = a.dot(&b);
            let norm_a = a.dot(&a) + eps;
            let norm_b = b.dot(&b) + eps;
            let cos = dot / (norm_a * norm_b).sqrt();

            if y == one {
                one - cos
            } else if y == -one {
                (cos - margin).max(zero)
            } else {
                zero
            }
        })
        .collect();

    Ok(apply_reduction(per_sample(losses, unbatched)?, reduction))
}

/// Triplet margin loss: `max(0, d(a, p) - d(a, n) + margin)` per row.
///
/// With `swap` the negative distance becomes `min(d(a, n), d(p, n))`, so the
/// positive acts as the anchor whenever it sits closer to the negative.
#[allow(clippy::too_many_arguments)]
pub fn triplet_margin_loss<T>(
    anchor: &Tensor<T>,
    positive: &Tensor<T>,
    negative: &Tensor<T>,
    margin: f64,
    p: f64,
    eps: f64,
    swap: bool,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    const OP: &str = "triplet_margin_loss";
    if !(p > 0.0) {
        return Err(LossError::input(OP, format!("norm degree must be positive, got {p}")));
    }
    if anchor.shape() != positive.shape() {
        return Err(LossError::shape(OP, anchor.shape(), positive.shape()));
    }
    if anchor.shape() != negative.shape() {
        return Err(LossError::shape(OP, anchor.shape(), negative.shape()));
    }

    let (anchors, unbatched) = anchor.as_batch(OP)?;
    let (positives, _) = positive.as_batch(OP)?;
    let (negatives, _) = negative.as_batch(OP)?;
    let margin = T::from_f64_lossy(margin);
    let zero = T::zero();

    let losses = anchors
        .rows()
        .into_iter()
        .zip(positives.rows())
        .zip(negatives.rows())
        .map(|((a, pos), neg)| {
            let d_pos = pairwise_distance(a, pos, p, eps);
            let mut d_neg = pairwise_distance(a, neg, p, eps);
            if swap {
                d_neg = d_neg.min(pairwise_distance(pos, neg, p, eps));
            }
            (d_pos - d_neg + margin).max(zero)
        })
        .collect();

    Ok(apply_reduction(per_sample(losses, unbatched)?, reduction))
}
