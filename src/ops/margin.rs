// src/ops/margin.rs
// Per-sample margin kernels over (N, C) class scores. Rank-1 inputs are treated
// as a single unbatched sample and produce a 0-d loss under `Reduction::None`.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::ops::reduction::{Reduction, apply_reduction};
use crate::tensor::Tensor;
use ndarray::{ArrayD, IxDyn};

/// Wraps per-sample losses into an (N) tensor, or a 0-d tensor when unbatched.
pub(crate) fn per_sample<T>(losses: Vec<T>, unbatched: bool) -> Result<Tensor<T>>
where
    T: Float,
{
    if unbatched {
        let value = losses
            .first()
            .copied()
            .ok_or_else(|| LossError::Tensor("unbatched loss produced no sample".into()))?;
        return Ok(Tensor::scalar(value));
    }
    let n = losses.len();
    ArrayD::from_shape_vec(IxDyn(&[n]), losses)
        .map(Tensor::new)
        .map_err(|e| LossError::Tensor(e.to_string()))
}

fn class_index(value: i64, num_classes: usize, op: &'static str) -> Result<usize> {
    if value < 0 || value as usize >= num_classes {
        return Err(LossError::input(
            op,
            format!("target {value} is out of bounds for {num_classes} classes"),
        ));
    }
    Ok(value as usize)
}

fn check_class_weight<T>(weight: Option<&Tensor<T>>, num_classes: usize, op: &'static str) -> Result<()>
where
    T: Float,
{
    if let Some(weight) = weight {
        if weight.shape() != [num_classes] {
            return Err(LossError::shape(op, weight.shape(), &[num_classes]));
        }
    }
    Ok(())
}

/// Multi-class hinge loss.
///
/// For each sample with correct class `y` the loss is
/// `sum_{i != y} w[y] * max(0, margin - x[y] + x[i])^p / C`.
pub fn multi_margin_loss<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    p: u32,
    margin: f64,
    weight: Option<&Tensor<T>>,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    const OP: &str = "multi_margin_loss";
    if p != 1 && p != 2 {
        return Err(LossError::input(OP, format!("only p == 1 and p == 2 supported, got {p}")));
    }

    let (scores, unbatched) = input.as_batch(OP)?;
    let (batch, num_classes) = scores.dim();
    let targets = target.to_indices(OP)?;
    if targets.len() != batch {
        return Err(LossError::shape(OP, input.shape(), target.shape()));
    }
    check_class_weight(weight, num_classes, OP)?;
    let weights = weight.map(|w| w.to_vec());

    let margin = T::from_f64_lossy(margin);
    let zero = T::zero();
    let classes = T::from_count(num_classes);

    let mut losses = Vec::with_capacity(batch);
    for (row, &label) in scores.rows().into_iter().zip(targets.iter()) {
        let y = class_index(label, num_classes, OP)?;
        let class_weight = weights.as_ref().map_or(T::one(), |w| w[y]);
        let correct = row[y];

        let mut total = zero;
        for (i, &score) in row.iter().enumerate() {
            if i == y {
                continue;
            }
            let z = margin - correct + score;
            if z > zero {
                let h = if p == 1 { z } else { z * z };
                total += class_weight * h;
            }
        }
        losses.push(total / classes);
    }

    Ok(apply_reduction(per_sample(losses, unbatched)?, reduction))
}

/// Multi-label hinge loss.
///
/// Each target row lists the correct class indices and ends at the first
/// negative entry. Every (correct, incorrect) pair contributes
/// `max(0, 1 - (x[j] - x[i]))`, and the sum is divided by `C`.
pub fn multilabel_margin_loss<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    const OP: &str = "multilabel_margin_loss";
    if input.shape() != target.shape() {
        return Err(LossError::shape(OP, input.shape(), target.shape()));
    }

    let (scores, unbatched) = input.as_batch(OP)?;
    let (batch, num_classes) = scores.dim();
    let labels = target.to_indices(OP)?;

    let one = T::one();
    let zero = T::zero();
    let classes = T::from_count(num_classes);

    let mut losses = Vec::with_capacity(batch);
    for (n, row) in scores.rows().into_iter().enumerate() {
        let row_labels = &labels[n * num_classes..(n + 1) * num_classes];

        let mut is_target = vec![false; num_classes];
        let mut positives = Vec::new();
        for &label in row_labels.iter().take_while(|&&l| l >= 0) {
            let j = class_index(label, num_classes, OP)?;
            is_target[j] = true;
            positives.push(j);
        }

        let mut total = zero;
        for &j in &positives {
            for (i, &score) in row.iter().enumerate() {
                if is_target[i] {
                    continue;
                }
                let z = one - (row[j] - score);
                if z > zero {
                    total += z;
                }
            }
        }
        losses.push(total / classes);
    }

    Ok(apply_reduction(per_sample(losses, unbatched)?, reduction))
}

/// Multi-label one-versus-all logistic loss over multi-hot targets.
///
/// Per sample: `-(1/C) sum_c w[c] (y ln σ(x) + (1 - y) ln σ(-x))`.
pub fn multilabel_soft_margin_loss<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    weight: Option<&Tensor<T>>,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    const OP: &str = "multilabel_soft_margin_loss";
    if input.shape() != target.shape() {
        return Err(LossError::shape(OP, input.shape(), target.shape()));
    }

    let (scores, unbatched) = input.as_batch(OP)?;
    let (labels, _) = target.as_batch(OP)?;
    let (batch, num_classes) = scores.dim();
    check_class_weight(weight, num_classes, OP)?;
    let weights = weight.map(|w| w.to_vec());

    let one = T::one();
    let classes = T::from_count(num_classes);

    let mut losses = Vec::with_capacity(batch);
    for (row, label_row) in scores.rows().into_iter().zip(labels.rows()) {
        let mut total = T::zero();
        for (c, (&x, &y)) in row.iter().zip(label_row.iter()).enumerate() {
            let term = y * x.log_sigmoid() + (one - y) * (-x).log_sigmoid();
            let w = weights.as_ref().map_or(one, |w| w[c]);
            total += w * term;
        }
        losses.push(-total / classes);
    }

    Ok(apply_reduction(per_sample(losses, unbatched)?, reduction))
}
