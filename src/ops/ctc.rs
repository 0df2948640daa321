// src/ops/ctc.rs
// Connectionist Temporal Classification loss.
//
// The per-sample negative log-likelihood is obtained with the forward (alpha)
// recursion over the blank-extended label sequence, carried out in log space.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::ops::margin::per_sample;
use crate::ops::reduction::Reduction;
use crate::tensor::Tensor;
use ndarray::{ArrayView3, Axis, Ix3};

const OP: &str = "ctc_loss";

/// CTC loss for a batch of variable-length sequences.
///
/// * `log_probs` - `(T, N, C)` log-probabilities, or `(T, C)` for one sequence
/// * `targets` - padded `(N, S)` labels or the 1-D concatenation of all targets
/// * `input_lengths` - valid timesteps per sample
/// * `target_lengths` - valid labels per sample
///
/// With `zero_infinity` an impossible alignment yields a loss of 0 instead of
/// infinity. The mean divides each sample by its target length (at least 1)
/// before averaging over the batch.
#[allow(clippy::too_many_arguments)]
pub fn ctc_loss<T>(
    log_probs: &Tensor<T>,
    targets: &Tensor<T>,
    input_lengths: &Tensor<T>,
    target_lengths: &Tensor<T>,
    blank: usize,
    zero_infinity: bool,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    let (probs, unbatched) = as_time_batch_class(log_probs)?;
    let (max_time, batch, num_classes) = probs.dim();
    if blank >= num_classes {
        return Err(LossError::input(
            OP,
            format!("blank index {blank} is out of bounds for {num_classes} classes"),
        ));
    }

    let input_lengths = lengths(input_lengths, batch, "input_lengths")?;
    let target_lengths = lengths(target_lengths, batch, "target_lengths")?;
    let labels = gather_targets(targets, &target_lengths, unbatched)?;

    let mut losses = Vec::with_capacity(batch);
    for (n, sample_labels) in labels.iter().enumerate() {
        let input_length = input_lengths[n];
        if input_length > max_time {
            return Err(LossError::input(
                OP,
                format!("input length {input_length} of sample {n} exceeds {max_time} timesteps"),
            ));
        }
        let labels = class_labels(sample_labels, num_classes, blank)?;
        let sample = probs.index_axis(Axis(1), n);

        let mut nll = -log_likelihood(sample, input_length, &labels, blank);
        if zero_infinity && nll.is_infinite() {
            nll = T::zero();
        }
        losses.push(nll);
    }

    match reduction {
        Reduction::None => per_sample(losses, unbatched),
        Reduction::Sum => Ok(Tensor::scalar(losses.into_iter().sum())),
        Reduction::Mean => {
            let normalized: T = losses
                .iter()
                .zip(&target_lengths)
                .map(|(&loss, &len)| loss / T::from_count(len.max(1)))
                .sum();
            Ok(Tensor::scalar(normalized / T::from_count(batch)))
        }
    }
}

fn as_time_batch_class<T>(log_probs: &Tensor<T>) -> Result<(ArrayView3<'_, T>, bool)>
where
    T: Float,
{
    let view = log_probs.data().view();
    let (view, unbatched) = match log_probs.ndim() {
        2 => (view.insert_axis(Axis(1)), true),
        3 => (view, false),
        n => {
            return Err(LossError::input(
                OP,
                format!("log_probs must be (T, N, C) or (T, C), got {n}-D"),
            ));
        }
    };
    let view = view
        .into_dimensionality::<Ix3>()
        .map_err(|e| LossError::input(OP, e.to_string()))?;
    Ok((view, unbatched))
}

fn lengths<T>(tensor: &Tensor<T>, batch: usize, what: &str) -> Result<Vec<usize>>
where
    T: Float,
{
    let values = tensor.to_indices(OP)?;
    if values.len() != batch {
        return Err(LossError::input(
            OP,
            format!("{what} must hold {batch} entries, got {}", values.len()),
        ));
    }
    values
        .into_iter()
        .map(|v| {
            usize::try_from(v)
                .map_err(|_| LossError::input(OP, format!("{what} must be non-negative, got {v}")))
        })
        .collect()
}

/// Splits the targets into one label slice per sample.
fn gather_targets<T>(targets: &Tensor<T>, target_lengths: &[usize], unbatched: bool) -> Result<Vec<Vec<i64>>>
where
    T: Float,
{
    let flat = targets.to_indices(OP)?;

    let padded = !unbatched && targets.ndim() == 2;
    if padded {
        let (rows, width) = (targets.shape()[0], targets.shape()[1]);
        if rows != target_lengths.len() {
            return Err(LossError::shape(OP, targets.shape(), &[target_lengths.len(), width]));
        }
        return target_lengths
            .iter()
            .enumerate()
            .map(|(n, &len)| {
                if len > width {
                    return Err(LossError::input(
                        OP,
                        format!("target length {len} of sample {n} exceeds padded width {width}"),
                    ));
                }
                Ok(flat[n * width..n * width + len].to_vec())
            })
            .collect();
    }

    if targets.ndim() != 1 {
        return Err(LossError::input(
            OP,
            format!("targets must be 1-D or padded 2-D, got shape {:?}", targets.shape()),
        ));
    }

    let total = target_lengths
        .iter()
        .try_fold(0usize, |acc, &len| acc.checked_add(len))
        .ok_or_else(|| LossError::input(OP, "target lengths overflow when summed"))?;
    // A lone sequence may be padded beyond its length; a concatenation must cover every target.
    if total > flat.len() {
        return Err(LossError::input(
            OP,
            format!("target lengths sum to {total} but only {} labels were given", flat.len()),
        ));
    }

    let mut offset = 0;
    let mut gathered = Vec::with_capacity(target_lengths.len());
    for &len in target_lengths {
        gathered.push(flat[offset..offset + len].to_vec());
        offset += len;
    }
    Ok(gathered)
}

fn class_labels(labels: &[i64], num_classes: usize, blank: usize) -> Result<Vec<usize>> {
    labels
        .iter()
        .map(|&label| match usize::try_from(label) {
            Ok(l) if l < num_classes && l != blank => Ok(l),
            _ => Err(LossError::input(
                OP,
                format!("label {label} must be in [0, {num_classes}) and differ from blank {blank}"),
            )),
        })
        .collect()
}

/// Log-probability of all alignments of `labels` within the first `input_length` steps.
fn log_likelihood<T>(
    log_probs: ndarray::ArrayView2<'_, T>,
    input_length: usize,
    labels: &[usize],
    blank: usize,
) -> T
where
    T: Float,
{
    let neg_inf = T::neg_infinity();
    if input_length == 0 {
        return if labels.is_empty() { T::zero() } else { neg_inf };
    }

    // Extended sequence: blank, l1, blank, l2, ..., lS, blank
    let extended: Vec<usize> = std::iter::once(blank)
        .chain(labels.iter().flat_map(|&l| [l, blank]))
        .collect();
    let width = extended.len();

    let mut alpha = vec![neg_inf; width];
    alpha[0] = log_probs[[0, blank]];
    if width > 1 {
        alpha[1] = log_probs[[0, extended[1]]];
    }

    let mut next = vec![neg_inf; width];
    for t in 1..input_length {
        for s in 0..width {
            let mut acc = alpha[s];
            if s >= 1 {
                acc = acc.log_add_exp(alpha[s - 1]);
            }
            if s >= 2 && extended[s] != blank && extended[s] != extended[s - 2] {
                acc = acc.log_add_exp(alpha[s - 2]);
            }
            next[s] = if acc == neg_inf {
                neg_inf
            } else {
                acc + log_probs[[t, extended[s]]]
            };
        }
        std::mem::swap(&mut alpha, &mut next);
    }

    let last = alpha[width - 1];
    if width > 1 {
        last.log_add_exp(alpha[width - 2])
    } else {
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn t(data: &[f64], shape: &[usize]) -> Tensor<f64> {
        Tensor::from_f64(data, shape).unwrap()
    }

    fn uniform_log_probs(time: usize, batch: usize, classes: usize) -> Tensor<f64> {
        let value = -(classes as f64).ln();
        Tensor::full(&[time, batch, classes], value)
    }

    #[test]
    fn test_single_step_single_label() {
        // One timestep, one label: the only alignment emits the label.
        let log_probs = t(&[(0.25f64).ln(), (0.75f64).ln()], &[1, 1, 2]);
        let loss = ctc_loss(
            &log_probs,
            &t(&[1.0], &[1, 1]),
            &t(&[1.0], &[1]),
            &t(&[1.0], &[1]),
            0,
            false,
            Reduction::None,
        )
        .unwrap();
        assert_eq!(loss.shape(), &[1]);
        assert_abs_diff_eq!(loss.first().unwrap(), -(0.75f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_two_steps_uniform_counts_alignments() {
        // Label "1" over two steps with uniform probabilities over 2 classes:
        // valid paths are (1,1), (0,1), (1,0), each with probability 1/4.
        let log_probs = uniform_log_probs(2, 1, 2);
        let loss = ctc_loss(
            &log_probs,
            &t(&[1.0], &[1]),
            &t(&[2.0], &[1]),
            &t(&[1.0], &[1]),
            0,
            false,
            Reduction::Sum,
        )
        .unwrap();
        assert_abs_diff_eq!(loss.first().unwrap(), -(0.75f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_repeated_labels_need_separating_blank() {
        // "1 1" needs at least three steps: 1, blank, 1.
        let log_probs = uniform_log_probs(2, 1, 2);
        let loss = ctc_loss(
            &log_probs,
            &t(&[1.0, 1.0], &[1, 2]),
            &t(&[2.0], &[1]),
            &t(&[2.0], &[1]),
            0,
            false,
            Reduction::None,
        )
        .unwrap();
        assert!(loss.first().unwrap().is_infinite());
    }

    #[test]
    fn test_zero_infinity_clamps_only_infeasible_samples() {
        let log_probs = uniform_log_probs(2, 2, 3);
        // Sample 0 needs 3 labels in 2 steps, sample 1 is feasible.
        let targets = t(&[1.0, 2.0, 1.0, 2.0, 0.0, 0.0], &[2, 3]);
        let input_lengths = t(&[2.0, 2.0], &[2]);
        let target_lengths = t(&[3.0, 1.0], &[2]);

        let raw = ctc_loss(&log_probs, &targets, &input_lengths, &target_lengths, 0, false, Reduction::None)
            .unwrap()
            .to_vec();
        assert!(raw[0].is_infinite() && raw[0] > 0.0);
        assert!(raw[1].is_finite());

        let clamped = ctc_loss(&log_probs, &targets, &input_lengths, &target_lengths, 0, true, Reduction::None)
            .unwrap()
            .to_vec();
        assert_eq!(clamped[0], 0.0);
        assert_abs_diff_eq!(clamped[1], raw[1], epsilon = 1e-12);
    }

    #[test]
    fn test_concatenated_targets_match_padded_targets() {
        let log_probs = Tensor::<f64>::randn_with_rng(
            &[5, 2, 4],
            &mut <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(7),
        );
        let input_lengths = t(&[5.0, 4.0], &[2]);
        let target_lengths = t(&[2.0, 3.0], &[2]);

        let padded = t(&[1.0, 2.0, 0.0, 3.0, 1.0, 2.0], &[2, 3]);
        let concatenated = t(&[1.0, 2.0, 3.0, 1.0, 2.0], &[5]);

        let a = ctc_loss(&log_probs, &padded, &input_lengths, &target_lengths, 0, false, Reduction::None)
            .unwrap();
        let b = ctc_loss(&log_probs, &concatenated, &input_lengths, &target_lengths, 0, false, Reduction::None)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mean_normalizes_by_target_length() {
        let log_probs = uniform_log_probs(4, 2, 3);
        let targets = t(&[1.0, 0.0, 1.0, 2.0], &[2, 2]);
        let input_lengths = t(&[4.0, 4.0], &[2]);
        let target_lengths = t(&[1.0, 2.0], &[2]);

        let per_sample = ctc_loss(&log_probs, &targets, &input_lengths, &target_lengths, 0, false, Reduction::None)
            .unwrap()
            .to_vec();
        let mean = ctc_loss(&log_probs, &targets, &input_lengths, &target_lengths, 0, false, Reduction::Mean)
            .unwrap();
        let expected = (per_sample[0] / 1.0 + per_sample[1] / 2.0) / 2.0;
        assert_abs_diff_eq!(mean.first().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_unbatched_input() {
        let log_probs = Tensor::full(&[2, 2], -(2.0f64).ln());
        let loss = ctc_loss(
            &log_probs,
            &t(&[1.0], &[1]),
            &Tensor::scalar(2.0),
            &Tensor::scalar(1.0),
            0,
            false,
            Reduction::None,
        )
        .unwrap();
        assert_eq!(loss.ndim(), 0);
        assert_abs_diff_eq!(loss.first().unwrap(), -(0.75f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_target_and_empty_input() {
        let log_probs = uniform_log_probs(3, 1, 2);
        let loss = ctc_loss(
            &log_probs,
            &t(&[], &[1, 0]),
            &t(&[0.0], &[1]),
            &t(&[0.0], &[1]),
            0,
            false,
            Reduction::None,
        )
        .unwrap();
        assert_eq!(loss.first().unwrap(), 0.0);
    }

    #[test]
    fn test_validation_errors() {
        let log_probs = uniform_log_probs(2, 1, 3);
        let lengths = t(&[2.0], &[1]);
        let one = t(&[1.0], &[1]);

        // blank used as a label
        assert!(ctc_loss(&log_probs, &t(&[0.0], &[1, 1]), &lengths, &one, 0, false, Reduction::Mean).is_err());
        // blank out of range
        assert!(ctc_loss(&log_probs, &t(&[1.0], &[1, 1]), &lengths, &one, 3, false, Reduction::Mean).is_err());
        // input length longer than the sequence
        assert!(ctc_loss(&log_probs, &t(&[1.0], &[1, 1]), &t(&[3.0], &[1]), &one, 0, false, Reduction::Mean).is_err());
        // target length longer than the padding
        assert!(ctc_loss(&log_probs, &t(&[1.0], &[1, 1]), &lengths, &t(&[2.0], &[1]), 0, false, Reduction::Mean).is_err());
        // negative length
        assert!(ctc_loss(&log_probs, &t(&[1.0], &[1, 1]), &lengths, &t(&[-1.0], &[1]), 0, false, Reduction::Mean).is_err());
    }

    #[test]
    fn test_huge_target_lengths_are_rejected() {
        let log_probs = uniform_log_probs(2, 3, 3);
        let input_lengths = t(&[2.0, 2.0, 2.0], &[3]);
        let target_lengths = t(&[9e18, 9e18, 9e18], &[3]);
        let targets = t(&[1.0, 2.0], &[2]);

        let err = ctc_loss(&log_probs, &targets, &input_lengths, &target_lengths, 0, false, Reduction::Sum)
            .unwrap_err();
        assert!(matches!(err, LossError::InvalidInput { .. }));
    }
}
