// src/ops/pointwise.rs
// Elementwise loss kernels. Input and target broadcast against each other and the
// loss keeps the broadcast shape until the reduction is applied.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::ops::reduction::{Reduction, apply_reduction};
use crate::tensor::Tensor;

// log(0) is clamped here so a saturated prediction yields a large finite loss.
const BCE_LOG_FLOOR: f64 = -100.0;

/// L1 = |input - target|
pub fn l1_loss<T>(input: &Tensor<T>, target: &Tensor<T>, reduction: Reduction) -> Result<Tensor<T>>
where
    T: Float,
{
    let loss = input.zip_with(target, "l1_loss", |x, y| (x - y).abs())?;
    Ok(apply_reduction(loss, reduction))
}

/// MSE = (input - target)²
pub fn mse_loss<T>(input: &Tensor<T>, target: &Tensor<T>, reduction: Reduction) -> Result<Tensor<T>>
where
    T: Float,
{
    let loss = input.zip_with(target, "mse_loss", |x, y| {
        let diff = x - y;
        diff * diff
    })?;
    Ok(apply_reduction(loss, reduction))
}

/// Huber-style loss: quadratic below `beta`, linear above it.
///
/// `beta == 0` is exactly the L1 loss.
pub fn smooth_l1_loss<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    beta: f64,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    if beta < 0.0 {
        return Err(LossError::input(
            "smooth_l1_loss",
            format!("beta must be non-negative, got {beta}"),
        ));
    }
    let beta = T::from_f64_lossy(beta);
    let half = T::from_f64_lossy(0.5);

    let loss = input.zip_with(target, "smooth_l1_loss", |x, y| {
        let diff = (x - y).abs();
        if diff < beta {
            half * diff * diff / beta
        } else {
            diff - half * beta
        }
    })?;
    Ok(apply_reduction(loss, reduction))
}

/// Kullback-Leibler divergence with `input` given as log-probabilities.
///
/// The target is a probability, or a log-probability when `log_target` is set.
/// Entries with a zero target probability contribute nothing.
pub fn kl_div<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    log_target: bool,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    let loss = if log_target {
        input.zip_with(target, "kl_div", |x, y| y.exp() * (y - x))?
    } else {
        input.zip_with(target, "kl_div", |x, y| {
            if y == T::zero() {
                T::zero()
            } else {
                y * (y.ln() - x)
            }
        })?
    };
    Ok(apply_reduction(loss, reduction))
}

/// Logistic loss for ±1 targets: ln(1 + exp(-target * input)).
pub fn soft_margin_loss<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    let loss = input.zip_with(target, "soft_margin_loss", |x, y| (-(y * x)).softplus())?;
    Ok(apply_reduction(loss, reduction))
}

/// Binary cross entropy over probabilities.
///
/// Both `input` and `target` must hold values in [0, 1]. The optional weight
/// rescales the unreduced loss and must broadcast against it.
pub fn binary_cross_entropy<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    weight: Option<&Tensor<T>>,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    check_probabilities(input, "input")?;
    check_probabilities(target, "target")?;

    let floor = T::from_f64_lossy(BCE_LOG_FLOOR);
    let one = T::one();
    let loss = input.zip_with(target, "binary_cross_entropy", |x, y| {
        let log_x = x.ln().max(floor);
        let log_one_minus_x = (one - x).ln().max(floor);
        -(y * log_x + (one - y) * log_one_minus_x)
    })?;

    let loss = match weight {
        Some(weight) => loss.zip_with(weight, "binary_cross_entropy", |l, w| l * w)?,
        None => loss,
    };
    Ok(apply_reduction(loss, reduction))
}

fn check_probabilities<T>(tensor: &Tensor<T>, what: &str) -> Result<()>
where
    T: Float,
{
    let zero = T::zero();
    let one = T::one();
    match tensor.data().iter().find(|&&v| !(v >= zero && v <= one)) {
        Some(bad) => Err(LossError::input(
            "binary_cross_entropy",
            format!("{what} values must lie in [0, 1], found {bad}"),
        )),
        None => Ok(()),
    }
}

/// Hinge embedding loss for ±1 targets.
///
/// Positive pairs are penalised by their distance, negative pairs by how far
/// they fall inside the margin.
pub fn hinge_embedding_loss<T>(
    input: &Tensor<T>,
    target: &Tensor<T>,
    margin: f64,
    reduction: Reduction,
) -> Result<Tensor<T>>
where
    T: Float,
{
    let margin = T::from_f64_lossy(margin);
    let one = T::one();
    let zero = T::zero();

    let loss = input.zip_with(target, "hinge_embedding_loss", |x, y| {
        let margin_term = if y != one { (margin - x).max(zero) } else { zero };
        let distance_term = if y != -one { x } else { zero };
        margin_term + distance_term
    })?;
    Ok(apply_reduction(loss, reduction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn t(data: &[f64], shape: &[usize]) -> Tensor<f64> {
        Tensor::from_f64(data, shape).unwrap()
    }

    #[test]
    fn test_l1_and_mse_values() {
        let input = t(&[1.0, 2.0, 3.0], &[3]);
        let target = t(&[1.5, 2.0, 1.0], &[3]);

        let l1 = l1_loss(&input, &target, Reduction::None).unwrap();
        assert_eq!(l1.to_vec(), vec![0.5, 0.0, 2.0]);

        let mse = mse_loss(&input, &target, Reduction::Sum).unwrap();
        assert_abs_diff_eq!(mse.first().unwrap(), 0.25 + 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pointwise_broadcasting() {
        let input = t(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let target = t(&[1.0, 0.0], &[2]);

        let loss = l1_loss(&input, &target, Reduction::None).unwrap();
        assert_eq!(loss.shape(), &[2, 2]);
        assert_eq!(loss.to_vec(), vec![0.0, 2.0, 2.0, 4.0]);

        let mean = l1_loss(&input, &target, Reduction::Mean).unwrap();
        assert_abs_diff_eq!(mean.first().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_incompatible_shapes_are_rejected() {
        let input = t(&[1.0, 2.0, 3.0], &[3]);
        let target = t(&[1.0, 2.0], &[2]);
        let err = mse_loss(&input, &target, Reduction::Mean).unwrap_err();
        assert!(matches!(err, LossError::ShapeMismatch { op: "mse_loss", .. }));
    }

    #[test]
    fn test_smooth_l1_regions() {
        let input = t(&[0.0, 0.0, 0.0], &[3]);
        let target = t(&[0.5, 2.0, -3.0], &[3]);

        let loss = smooth_l1_loss(&input, &target, 1.0, Reduction::None).unwrap();
        let values = loss.to_vec();
        assert_abs_diff_eq!(values[0], 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(values[2], 2.5, epsilon = 1e-12);

        let as_l1 = smooth_l1_loss(&input, &target, 0.0, Reduction::None).unwrap();
        assert_eq!(as_l1.to_vec(), vec![0.5, 2.0, 3.0]);
    }

    #[test]
    fn test_kl_div_zero_target_contributes_nothing() {
        let input = t(&[(0.5f64).ln(), (0.5f64).ln()], &[2]);
        let target = t(&[1.0, 0.0], &[2]);
        let loss = kl_div(&input, &target, false, Reduction::None).unwrap();
        let values = loss.to_vec();
        assert_abs_diff_eq!(values[0], std::f64::consts::LN_2, epsilon = 1e-12);
        assert_eq!(values[1], 0.0);
    }

    #[test]
    fn test_kl_div_log_target_agrees_with_probability_target() {
        let input = t(&[(0.2f64).ln(), (0.8f64).ln()], &[2]);
        let target = t(&[0.4, 0.6], &[2]);
        let log_target = target.map(|v| v.ln());

        let a = kl_div(&input, &target, false, Reduction::Sum).unwrap();
        let b = kl_div(&input, &log_target, true, Reduction::Sum).unwrap();
        assert_abs_diff_eq!(a.first().unwrap(), b.first().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_soft_margin_at_zero_is_ln_two() {
        let loss = soft_margin_loss(&t(&[0.0], &[1]), &t(&[1.0], &[1]), Reduction::Mean).unwrap();
        assert_abs_diff_eq!(loss.first().unwrap(), std::f64::consts::LN_2, epsilon = 1e-12);
    }

    #[test]
    fn test_bce_values_and_weight() {
        let input = t(&[0.8, 0.2], &[2]);
        let target = t(&[1.0, 0.0], &[2]);
        let expected = -(0.8f64).ln();

        let loss = binary_cross_entropy(&input, &target, None, Reduction::None).unwrap();
        for v in loss.to_vec() {
            assert_abs_diff_eq!(v, expected, epsilon = 1e-12);
        }

        let weight = t(&[2.0, 0.5], &[2]);
        let weighted = binary_cross_entropy(&input, &target, Some(&weight), Reduction::Sum).unwrap();
        assert_abs_diff_eq!(weighted.first().unwrap(), 2.5 * expected, epsilon = 1e-12);
    }

    #[test]
    fn test_bce_saturated_prediction_is_clamped() {
        let loss = binary_cross_entropy(&t(&[0.0], &[1]), &t(&[1.0], &[1]), None, Reduction::Sum)
            .unwrap();
        assert_abs_diff_eq!(loss.first().unwrap(), 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bce_rejects_values_outside_unit_interval() {
        let err = binary_cross_entropy(&t(&[1.5], &[1]), &t(&[1.0], &[1]), None, Reduction::Mean)
            .unwrap_err();
        assert!(matches!(err, LossError::InvalidInput { .. }));

        let err = binary_cross_entropy(&t(&[0.5], &[1]), &t(&[-1.0], &[1]), None, Reduction::Mean)
            .unwrap_err();
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn test_hinge_embedding_cases() {
        let positive = hinge_embedding_loss(&t(&[1.0], &[1]), &t(&[1.0], &[1]), 1.0, Reduction::Sum)
            .unwrap();
        assert_eq!(positive.first().unwrap(), 1.0);

        let negative =
            hinge_embedding_loss(&t(&[0.5], &[1]), &t(&[-1.0], &[1]), 1.0, Reduction::Sum).unwrap();
        assert_abs_diff_eq!(negative.first().unwrap(), 0.5, epsilon = 1e-12);

        let outside =
            hinge_embedding_loss(&t(&[2.0], &[1]), &t(&[-1.0], &[1]), 1.0, Reduction::Sum).unwrap();
        assert_eq!(outside.first().unwrap(), 0.0);
    }
}
