#[cfg(test)]
mod tests {
    use crate::Tensor;
    use crate::error::LossError;
    use crate::tensor::broadcast_shape;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_tensors_close(a: &Tensor<f64>, b: &Tensor<f64>, tolerance: f64) {
        assert_eq!(a.shape(), b.shape(), "Shapes don't match");

        for (i, (val_a, val_b)) in a.to_vec().into_iter().zip(b.to_vec()).enumerate() {
            assert!(
                (val_a - val_b).abs() < tolerance,
                "Values differ at index {}: {:?} vs {:?}",
                i,
                val_a,
                val_b
            );
        }
    }

    #[test]
    fn test_tensor_creation() {
        let tensor = Tensor::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        assert_eq!(tensor.shape(), &[2, 2]);
        assert_eq!(tensor.len(), 4);
        assert_eq!(tensor.ndim(), 2);
        assert!(!tensor.is_empty());

        let err = Tensor::<f64>::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert!(matches!(err, LossError::Tensor(_)));
    }

    #[test]
    fn test_scalar_and_filled_tensors() {
        let scalar = Tensor::scalar(2.5f64);
        assert_eq!(scalar.ndim(), 0);
        assert_eq!(scalar.len(), 1);
        assert_eq!(scalar.first().unwrap(), 2.5);

        assert_eq!(Tensor::<f64>::zeros(&[3]).sum(), 0.0);
        assert_eq!(Tensor::<f64>::ones(&[2, 3]).sum(), 6.0);
        assert_eq!(Tensor::<f32>::full(&[2], 1.5).to_vec(), vec![1.5, 1.5]);
    }

    #[test]
    fn test_empty_tensor_statistics() {
        let empty = Tensor::<f64>::zeros(&[0]);
        assert!(empty.is_empty());
        assert_eq!(empty.sum(), 0.0);
        assert!(empty.mean().is_nan());
        assert!(empty.first().is_err());
    }

    #[test]
    fn test_clone_shares_storage() {
        let a = Tensor::<f64>::ones(&[4]);
        let b = a.clone();
        assert!(a.ptr_eq(&b));

        let c = a.map(|x| x * 2.0);
        assert!(!a.ptr_eq(&c));
        assert_eq!(a.to_vec(), vec![1.0; 4]);
        assert_eq!(c.to_vec(), vec![2.0; 4]);
    }

    #[test]
    fn test_broadcast_shape_rules() {
        assert_eq!(broadcast_shape(&[2, 3], &[3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shape(&[2, 1], &[1, 4]), Some(vec![2, 4]));
        assert_eq!(broadcast_shape(&[], &[5]), Some(vec![5]));
        assert_eq!(broadcast_shape(&[2, 3], &[2]), None);
    }

    #[test]
    fn test_zip_with_broadcasts() {
        let a = Tensor::<f64>::from_f64(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let b = Tensor::from_f64(&[10.0, 20.0, 30.0], &[3]).unwrap();

        let out = a.zip_with(&b, "add", |x, y| x + y).unwrap();
        let expected =
            Tensor::from_f64(&[11.0, 22.0, 33.0, 14.0, 25.0, 36.0], &[2, 3]).unwrap();
        assert_tensors_close(&out, &expected, 1e-12);

        let bad = Tensor::from_f64(&[1.0, 2.0], &[2]).unwrap();
        let err = a.zip_with(&bad, "add", |x, y| x + y).unwrap_err();
        assert!(matches!(err, LossError::ShapeMismatch { op: "add", .. }));
    }

    #[test]
    fn test_as_batch_views() {
        let row = Tensor::<f64>::from_f64(&[1.0, 2.0, 3.0], &[3]).unwrap();
        let (view, unbatched) = row.as_batch("test").unwrap();
        assert!(unbatched);
        assert_eq!(view.dim(), (1, 3));

        let matrix = Tensor::<f64>::zeros(&[4, 2]);
        let (view, unbatched) = matrix.as_batch("test").unwrap();
        assert!(!unbatched);
        assert_eq!(view.dim(), (4, 2));

        let cube = Tensor::<f64>::zeros(&[2, 2, 2]);
        assert!(matches!(
            cube.as_batch("test"),
            Err(LossError::InvalidInput { op: "test", .. })
        ));
    }

    #[test]
    fn test_to_indices_rejects_fractions() {
        let labels = Tensor::<f64>::from_f64(&[0.0, 3.0, -1.0], &[3]).unwrap();
        assert_eq!(labels.to_indices("test").unwrap(), vec![0, 3, -1]);

        let fractional = Tensor::<f64>::from_f64(&[0.5], &[1]).unwrap();
        assert!(fractional.to_indices("test").is_err());

        let nan = Tensor::<f64>::full(&[1], f64::NAN);
        assert!(nan.to_indices("test").is_err());
    }

    #[test]
    fn test_seeded_random_tensors_are_reproducible() {
        let a = Tensor::<f64>::randn_with_rng(&[3, 4], &mut StdRng::seed_from_u64(7));
        let b = Tensor::<f64>::randn_with_rng(&[3, 4], &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let mut rng = StdRng::seed_from_u64(11);
        let u = Tensor::<f64>::rand_uniform_with_rng(&[100], 0.25, 0.75, &mut rng).unwrap();
        assert!(u.to_vec().iter().all(|&v| (0.25..0.75).contains(&v)));
        assert_abs_diff_eq!(u.mean(), 0.5, epsilon = 0.1);

        assert!(Tensor::<f64>::rand_uniform_with_rng(&[1], 1.0, 0.0, &mut rng).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let tensor = Tensor::<f64>::from_f64(&[1.0, -2.0, 0.5, 4.0], &[2, 2]).unwrap();
        let json = serde_json::to_string(&tensor).unwrap();
        assert_eq!(json, r#"{"shape":[2,2],"data":[1.0,-2.0,0.5,4.0]}"#);

        let back: Tensor<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tensor);

        let mismatched = r#"{"shape":[3],"data":[1.0]}"#;
        assert!(serde_json::from_str::<Tensor<f64>>(mismatched).is_err());
    }
}
