use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use tapenet::Error;
use tapenet::model::Mlp;
use tapenet::tensors::Ten64;

fn random_images(rows: usize, dim: usize, rng: &mut StdRng) -> Ten64 {
    let data = (0..rows * dim).map(|_| rng.random::<f64>()).collect();
    Ten64::new(vec![rows, dim], data)
}

#[test]
fn test_forward_output_shape() {
    let mut rng = StdRng::seed_from_u64(1);
    let model = Mlp::new(10, 8, 6, 3, &mut rng);
    for batch_size in [1, 4, 7] {
        let images = random_images(batch_size, 10, &mut rng);
        let out = model.predict(&images).unwrap();
        assert_eq!(out.shape, vec![batch_size, 3]);
    }
}

#[test]
fn test_empty_batch_is_a_noop() {
    let mut rng = StdRng::seed_from_u64(2);
    let model = Mlp::new(10, 8, 6, 3, &mut rng);
    let out = model.predict(&Ten64::new(vec![0, 10], Vec::new())).unwrap();
    assert_eq!(out.shape, vec![0, 3]);
    assert!(out.data.is_empty());
}

#[test]
fn test_forward_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(3);
    let model = Mlp::new(12, 9, 7, 4, &mut rng);
    let images = random_images(5, 12, &mut rng);
    let first = model.predict(&images).unwrap();
    let second = model.predict(&images).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_input_width_mismatch() {
    let mut rng = StdRng::seed_from_u64(4);
    let model = Mlp::new(10, 8, 6, 3, &mut rng);
    let images = random_images(2, 11, &mut rng);
    assert!(matches!(
        model.predict(&images),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_prediction_rows_are_distributions() {
    let mut rng = StdRng::seed_from_u64(5);
    let model = Mlp::new(10, 8, 6, 3, &mut rng);
    let images = random_images(6, 10, &mut rng);
    let out = model.predict(&images).unwrap();
    for row in out.data.chunks(3) {
        let total: f64 = row.iter().map(|v| v.exp()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_weight_export_import_round_trip() {
    let mut rng = StdRng::seed_from_u64(6);
    let source = Mlp::new(10, 8, 6, 3, &mut rng);
    let mut target = Mlp::new(10, 8, 6, 3, &mut rng);

    let images = random_images(3, 10, &mut rng);
    assert_ne!(source.predict(&images).unwrap(), target.predict(&images).unwrap());

    target.import_weights(source.export_weights()).unwrap();
    assert_eq!(source.predict(&images).unwrap(), target.predict(&images).unwrap());
}

#[test]
fn test_weight_import_rejects_bad_input() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut model = Mlp::new(10, 8, 6, 3, &mut rng);

    assert!(matches!(
        model.import_weights(vec![Ten64::zeros(vec![10, 8])]),
        Err(Error::BadModelFile(_))
    ));

    let other = Mlp::new(9, 8, 6, 3, &mut rng);
    assert!(matches!(
        model.import_weights(other.export_weights()),
        Err(Error::ShapeMismatch { .. })
    ));
}
