use tapenet::Error;
use tapenet::ops;
use tapenet::tape::Tape;
use tapenet::tensor;
use tapenet::tensors::Tensor;

#[test]
fn test_tensor_shape_mismatch_panics() {
    let result = std::panic::catch_unwind(|| {
        Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0]);
    });
    assert!(result.is_err());
}

#[test]
fn test_tensor_macro_shapes() {
    let t = tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    assert_eq!(t.shape, vec![2, 3]);
    assert_eq!(t.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let s = tensor!(7.0);
    assert!(s.is_scalar());
    assert_eq!(s.data, vec![7.0]);
}

#[test]
fn test_relu_forward_and_backward() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([[-1.0, 0.0, 2.0]]));
    let y = ops::relu(&mut tape, x);
    assert_eq!(tape.value(y).data, vec![0.0, 0.0, 2.0]);

    let loss = ops::sum(&mut tape, y);
    let grads = tape.backward(loss).unwrap();
    assert_eq!(grads.get(x).unwrap().data, vec![0.0, 0.0, 1.0]);
}

#[test]
fn test_matmul_forward_and_backward() {
    let mut tape = Tape::new();
    let a = tape.leaf(tensor!([[1.0, 2.0], [3.0, 4.0]]));
    let b = tape.leaf(tensor!([[5.0, 6.0], [7.0, 8.0]]));
    let c = ops::matmul(&mut tape, a, b).unwrap();
    assert_eq!(tape.value(c).shape, vec![2, 2]);
    assert_eq!(tape.value(c).data, vec![19.0, 22.0, 43.0, 50.0]);

    // loss = sum(C) seeds dC with ones: dA = 1·Bᵀ, dB = Aᵀ·1
    let loss = ops::sum(&mut tape, c);
    let grads = tape.backward(loss).unwrap();
    assert_eq!(grads.get(a).unwrap().data, vec![11.0, 15.0, 11.0, 15.0]);
    assert_eq!(grads.get(b).unwrap().data, vec![4.0, 4.0, 6.0, 6.0]);
}

#[test]
fn test_matmul_inner_dim_mismatch() {
    let mut tape = Tape::new();
    let a = tape.leaf(tensor!([[1.0, 2.0, 3.0]]));
    let b = tape.leaf(tensor!([[1.0, 2.0], [3.0, 4.0]]));
    let result = ops::matmul(&mut tape, a, b);
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_add_row_backward_column_sums_bias() {
    let mut tape = Tape::new();
    let a = tape.leaf(tensor!([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]));
    let bias = tape.leaf(tensor!([10.0, 20.0]));
    let out = ops::add_row(&mut tape, a, bias).unwrap();
    assert_eq!(
        tape.value(out).data,
        vec![11.0, 22.0, 13.0, 24.0, 15.0, 26.0]
    );

    let loss = ops::sum(&mut tape, out);
    let grads = tape.backward(loss).unwrap();
    assert_eq!(grads.get(a).unwrap().data, vec![1.0; 6]);
    assert_eq!(grads.get(bias).unwrap().data, vec![3.0, 3.0]);
}

#[test]
fn test_log_softmax_rows_exponentiate_to_one() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([[1.0, 2.0, 3.0], [-5.0, 0.0, 5.0]]));
    let out = ops::log_softmax(&mut tape, x).unwrap();
    for row in tape.value(out).data.chunks(3) {
        let total: f64 = row.iter().map(|v| v.exp()).sum();
        assert!((total - 1.0).abs() < 1e-12, "row sums to {total}");
    }
}

#[test]
fn test_log_softmax_stable_for_large_logits() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([[1000.0, 1001.0, 999.0]]));
    let out = ops::log_softmax(&mut tape, x).unwrap();
    let total: f64 = tape.value(out).data.iter().map(|v| v.exp()).sum();
    assert!(total.is_finite());
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn test_nll_mean_value() {
    let mut tape = Tape::new();
    let logp = tape.leaf(tensor!([[-1.2, -0.3], [-0.7, -2.0]]));
    let loss = ops::nll_mean(&mut tape, logp, &[1, 0]).unwrap();
    let expected = (0.3 + 0.7) / 2.0;
    assert!((tape.value(loss).data[0] - expected).abs() < 1e-12);
}

#[test]
fn test_nll_mean_label_out_of_range() {
    let mut tape = Tape::new();
    let logp = tape.leaf(tensor!([[-1.0, -1.0]]));
    let result = ops::nll_mean(&mut tape, logp, &[2]);
    assert!(matches!(
        result,
        Err(Error::LabelOutOfRange {
            label: 2,
            classes: 2
        })
    ));
}

#[test]
fn test_nll_mean_backward_routes_selected_entries() {
    let mut tape = Tape::new();
    let logp = tape.leaf(tensor!([[-1.2, -0.3], [-0.7, -2.0]]));
    let loss = ops::nll_mean(&mut tape, logp, &[1, 0]).unwrap();
    let grads = tape.backward(loss).unwrap();
    assert_eq!(grads.get(logp).unwrap().data, vec![0.0, -0.5, -0.5, 0.0]);
}

#[test]
fn test_render_digit_dimensions() {
    use tapenet::tensors::Ten64;
    use tapenet::viz::render_digit;

    let image = Ten64::new(vec![4], vec![0.0, 0.5, 1.0, 0.25]);
    let art = render_digit(&image, 2).unwrap();
    assert_eq!(art.lines().count(), 2);
    assert!(art.lines().all(|line| line.chars().count() == 2));

    assert!(render_digit(&image, 3).is_err());
}

#[test]
fn test_render_prediction_names_the_winner() {
    use tapenet::tensors::Ten64;
    use tapenet::viz::render_prediction;

    let image = Ten64::new(vec![4], vec![0.0; 4]);
    let log_probs = [(0.1f64).ln(), (0.7f64).ln(), (0.2f64).ln()];
    let display = render_prediction(&image, 2, &log_probs).unwrap();
    assert!(display.contains("predicted: 1"));
}
