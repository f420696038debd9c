use tapenet::Error;
use tapenet::ops;
use tapenet::tape::Tape;
use tapenet::tensor;

#[test]
fn test_backward_on_empty_tape_is_an_error() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!(1.0));
    assert!(matches!(tape.backward(x), Err(Error::EmptyTape)));
}

#[test]
fn test_backward_twice_is_an_error() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([[1.0, 2.0]]));
    let y = ops::relu(&mut tape, x);
    let loss = ops::sum(&mut tape, y);
    tape.backward(loss).unwrap();
    assert!(matches!(tape.backward(loss), Err(Error::TapeConsumed)));
}

#[test]
fn test_backward_requires_scalar_loss() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([[1.0, 2.0]]));
    let y = ops::relu(&mut tape, x);
    assert!(matches!(
        tape.backward(y),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_multiple_consumers_sum_their_gradients() {
    // x feeds two relu nodes; its gradient is the sum of both paths
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([1.0, -2.0, 3.0]));
    let r1 = ops::relu(&mut tape, x);
    let r2 = ops::relu(&mut tape, x);
    let y = ops::add(&mut tape, r1, r2).unwrap();
    let loss = ops::sum(&mut tape, y);

    let grads = tape.backward(loss).unwrap();
    assert_eq!(grads.get(x).unwrap().data, vec![2.0, 0.0, 2.0]);
}

#[test]
fn test_ops_off_the_loss_path_receive_no_gradient() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([1.0, 2.0]));
    let unused_leaf = tape.leaf(tensor!([5.0, 6.0]));
    let _unused_op = ops::relu(&mut tape, unused_leaf);

    let y = ops::relu(&mut tape, x);
    let loss = ops::sum(&mut tape, y);
    let grads = tape.backward(loss).unwrap();

    assert!(grads.get(x).is_some());
    assert!(grads.get(unused_leaf).is_none());
}

#[test]
fn test_sum_broadcasts_gradient() {
    let mut tape = Tape::new();
    let x = tape.leaf(tensor!([[1.0, 2.0], [3.0, 4.0]]));
    let loss = ops::sum(&mut tape, x);
    assert_eq!(tape.value(loss).data, vec![10.0]);

    let grads = tape.backward(loss).unwrap();
    assert_eq!(grads.get(x).unwrap().data, vec![1.0; 4]);
    assert_eq!(grads.get(x).unwrap().shape, vec![2, 2]);
}
