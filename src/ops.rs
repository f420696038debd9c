//! Differentiable primitive operations.
//!
//! Each op follows the same pattern: validate shapes, compute the forward
//! value, then record a node on the [`Tape`] whose backward closure captures
//! (by clone) exactly the forward data its local derivative needs.
//!
//! ## Implemented Ops
//!
//! - `matmul`: matrix multiplication, rows parallelized with rayon
//! - `add`: elementwise addition of same-shape tensors
//! - `add_row`: broadcast a bias row over a batch
//! - `relu`: elementwise `max(0, x)`
//! - `log_softmax`: per-row log-normalization, max-subtracted for stability
//! - `nll_mean`: negative mean log-probability of the true class per row
//! - `sum`: reduction of every entry to a rank-0 scalar
//!
//! Shape *agreement* failures (inner dimensions, label counts) are data
//! dependent and return `Result`; passing a tensor of the wrong rank is a
//! programmer error and panics.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::tape::{Tape, Var};
use crate::tensors::{Ten64, Tensor};

/// Matrix multiplication of two 2D values: `a` (m×k) · `b` (k×n).
///
/// Forward rows are computed in parallel. Backward:
/// `dA = dOut · Bᵀ`, `dB = Aᵀ · dOut`.
///
/// # Errors
/// [`Error::ShapeMismatch`] if the inner dimensions disagree.
///
/// # Panics
/// Panics if either input is not rank 2.
pub fn matmul(tape: &mut Tape, a: Var, b: Var) -> Result<Var> {
    let (a_val, b_val) = (tape.value(a).clone(), tape.value(b).clone());
    assert_eq!(a_val.shape.len(), 2, "matmul lhs must be rank 2");
    assert_eq!(b_val.shape.len(), 2, "matmul rhs must be rank 2");
    let (m, k) = (a_val.shape[0], a_val.shape[1]);
    let n = b_val.shape[1];
    if b_val.shape[0] != k {
        return Err(Error::ShapeMismatch {
            expected: vec![k, n],
            got: b_val.shape.clone(),
        });
    }

    let mut out_data = vec![0.0; m * n];
    out_data.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        for j in 0..n {
            let mut sum = 0.0;
            for l in 0..k {
                sum += a_val.data[i * k + l] * b_val.data[l * n + j];
            }
            row[j] = sum;
        }
    });
    let out = Tensor::new(vec![m, n], out_data);

    let back = move |grad: &Ten64| {
        let mut da = vec![0.0; m * k];
        for i in 0..m {
            for l in 0..k {
                let mut sum = 0.0;
                for j in 0..n {
                    sum += grad.data[i * n + j] * b_val.data[l * n + j];
                }
                da[i * k + l] = sum;
            }
        }
        let mut db = vec![0.0; k * n];
        for l in 0..k {
            for j in 0..n {
                let mut sum = 0.0;
                for i in 0..m {
                    sum += a_val.data[i * k + l] * grad.data[i * n + j];
                }
                db[l * n + j] = sum;
            }
        }
        vec![
            (a, Tensor::new(vec![m, k], da)),
            (b, Tensor::new(vec![k, n], db)),
        ]
    };

    Ok(tape.push(out, Box::new(back)))
}

/// Elementwise addition of two same-shape values.
///
/// # Errors
/// [`Error::ShapeMismatch`] if the shapes differ.
pub fn add(tape: &mut Tape, a: Var, b: Var) -> Result<Var> {
    let (a_val, b_val) = (tape.value(a), tape.value(b));
    if a_val.shape != b_val.shape {
        return Err(Error::ShapeMismatch {
            expected: a_val.shape.clone(),
            got: b_val.shape.clone(),
        });
    }
    let out = Tensor::new(
        a_val.shape.clone(),
        a_val
            .data
            .iter()
            .zip(&b_val.data)
            .map(|(x, y)| x + y)
            .collect(),
    );

    let back = move |grad: &Ten64| vec![(a, grad.clone()), (b, grad.clone())];
    Ok(tape.push(out, Box::new(back)))
}

/// Broadcasts a bias row over a batch: `out[i, j] = a[i, j] + bias[j]`.
///
/// Backward passes the gradient through to `a` unchanged and column-sums it
/// for the bias.
///
/// # Errors
/// [`Error::ShapeMismatch`] if `bias` is not a vector of width `a.shape[1]`.
///
/// # Panics
/// Panics if `a` is not rank 2.
pub fn add_row(tape: &mut Tape, a: Var, bias: Var) -> Result<Var> {
    let (a_val, bias_val) = (tape.value(a), tape.value(bias));
    assert_eq!(a_val.shape.len(), 2, "add_row lhs must be rank 2");
    let (m, n) = (a_val.shape[0], a_val.shape[1]);
    if bias_val.shape != [n] {
        return Err(Error::ShapeMismatch {
            expected: vec![n],
            got: bias_val.shape.clone(),
        });
    }

    let mut out_data = vec![0.0; m * n];
    out_data
        .par_chunks_mut(n)
        .zip(a_val.data.par_chunks(n))
        .for_each(|(out_row, a_row)| {
            for j in 0..n {
                out_row[j] = a_row[j] + bias_val.data[j];
            }
        });
    let out = Tensor::new(vec![m, n], out_data);

    let back = move |grad: &Ten64| {
        let mut dbias = vec![0.0; n];
        for row in grad.data.chunks(n) {
            for (d, g) in dbias.iter_mut().zip(row) {
                *d += g;
            }
        }
        vec![(a, grad.clone()), (bias, Tensor::new(vec![n], dbias))]
    };
    Ok(tape.push(out, Box::new(back)))
}

/// Elementwise ReLU: `max(0, x)`.
///
/// Backward propagates the gradient only where the input was positive.
pub fn relu(tape: &mut Tape, x: Var) -> Var {
    let x_val = tape.value(x).clone();
    let mut data = vec![0.0; x_val.data.len()];
    data.par_iter_mut()
        .zip(x_val.data.par_iter())
        .for_each(|(y, &v)| {
            *y = if v > 0.0 { v } else { 0.0 };
        });
    let out = Tensor::new(x_val.shape.clone(), data);

    let back = move |grad: &Ten64| {
        let masked: Vec<f64> = x_val
            .data
            .iter()
            .zip(&grad.data)
            .map(|(&v, &g)| if v > 0.0 { g } else { 0.0 })
            .collect();
        vec![(x, Tensor::new(x_val.shape.clone(), masked))]
    };
    tape.push(out, Box::new(back))
}

/// Per-row log-normalization: `out[i, j] = x[i, j] - log(sum_j exp(x[i, j]))`.
///
/// The per-row maximum is subtracted before exponentiating, so large logits
/// do not overflow. Every output row exponentiates to a distribution that
/// sums to one.
///
/// Backward: `dX[i, j] = g[i, j] - exp(out[i, j]) * sum_j g[i, j]`.
///
/// # Errors
/// [`Error::ShapeMismatch`] if the class dimension is zero.
///
/// # Panics
/// Panics if `x` is not rank 2.
pub fn log_softmax(tape: &mut Tape, x: Var) -> Result<Var> {
    let x_val = tape.value(x);
    assert_eq!(x_val.shape.len(), 2, "log_softmax input must be rank 2");
    let (m, c) = (x_val.shape[0], x_val.shape[1]);
    if c == 0 {
        return Err(Error::ShapeMismatch {
            expected: vec![m, 1],
            got: x_val.shape.clone(),
        });
    }

    let mut out_data = vec![0.0; m * c];
    out_data
        .par_chunks_mut(c)
        .zip(x_val.data.par_chunks(c))
        .for_each(|(out_row, x_row)| {
            let max = x_row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let lse = x_row.iter().map(|v| (v - max).exp()).sum::<f64>().ln() + max;
            for (o, v) in out_row.iter_mut().zip(x_row) {
                *o = v - lse;
            }
        });
    let out = Tensor::new(vec![m, c], out_data);

    let logp = out.clone();
    let back = move |grad: &Ten64| {
        let mut dx = vec![0.0; m * c];
        for i in 0..m {
            let row = i * c;
            let g_sum: f64 = grad.data[row..row + c].iter().sum();
            for j in 0..c {
                dx[row + j] = grad.data[row + j] - logp.data[row + j].exp() * g_sum;
            }
        }
        vec![(x, Tensor::new(vec![m, c], dx))]
    };
    Ok(tape.push(out, Box::new(back)))
}

/// Sums every entry into a rank-0 scalar.
///
/// Backward broadcasts the incoming gradient to every entry.
pub fn sum(tape: &mut Tape, x: Var) -> Var {
    let x_val = tape.value(x);
    let shape = x_val.shape.clone();
    let total: f64 = x_val.data.iter().sum();
    let len = x_val.data.len();

    let back = move |grad: &Ten64| {
        let g = grad.data[0];
        vec![(x, Tensor::new(shape.clone(), vec![g; len]))]
    };
    tape.push(Ten64::scalar(total), Box::new(back))
}

/// Negative mean log-probability of each row's true class.
///
/// Produces a rank-0 scalar. An empty batch yields a loss of `0.0`.
///
/// Backward routes `-g / batch` to each selected entry.
///
/// # Errors
/// - [`Error::ShapeMismatch`] if `labels.len()` differs from the batch size.
/// - [`Error::LabelOutOfRange`] if any label is `>=` the class count.
///
/// # Panics
/// Panics if `log_probs` is not rank 2.
pub fn nll_mean(tape: &mut Tape, log_probs: Var, labels: &[usize]) -> Result<Var> {
    let lp = tape.value(log_probs);
    assert_eq!(lp.shape.len(), 2, "nll_mean input must be rank 2");
    let (m, c) = (lp.shape[0], lp.shape[1]);
    if labels.len() != m {
        return Err(Error::ShapeMismatch {
            expected: vec![m],
            got: vec![labels.len()],
        });
    }
    for &label in labels {
        if label >= c {
            return Err(Error::LabelOutOfRange { label, classes: c });
        }
    }

    let loss = if m == 0 {
        0.0
    } else {
        -labels
            .iter()
            .enumerate()
            .map(|(i, &y)| lp.data[i * c + y])
            .sum::<f64>()
            / m as f64
    };

    let labels = labels.to_vec();
    let back = move |grad: &Ten64| {
        let mut dlp = vec![0.0; m * c];
        if m > 0 {
            let scale = -grad.data[0] / m as f64;
            for (i, &y) in labels.iter().enumerate() {
                dlp[i * c + y] = scale;
            }
        }
        vec![(log_probs, Tensor::new(vec![m, c], dlp))]
    };
    Ok(tape.push(Ten64::scalar(loss), Box::new(back)))
}
