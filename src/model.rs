//! The feed-forward classifier.
//!
//! Three affine layers with two ReLUs between them and a terminal
//! log-softmax, so the model maps a `[batch, input_dim]` tensor of flattened
//! images to `[batch, classes]` log-probabilities. The forward pass is a pure
//! function of the parameters and the input; parameters change only through
//! the optimizer step.

use rand::Rng;

use crate::error::{Error, Result};
use crate::ops;
use crate::tape::{Gradients, Tape, Var};
use crate::tensors::{Ten64, WithGrad};

/// A three-layer perceptron for image classification.
#[derive(Clone)]
pub struct Mlp {
    w1: WithGrad<Ten64>,
    b1: WithGrad<Ten64>,
    w2: WithGrad<Ten64>,
    b2: WithGrad<Ten64>,
    w3: WithGrad<Ten64>,
    b3: WithGrad<Ten64>,
}

/// The tape [`Var`]s a model's parameters were registered under for one
/// forward/backward cycle. Produced by [`Mlp::bind`], consumed by
/// [`Mlp::forward`] and [`Mlp::accumulate`].
pub struct Binding {
    w1: Var,
    b1: Var,
    w2: Var,
    b2: Var,
    w3: Var,
    b3: Var,
}

fn init_weight(rows: usize, cols: usize, rng: &mut impl Rng) -> WithGrad<Ten64> {
    // uniform in [-1/sqrt(fan_in), 1/sqrt(fan_in)]
    let limit = 1.0 / (rows as f64).sqrt();
    let data = (0..rows * cols)
        .map(|_| (rng.random::<f64>() * 2.0 - 1.0) * limit)
        .collect();
    WithGrad::new(Ten64::new(vec![rows, cols], data))
}

impl Mlp {
    /// Builds a model with random small weights and zero biases.
    ///
    /// # Panics
    /// Panics if any dimension is zero.
    pub fn new(
        input_dim: usize,
        hidden1: usize,
        hidden2: usize,
        classes: usize,
        rng: &mut impl Rng,
    ) -> Self {
        assert!(
            input_dim >= 1 && hidden1 >= 1 && hidden2 >= 1 && classes >= 1,
            "all layer dimensions must be >= 1"
        );
        Self {
            w1: init_weight(input_dim, hidden1, rng),
            b1: WithGrad::new(Ten64::zeros(vec![hidden1])),
            w2: init_weight(hidden1, hidden2, rng),
            b2: WithGrad::new(Ten64::zeros(vec![hidden2])),
            w3: init_weight(hidden2, classes, rng),
            b3: WithGrad::new(Ten64::zeros(vec![classes])),
        }
    }

    /// Width of a flattened input image.
    pub fn input_dim(&self) -> usize {
        self.w1.value.shape[0]
    }

    /// Number of output classes.
    pub fn classes(&self) -> usize {
        self.w3.value.shape[1]
    }

    /// Registers every parameter as a leaf on `tape`.
    pub fn bind(&self, tape: &mut Tape) -> Binding {
        Binding {
            w1: tape.leaf(self.w1.value.clone()),
            b1: tape.leaf(self.b1.value.clone()),
            w2: tape.leaf(self.w2.value.clone()),
            b2: tape.leaf(self.b2.value.clone()),
            w3: tape.leaf(self.w3.value.clone()),
            b3: tape.leaf(self.b3.value.clone()),
        }
    }

    /// Records the forward pass on `tape`, returning the log-probability
    /// output of shape `[batch, classes]`. An empty batch flows through and
    /// yields a `[0, classes]` result.
    ///
    /// # Errors
    /// [`Error::ShapeMismatch`] if `x` is not `[batch, input_dim]`.
    pub fn forward(&self, tape: &mut Tape, bind: &Binding, x: Var) -> Result<Var> {
        let x_shape = &tape.value(x).shape;
        if x_shape.len() != 2 || x_shape[1] != self.input_dim() {
            return Err(Error::ShapeMismatch {
                expected: vec![x_shape.first().copied().unwrap_or(0), self.input_dim()],
                got: x_shape.clone(),
            });
        }

        let z1 = ops::matmul(tape, x, bind.w1)?;
        let z1 = ops::add_row(tape, z1, bind.b1)?;
        let a1 = ops::relu(tape, z1);
        let z2 = ops::matmul(tape, a1, bind.w2)?;
        let z2 = ops::add_row(tape, z2, bind.b2)?;
        let a2 = ops::relu(tape, z2);
        let z3 = ops::matmul(tape, a2, bind.w3)?;
        let logits = ops::add_row(tape, z3, bind.b3)?;
        ops::log_softmax(tape, logits)
    }

    /// Runs a standalone forward pass and returns the log-probabilities.
    ///
    /// Convenience for inference and tests; builds its own throwaway tape.
    pub fn predict(&self, images: &Ten64) -> Result<Ten64> {
        let mut tape = Tape::new();
        let bind = self.bind(&mut tape);
        let x = tape.leaf(images.clone());
        let out = self.forward(&mut tape, &bind, x)?;
        Ok(tape.value(out).clone())
    }

    /// Adds the leaf gradients from one backward pass into the parameter
    /// gradient buffers. Added, not overwritten: repeated backward passes
    /// between resets accumulate.
    pub fn accumulate(&mut self, bind: &Binding, grads: &mut Gradients) -> Result<()> {
        let pairs = [
            (&mut self.w1, bind.w1),
            (&mut self.b1, bind.b1),
            (&mut self.w2, bind.w2),
            (&mut self.b2, bind.b2),
            (&mut self.w3, bind.w3),
            (&mut self.b3, bind.b3),
        ];
        for (param, var) in pairs {
            if let Some(grad) = grads.take(var) {
                param.accumulate(&grad)?;
            }
        }
        Ok(())
    }

    /// Zeroes every parameter gradient buffer.
    pub fn reset_grads(&mut self) {
        for param in self.params_mut() {
            param.reset_grad();
        }
    }

    /// All parameters, in layer order.
    pub fn params(&self) -> [&WithGrad<Ten64>; 6] {
        [&self.w1, &self.b1, &self.w2, &self.b2, &self.w3, &self.b3]
    }

    /// All parameters, mutably, in layer order.
    pub fn params_mut(&mut self) -> [&mut WithGrad<Ten64>; 6] {
        [
            &mut self.w1,
            &mut self.b1,
            &mut self.w2,
            &mut self.b2,
            &mut self.w3,
            &mut self.b3,
        ]
    }

    /// Clones the parameter values in layer order, for serialization.
    pub fn export_weights(&self) -> Vec<Ten64> {
        self.params().iter().map(|p| p.value.clone()).collect()
    }

    /// Replaces the parameter values from a serialized list.
    ///
    /// Gradient buffers are left untouched; reset before the next backward.
    ///
    /// # Errors
    /// [`Error::BadModelFile`] on a wrong tensor count,
    /// [`Error::ShapeMismatch`] if any tensor has the wrong shape.
    pub fn import_weights(&mut self, weights: Vec<Ten64>) -> Result<()> {
        if weights.len() != 6 {
            return Err(Error::BadModelFile("expected 6 weight tensors"));
        }
        for (param, tensor) in self.params_mut().into_iter().zip(weights) {
            if tensor.shape != param.value.shape {
                return Err(Error::ShapeMismatch {
                    expected: param.value.shape.clone(),
                    got: tensor.shape,
                });
            }
            param.value = tensor;
        }
        Ok(())
    }
}
