//! Stochastic gradient descent.
//!
//! The step and the gradient reset are deliberately separate operations:
//! `Sgd::step` only applies `param -= lr * grad`, and [`Mlp::reset_grads`]
//! is the one place gradients get zeroed. A step against a never-set
//! gradient buffer is a usage error, not a silent no-op.

use crate::error::{Error, Result};
use crate::model::Mlp;

/// Plain SGD. Carries no state beyond the learning rate.
#[derive(Debug, Clone, Copy)]
pub struct Sgd {
    lr: f64,
}

impl Sgd {
    /// # Errors
    /// [`Error::InvalidConfig`] unless `lr` is finite and positive.
    pub fn new(lr: f64) -> Result<Self> {
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {lr}"
            )));
        }
        Ok(Self { lr })
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Updates every parameter independently: `param -= lr * grad`.
    ///
    /// Gradient buffers are left as they are.
    ///
    /// # Errors
    /// [`Error::GradUnset`] if any parameter has never received a gradient.
    pub fn step(&self, model: &mut Mlp) -> Result<()> {
        for param in model.params_mut() {
            param.apply_step(self.lr)?;
        }
        Ok(())
    }
}
