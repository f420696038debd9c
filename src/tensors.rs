//! Core tensor data structures.
//!
//! This module defines the flat, row-major array type everything else is
//! built on, plus the parameter wrapper that carries a gradient buffer.
//!
//! ## Design Highlights
//! - `Tensor<T>` stores shape as a `Vec<usize>` and data in row-major order
//! - A scalar is a tensor with an empty shape and one element
//! - `WithGrad` pairs a parameter value with an explicitly managed gradient
//!   buffer: unset until the first `accumulate` or `reset_grad`, added to
//!   (never overwritten) by `accumulate`, zeroed only by `reset_grad`
//! - The `tensor!` macro builds tensors from nested literals
//!
//! ## Limitations
//! - Row-major only
//! - No broadcasting, slicing, or shape inference
//!
//! ## Example
//!
//! ```rust
//! use tapenet::tensors::Tensor;
//! let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(t.shape, vec![2, 3]);
//! ```

use crate::error::{Error, Result};

/// An N-dimensional tensor with a shape and flat row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

/// The element type used throughout training.
pub type Ten64 = Tensor<f64>;

impl<T> Tensor<T> {
    /// Creates a new tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Self {
        let shape = shape.into();
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        Self { shape, data }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Ten64 {
    /// An all-zero tensor of the given shape.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        Self::new(shape, vec![0.0; len])
    }

    /// A rank-0 tensor holding a single value.
    pub fn scalar(value: f64) -> Self {
        Self::new(Vec::new(), vec![value])
    }

    /// True for rank-0 tensors.
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }
}

/// A trainable parameter: a value paired with its gradient buffer.
///
/// The gradient starts *unset*. Reading it before any backward pass (or
/// reset) is a usage error, not a silent zero. `accumulate` adds into the
/// buffer so gradients from several backward passes can combine;
/// `reset_grad` zeroes it and must run before each fresh backward pass.
#[derive(Debug, Clone)]
pub struct WithGrad<T> {
    pub value: T,
    grad: Option<T>,
}

impl WithGrad<Ten64> {
    /// Wraps a value with an unset gradient buffer.
    pub fn new(value: Ten64) -> Self {
        Self { value, grad: None }
    }

    /// The accumulated gradient, or [`Error::GradUnset`] if no backward pass
    /// (or reset) has touched this parameter yet.
    pub fn grad(&self) -> Result<&Ten64> {
        self.grad.as_ref().ok_or(Error::GradUnset)
    }

    /// Adds `delta` into the gradient buffer, setting it if it was unset.
    ///
    /// # Errors
    /// [`Error::ShapeMismatch`] if `delta` does not match the value's shape.
    pub fn accumulate(&mut self, delta: &Ten64) -> Result<()> {
        if delta.shape != self.value.shape {
            return Err(Error::ShapeMismatch {
                expected: self.value.shape.clone(),
                got: delta.shape.clone(),
            });
        }
        match &mut self.grad {
            Some(grad) => {
                for (g, d) in grad.data.iter_mut().zip(&delta.data) {
                    *g += d;
                }
            }
            None => self.grad = Some(delta.clone()),
        }
        Ok(())
    }

    /// Zeroes the gradient buffer (allocating it if it was unset).
    pub fn reset_grad(&mut self) {
        match &mut self.grad {
            Some(grad) => grad.data.fill(0.0),
            None => self.grad = Some(Ten64::zeros(self.value.shape.clone())),
        }
    }

    /// Applies one descent step: `value -= lr * grad`.
    ///
    /// # Errors
    /// [`Error::GradUnset`] if the gradient buffer has never been set.
    pub fn apply_step(&mut self, lr: f64) -> Result<()> {
        let grad = self.grad.as_ref().ok_or(Error::GradUnset)?;
        for (w, g) in self.value.data.iter_mut().zip(&grad.data) {
            *w -= lr * g;
        }
        Ok(())
    }
}

/// Defines a tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
///
/// # Example
/// ```
/// use tapenet::tensor;
/// let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(t.shape, vec![2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ([ $( [ $($inner:tt)* ] ),+ $(,)? ]) => {{
        let children = vec![ $( tensor!([ $($inner)* ]) ),+ ];
        let first_shape = &children[0].shape;
        assert!(children.iter().all(|c| c.shape == *first_shape),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].data.len());
        for c in children { data.extend(c.data); }
        $crate::tensors::Tensor::new(shape, data)
    }};

    ([ $( $lit:expr ),+ $(,)? ]) => {{
        let data = vec![ $( $lit ),+ ];
        $crate::tensors::Tensor::new(vec![data.len()], data)
    }};

    ($lit:expr) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$lit])
    };
}
