//! The reverse-mode differentiator.
//!
//! # Computation Tape
//!
//! A [`Tape`] is an explicit recording context passed by reference through
//! every differentiable operation. Each op computes its output eagerly,
//! stores it in the tape's value arena, and records a node whose backward
//! closure maps the incoming gradient to one gradient per input. There is no
//! global state: whoever owns the tape owns the recording.
//!
//! ## Autograd Pattern
//!
//! 1. **Leaves** (parameters, inputs) enter via [`Tape::leaf`] and get no node.
//! 2. **Ops** push one output value plus one node per call.
//! 3. **Backward** seeds the scalar loss with gradient `1.0` and walks the
//!    nodes in strict reverse order, applying the chain rule at each one.
//!    A value consumed by several later ops receives the *sum* of the
//!    gradients flowing back from each consumer.
//! 4. **Read-out**: [`Gradients`] maps leaf [`Var`]s back to their gradient
//!    tensors so callers can accumulate them into parameter buffers.
//!
//! ## Usage Guidelines
//!
//! - A tape covers exactly one forward/backward cycle. `backward` consumes
//!   it; calling it again is [`Error::TapeConsumed`].
//! - `backward` on a tape that recorded no operations is [`Error::EmptyTape`].
//! - The loss must be a scalar (rank-0) value.
//!
//! ## Example
//!
//! ```rust
//! use tapenet::{ops, tape::Tape, tensor};
//!
//! # fn main() -> tapenet::Result<()> {
//! let mut tape = Tape::new();
//! let x = tape.leaf(tensor!([[1.5, -2.0]]));
//! let y = ops::relu(&mut tape, x);
//! assert_eq!(tape.value(y).data, vec![1.5, 0.0]);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::tensors::Ten64;

/// Handle to a value recorded on a [`Tape`].
///
/// Only meaningful for the tape that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Var(pub(crate) usize);

/// Backward rule of one recorded op: maps `dL/d(out)` to `(input, dL/d(input))`
/// pairs. Captures whatever forward values it needs by clone.
pub(crate) type BackFn = Box<dyn Fn(&Ten64) -> Vec<(Var, Ten64)>>;

struct Node {
    back: BackFn,
}

/// An ordered record of one forward computation.
pub struct Tape {
    values: Vec<Ten64>,
    nodes: Vec<Option<Node>>,
    recorded: usize,
    consumed: bool,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// An empty recording context.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            nodes: Vec::new(),
            recorded: 0,
            consumed: false,
        }
    }

    /// Registers a leaf value (parameter or input) with no backward rule.
    pub fn leaf(&mut self, value: Ten64) -> Var {
        self.values.push(value);
        self.nodes.push(None);
        Var(self.values.len() - 1)
    }

    /// Records one op: output value plus its backward closure.
    pub(crate) fn push(&mut self, value: Ten64, back: BackFn) -> Var {
        self.values.push(value);
        self.nodes.push(Some(Node { back }));
        self.recorded += 1;
        Var(self.values.len() - 1)
    }

    /// The forward value held by `var`.
    ///
    /// # Panics
    /// Panics if `var` came from a different tape and is out of range.
    pub fn value(&self, var: Var) -> &Ten64 {
        &self.values[var.0]
    }

    /// Number of recorded operations (leaves excluded).
    pub fn num_ops(&self) -> usize {
        self.recorded
    }

    /// Runs reverse accumulation from the scalar `loss` back to every leaf.
    ///
    /// Traverses the recorded nodes in strict reverse order. Each node fires
    /// only if some consumer routed a gradient to it; contributions from
    /// multiple consumers are summed before a node fires.
    ///
    /// Consumes the tape: a second call fails rather than silently reusing
    /// stale intermediates.
    ///
    /// # Errors
    /// - [`Error::TapeConsumed`] if backward already ran on this tape.
    /// - [`Error::EmptyTape`] if no operations were recorded.
    /// - [`Error::ShapeMismatch`] if `loss` is not a scalar.
    pub fn backward(&mut self, loss: Var) -> Result<Gradients> {
        if self.consumed {
            return Err(Error::TapeConsumed);
        }
        if self.recorded == 0 {
            return Err(Error::EmptyTape);
        }
        let loss_shape = &self.values[loss.0].shape;
        if !loss_shape.is_empty() {
            return Err(Error::ShapeMismatch {
                expected: Vec::new(),
                got: loss_shape.clone(),
            });
        }
        self.consumed = true;

        let mut grads: Vec<Option<Ten64>> = vec![None; self.values.len()];
        grads[loss.0] = Some(Ten64::scalar(1.0));

        for i in (0..self.nodes.len()).rev() {
            let Some(node) = self.nodes[i].as_ref() else {
                continue;
            };
            // no gradient routed here means this op is off the loss path
            let Some(grad_out) = grads[i].take() else {
                continue;
            };
            for (input, contrib) in (node.back)(&grad_out) {
                accumulate(&mut grads[input.0], contrib);
            }
        }

        Ok(Gradients { grads })
    }
}

fn accumulate(slot: &mut Option<Ten64>, contrib: Ten64) {
    match slot {
        Some(grad) => {
            debug_assert_eq!(grad.shape, contrib.shape, "gradient shape drift");
            for (g, c) in grad.data.iter_mut().zip(&contrib.data) {
                *g += c;
            }
        }
        None => *slot = Some(contrib),
    }
}

/// Leaf gradients produced by one [`Tape::backward`] call.
pub struct Gradients {
    grads: Vec<Option<Ten64>>,
}

impl Gradients {
    /// The gradient that reached `var`, if any did.
    pub fn get(&self, var: Var) -> Option<&Ten64> {
        self.grads.get(var.0).and_then(|g| g.as_ref())
    }

    /// Removes and returns the gradient that reached `var`.
    pub fn take(&mut self, var: Var) -> Option<Ten64> {
        self.grads.get_mut(var.0).and_then(|g| g.take())
    }
}
