//! tapenet: a tape-based autodiff engine and a small digit classifier.
//!
//! Forward propagation, loss computation, reverse-mode differentiation, and
//! SGD training for a three-layer feed-forward classifier, built on an
//! explicit computation tape instead of global autograd state.
//!
//! # Features
//!
//! - Flat row-major tensors with explicit gradient buffers.
//! - A one-shot [`tape::Tape`] recording context: every differentiable op
//!   takes the tape by reference, and backward walks the record in reverse.
//! - A pure three-layer MLP with stable log-softmax output.
//! - Mini-batch SGD with a separate gradient-reset operation.
//! - Weight serialization, an in-memory batching loader, and a terminal
//!   visualization helper.
//!
//! # Goals
//!
//! - Keep every stage of the training procedure explicit and inspectable.
//! - Prioritize correctness over black-box abstraction: misuse of the tape
//!   or the gradient buffers is an error, never a silent default.
//!
//! # Modules
//!
//! - [`tensors`] — tensor storage and the `WithGrad` parameter wrapper.
//! - [`tape`] — the reverse-mode differentiator.
//! - [`ops`] — differentiable primitives recorded on a tape.
//! - [`model`] — the feed-forward classifier.
//! - [`optim`] — stochastic gradient descent.
//! - [`train`] — the batch/epoch training loop.
//! - [`data`] — dataset storage and the batching loader.
//! - [`gradcheck`] — finite-difference gradient verification.
//! - [`modelio`] — weight file save/load.
//! - [`viz`] — terminal rendering of predictions.
//!
//! # Example
//!
//! ```rust
//! use tapenet::{ops, tape::Tape, tensor};
//!
//! # fn main() -> tapenet::Result<()> {
//! let mut tape = Tape::new();
//! let logits = tape.leaf(tensor!([[1.0, 2.0, 0.5]]));
//! let log_probs = ops::log_softmax(&mut tape, logits)?;
//! let loss = ops::nll_mean(&mut tape, log_probs, &[1])?;
//! let grads = tape.backward(loss)?;
//! assert!(grads.get(logits).is_some());
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod gradcheck;
pub mod model;
pub mod modelio;
pub mod ops;
pub mod optim;
pub mod tape;
pub mod tensors;
pub mod train;
pub mod viz;

pub use error::{Error, Result};
