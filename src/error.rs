//! Crate-wide error type.
//!
//! Low-level tensor constructors treat misuse as programmer error and panic;
//! everything that can fail from ordinary training input (bad labels, wrong
//! widths, tape misuse) goes through [`Error`] so the training loop can halt
//! and surface the failure instead of corrupting later gradients.

use std::fmt;

/// Errors surfaced by ops, the tape, the optimizer, and the training loop.
#[derive(Debug)]
pub enum Error {
    /// A tensor did not have the shape an operation required.
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// A class label fell outside `[0, classes)`.
    LabelOutOfRange { label: usize, classes: usize },
    /// `backward` was called on a tape with no recorded operations.
    EmptyTape,
    /// `backward` was called twice on the same tape.
    TapeConsumed,
    /// A parameter gradient was read before any backward pass set it.
    GradUnset,
    /// A configuration value was rejected (zero epochs, non-finite lr, ...).
    InvalidConfig(String),
    /// Weight file I/O failed.
    Io(std::io::Error),
    /// A weight file was recognized but malformed.
    BadModelFile(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {expected:?}, got {got:?}")
            }
            Error::LabelOutOfRange { label, classes } => {
                write!(f, "label {label} out of range for {classes} classes")
            }
            Error::EmptyTape => write!(f, "backward called on a tape with no recorded operations"),
            Error::TapeConsumed => write!(f, "backward called twice on the same tape"),
            Error::GradUnset => write!(f, "gradient read before any backward pass"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::BadModelFile(msg) => write!(f, "bad model file: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
