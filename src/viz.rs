//! Terminal visualization of an image and its predicted class distribution.
//!
//! A pure side-effect-free renderer: it takes a single flattened image and a
//! log-probability row and produces a string the caller can print.

use crate::error::{Error, Result};
use crate::tensors::Ten64;

const RAMP: &[u8] = b" .:-=+*#%@";

/// Renders a flattened grayscale image as ASCII intensity glyphs, `cols`
/// pixels per line. Intensities are clamped to `[0, 1]`.
///
/// # Errors
/// [`Error::ShapeMismatch`] if the pixel count is not a multiple of `cols`.
pub fn render_digit(image: &Ten64, cols: usize) -> Result<String> {
    if cols == 0 || image.len() % cols != 0 {
        return Err(Error::ShapeMismatch {
            expected: vec![cols],
            got: image.shape.clone(),
        });
    }
    let mut out = String::with_capacity(image.len() + image.len() / cols);
    for row in image.data.chunks(cols) {
        for &p in row {
            let idx = (p.clamp(0.0, 1.0) * (RAMP.len() - 1) as f64).round() as usize;
            out.push(RAMP[idx] as char);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Renders one bar per class from a probability vector.
pub fn render_probs(probs: &[f64]) -> String {
    let mut out = String::new();
    for (class, &p) in probs.iter().enumerate() {
        let bar = "#".repeat((p.clamp(0.0, 1.0) * 40.0).round() as usize);
        out.push_str(&format!("{class} | {bar:<40} {p:.3}\n"));
    }
    out
}

/// The full comparison display: the image next to the exponentiated
/// log-probability distribution and the winning class.
pub fn render_prediction(image: &Ten64, cols: usize, log_probs: &[f64]) -> Result<String> {
    let probs: Vec<f64> = log_probs.iter().map(|lp| lp.exp()).collect();
    let best = probs
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i);
    let mut out = render_digit(image, cols)?;
    out.push('\n');
    out.push_str(&render_probs(&probs));
    out.push_str(&format!("predicted: {best}\n"));
    Ok(out)
}
