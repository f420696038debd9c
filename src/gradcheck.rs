//! Numeric gradient checking.
//!
//! Central differences over single parameter entries, used by the test
//! harness to confirm the tape's analytic gradients.

use crate::data::Batch;
use crate::error::Result;
use crate::model::Mlp;
use crate::train::evaluate;

/// Central difference `(f(+eps) - f(-eps)) / 2eps` of a scalar function of
/// one perturbation.
pub fn central_difference<F>(mut loss_at: F, eps: f64) -> Result<f64>
where
    F: FnMut(f64) -> Result<f64>,
{
    Ok((loss_at(eps)? - loss_at(-eps)?) / (2.0 * eps))
}

/// Numeric gradient of the batch loss with respect to one parameter entry.
///
/// `param` indexes [`Mlp::params_mut`] layer order, `entry` the flat data
/// slot. The entry is perturbed in place and restored afterwards.
///
/// # Panics
/// Panics if `param` or `entry` is out of range.
pub fn param_numeric_grad(
    model: &mut Mlp,
    param: usize,
    entry: usize,
    batch: &Batch,
    eps: f64,
) -> Result<f64> {
    let original = model.params_mut()[param].value.data[entry];
    central_difference(
        |offset| {
            model.params_mut()[param].value.data[entry] = original + offset;
            let loss = evaluate(model, batch);
            model.params_mut()[param].value.data[entry] = original;
            loss
        },
        eps,
    )
}
