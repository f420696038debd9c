//! The training loop.
//!
//! Per batch, the step runs the fixed sequence the model contract requires:
//! forward + loss on a fresh tape, reset the parameter gradients, backward
//! and accumulate, then one SGD update. Any error halts the loop and
//! propagates; continuing with a half-applied step would corrupt every
//! gradient after it.

use log::info;

use crate::data::{Batch, Loader};
use crate::error::{Error, Result};
use crate::model::Mlp;
use crate::ops;
use crate::optim::Sgd;
use crate::tape::Tape;

/// Knobs for [`train`].
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    pub epochs: usize,
    pub lr: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            lr: 1e-2,
        }
    }
}

/// Per-epoch mean batch losses, in epoch order.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epoch_losses: Vec<f64>,
}

/// Computes the batch loss without touching gradients or parameters.
pub fn evaluate(model: &Mlp, batch: &Batch) -> Result<f64> {
    let mut tape = Tape::new();
    let bind = model.bind(&mut tape);
    let x = tape.leaf(batch.images.clone());
    let log_probs = model.forward(&mut tape, &bind, x)?;
    let loss = ops::nll_mean(&mut tape, log_probs, &batch.labels)?;
    Ok(tape.value(loss).data[0])
}

/// Runs one full training step on `batch` and returns its loss.
///
/// Sequence: forward + loss, reset gradients, backward + accumulate, SGD
/// update. The reset runs *before* backward so nothing from an earlier batch
/// leaks into this one.
pub fn train_step(model: &mut Mlp, batch: &Batch, opt: &Sgd) -> Result<f64> {
    let mut tape = Tape::new();
    let bind = model.bind(&mut tape);
    let x = tape.leaf(batch.images.clone());
    let log_probs = model.forward(&mut tape, &bind, x)?;
    let loss = ops::nll_mean(&mut tape, log_probs, &batch.labels)?;
    let loss_value = tape.value(loss).data[0];

    model.reset_grads();
    let mut grads = tape.backward(loss)?;
    model.accumulate(&bind, &mut grads)?;
    opt.step(model)?;

    Ok(loss_value)
}

/// Trains for a fixed number of epochs, reporting the mean batch loss of
/// each epoch.
///
/// # Errors
/// [`Error::InvalidConfig`] for zero epochs or an empty dataset; any step
/// failure propagates immediately.
pub fn train(model: &mut Mlp, loader: &mut Loader, cfg: &TrainConfig) -> Result<TrainReport> {
    if cfg.epochs == 0 {
        return Err(Error::InvalidConfig("epochs must be > 0".into()));
    }
    if loader.is_empty() {
        return Err(Error::InvalidConfig("dataset must not be empty".into()));
    }
    let opt = Sgd::new(cfg.lr)?;

    let mut epoch_losses = Vec::with_capacity(cfg.epochs);
    for epoch in 1..=cfg.epochs {
        let mut total = 0.0;
        let mut batches = 0usize;
        for batch in loader.epoch() {
            total += train_step(model, &batch, &opt)?;
            batches += 1;
        }
        let mean = total / batches as f64;
        info!("epoch {epoch}/{}: mean loss {mean:.6}", cfg.epochs);
        epoch_losses.push(mean);
    }

    Ok(TrainReport { epoch_losses })
}
