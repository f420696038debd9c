//! In-memory dataset and batching loader.
//!
//! A [`Dataset`] owns normalized image rows and their integer labels; a
//! [`Loader`] hands them out in fixed-size [`Batch`]es, optionally
//! reshuffling the visit order at the start of every epoch. Normalization is
//! a fixed affine rescale applied once at construction, so the model only
//! ever sees prepared vectors.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::tensors::Ten64;

/// Flattened images paired with integer class labels.
pub struct Dataset {
    pixels: Vec<f64>,
    labels: Vec<usize>,
    dim: usize,
}

impl Dataset {
    /// Builds a dataset from per-image vectors.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] if the counts disagree, the rows are ragged,
    /// or the image dimension is zero.
    pub fn from_vectors(images: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(Error::InvalidConfig(format!(
                "{} images but {} labels",
                images.len(),
                labels.len()
            )));
        }
        let dim = images.first().map_or(0, Vec::len);
        if dim == 0 {
            return Err(Error::InvalidConfig("image dimension must be > 0".into()));
        }
        let mut pixels = Vec::with_capacity(images.len() * dim);
        for image in &images {
            if image.len() != dim {
                return Err(Error::InvalidConfig(format!(
                    "ragged image rows: expected {dim}, got {}",
                    image.len()
                )));
            }
            pixels.extend_from_slice(image);
        }
        Ok(Self {
            pixels,
            labels,
            dim,
        })
    }

    /// Builds a dataset from raw pixel bytes, applying the affine rescale
    /// `pixel * scale + shift` to every intensity.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] if the byte count is not `labels.len() * dim`.
    pub fn from_bytes(
        raw: &[u8],
        dim: usize,
        labels: Vec<usize>,
        scale: f64,
        shift: f64,
    ) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("image dimension must be > 0".into()));
        }
        if raw.len() != labels.len() * dim {
            return Err(Error::InvalidConfig(format!(
                "{} pixel bytes cannot form {} images of dim {dim}",
                raw.len(),
                labels.len()
            )));
        }
        let pixels = raw.iter().map(|&p| f64::from(p) * scale + shift).collect();
        Ok(Self {
            pixels,
            labels,
            dim,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Width of each flattened image.
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.pixels[i * self.dim..(i + 1) * self.dim]
    }
}

/// One training step's worth of data.
pub struct Batch {
    /// `[batch, dim]` image tensor.
    pub images: Ten64,
    /// One class index per row.
    pub labels: Vec<usize>,
}

/// Iterates a dataset in fixed-size batches, one epoch at a time.
pub struct Loader {
    data: Dataset,
    batch_size: usize,
    order: Vec<usize>,
    rng: Option<StdRng>,
}

impl Loader {
    /// # Errors
    /// [`Error::InvalidConfig`] if `batch_size` is zero.
    pub fn new(data: Dataset, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be > 0".into()));
        }
        let order = (0..data.len()).collect();
        Ok(Self {
            data,
            batch_size,
            order,
            rng: None,
        })
    }

    /// Enables per-epoch reshuffling with a fixed seed.
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Batches per epoch (last one may be short).
    pub fn num_batches(&self) -> usize {
        self.data.len().div_ceil(self.batch_size)
    }

    /// Starts a new epoch: reshuffles if enabled, then yields every batch
    /// once, in order.
    pub fn epoch(&mut self) -> impl Iterator<Item = Batch> + '_ {
        if let Some(rng) = &mut self.rng {
            self.order.shuffle(rng);
        }
        let data = &self.data;
        self.order.chunks(self.batch_size).map(move |chunk| {
            let mut images = Vec::with_capacity(chunk.len() * data.dim);
            let mut labels = Vec::with_capacity(chunk.len());
            for &i in chunk {
                images.extend_from_slice(data.row(i));
                labels.push(data.labels[i]);
            }
            Batch {
                images: Ten64::new(vec![chunk.len(), data.dim], images),
                labels,
            }
        })
    }
}
