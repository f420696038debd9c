//! Saving and loading of model weights.
//!
//! # `.tnet` Weight File Format
//!
//! A `.tnet` file stores one or more tensors:
//!
//! ```text
//! ┌────────────┬────────────┬─────────────────────┐
//! │ Header     │ Tensor N   │ Tensor N+1 …        │
//! ├────────────┼────────────┼─────────────────────┤
//! │ "tnet"[4]  │ u64: ndim  │ u64: ndim           │
//! │ u8: count  │ [u64; ndim] shape                │
//! │            │ [f64; prod(shape)] data          │
//! └────────────┴──────────────────────────────────┘
//! ```
//!
//! Little-endian throughout. No compression, no per-tensor metadata; at most
//! 255 tensors per file.
//!
//! # Example
//!
//! ```rust
//! use tapenet::tensors::Tensor;
//! use tapenet::modelio::{save_weights, load_weights};
//!
//! # fn main() -> tapenet::Result<()> {
//! let tensor = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
//! let path = std::env::temp_dir().join("tapenet_doc.tnet");
//! save_weights(path.to_str().unwrap(), &[tensor.clone()])?;
//! let loaded = load_weights(path.to_str().unwrap())?;
//! assert_eq!(loaded, vec![tensor]);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use crate::error::{Error, Result};
use crate::tensors::{Ten64, Tensor};

const TNET_MAGIC: &[u8; 4] = b"tnet";

/// Writes a list of tensors to `path`.
///
/// # Errors
/// I/O failures, or [`Error::InvalidConfig`] for more than 255 tensors.
pub fn save_weights(path: &str, tensors: &[Ten64]) -> Result<()> {
    if tensors.len() > 255 {
        return Err(Error::InvalidConfig(format!(
            "at most 255 tensors per file, got {}",
            tensors.len()
        )));
    }
    let mut file = BufWriter::new(File::create(path)?);

    file.write_all(TNET_MAGIC)?;
    file.write_all(&[tensors.len() as u8])?;

    for tensor in tensors {
        let ndim = tensor.shape.len() as u64;
        file.write_all(&ndim.to_le_bytes())?;
        for &dim in &tensor.shape {
            file.write_all(&(dim as u64).to_le_bytes())?;
        }
        for &val in &tensor.data {
            file.write_all(&val.to_le_bytes())?;
        }
    }
    file.flush()?;

    Ok(())
}

/// Reads a `.tnet` file back into a list of tensors.
///
/// # Errors
/// I/O failures, or [`Error::BadModelFile`] for a wrong magic header or a
/// truncated/oversized payload.
pub fn load_weights(path: &str) -> Result<Vec<Ten64>> {
    let mut file = BufReader::new(File::open(path)?);
    let mut buf8 = [0u8; 8];

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != TNET_MAGIC {
        return Err(Error::BadModelFile("invalid magic header"));
    }

    let mut count = [0u8; 1];
    file.read_exact(&mut count)?;
    let count = count[0] as usize;

    let mut tensors = Vec::with_capacity(count);
    for _ in 0..count {
        file.read_exact(&mut buf8)?;
        let ndim = u64::from_le_bytes(buf8) as usize;

        let mut shape = Vec::with_capacity(ndim);
        for _ in 0..ndim {
            file.read_exact(&mut buf8)?;
            let dim = u64::from_le_bytes(buf8);
            let dim = usize::try_from(dim).map_err(|_| Error::BadModelFile("dimension overflow"))?;
            shape.push(dim);
        }

        let size = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        let size = size.ok_or(Error::BadModelFile("tensor size overflow"))?;

        let mut data = Vec::with_capacity(size);
        for _ in 0..size {
            file.read_exact(&mut buf8)?;
            data.push(f64::from_le_bytes(buf8));
        }
        tensors.push(Tensor::new(shape, data));
    }

    Ok(tensors)
}
