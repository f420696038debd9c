//! End-to-end demo: download the MNIST digit files, train the classifier
//! for a few epochs, visualize one prediction, and save the weights.
//!
//! Run with `cargo run --bin mnist --features mnist --release`.

use std::error::Error;
use std::fs::{File, create_dir_all};
use std::io::{Read, copy};
use std::path::Path;

use flate2::read::GzDecoder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::blocking::get;

use tapenet::data::{Dataset, Loader};
use tapenet::model::Mlp;
use tapenet::modelio::save_weights;
use tapenet::tensors::Tensor;
use tapenet::train::{TrainConfig, train};
use tapenet::viz::render_prediction;

const TRAIN_IMAGES_URL: &str =
    "https://storage.googleapis.com/cvdf-datasets/mnist/train-images-idx3-ubyte.gz";
const TRAIN_LABELS_URL: &str =
    "https://storage.googleapis.com/cvdf-datasets/mnist/train-labels-idx1-ubyte.gz";

fn download_and_extract(url: &str, output_path: &str) -> Result<(), Box<dyn Error>> {
    let resp = get(url)?;
    if !resp.status().is_success() {
        return Err(format!("failed to download {url}: HTTP {}", resp.status()).into());
    }
    let mut decoder = GzDecoder::new(resp);
    let mut out = File::create(output_path)?;
    copy(&mut decoder, &mut out)?;
    Ok(())
}

fn read_file(path: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut buf = Vec::new();
    File::open(path)?.read_to_end(&mut buf)?;
    Ok(buf)
}

/// IDX image file: magic, count, rows, cols, then raw pixels.
fn load_images(path: &str) -> Result<(Vec<u8>, usize, usize), Box<dyn Error>> {
    let buf = read_file(path)?;
    if buf[0..4] != [0, 0, 8, 3] {
        return Err("bad image file magic".into());
    }
    let count = u32::from_be_bytes(buf[4..8].try_into()?) as usize;
    let rows = u32::from_be_bytes(buf[8..12].try_into()?) as usize;
    let cols = u32::from_be_bytes(buf[12..16].try_into()?) as usize;
    Ok((buf[16..16 + count * rows * cols].to_vec(), rows, cols))
}

/// IDX label file: magic, count, then one byte per label.
fn load_labels(path: &str) -> Result<Vec<usize>, Box<dyn Error>> {
    let buf = read_file(path)?;
    if buf[0..4] != [0, 0, 8, 1] {
        return Err("bad label file magic".into());
    }
    let count = u32::from_be_bytes(buf[4..8].try_into()?) as usize;
    Ok(buf[8..8 + count].iter().map(|&b| b as usize).collect())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    create_dir_all("mnist_data")?;
    if !Path::new("mnist_data/train-images-idx3-ubyte").exists() {
        println!("Downloading MNIST dataset...");
        download_and_extract(TRAIN_IMAGES_URL, "mnist_data/train-images-idx3-ubyte")?;
        download_and_extract(TRAIN_LABELS_URL, "mnist_data/train-labels-idx1-ubyte")?;
    }

    let (pixels, rows, cols) = load_images("mnist_data/train-images-idx3-ubyte")?;
    let labels = load_labels("mnist_data/train-labels-idx1-ubyte")?;
    let dim = rows * cols;

    // subset keeps the demo quick on a laptop
    let n_samples = 10_000.min(labels.len());
    let dataset = Dataset::from_bytes(
        &pixels[..n_samples * dim],
        dim,
        labels[..n_samples].to_vec(),
        1.0 / 255.0,
        0.0,
    )?;

    let mut rng = StdRng::seed_from_u64(0);
    let mut model = Mlp::new(dim, 128, 64, 10, &mut rng);
    let mut loader = Loader::new(dataset, 64)?.shuffled(0);

    let cfg = TrainConfig {
        epochs: 3,
        lr: 0.05,
    };
    let report = train(&mut model, &mut loader, &cfg)?;
    for (epoch, loss) in report.epoch_losses.iter().enumerate() {
        println!("epoch {}: mean loss {loss:.6}", epoch + 1);
    }

    // show the model's opinion of the first training image
    let sample = Tensor::new(
        vec![1, dim],
        pixels[..dim].iter().map(|&p| f64::from(p) / 255.0).collect(),
    );
    let log_probs = model.predict(&sample)?;
    let image = Tensor::new(vec![dim], sample.data.clone());
    println!("{}", render_prediction(&image, cols, &log_probs.data)?);

    println!("Saving weights...");
    save_weights("mnist_model.tnet", &model.export_weights())?;

    Ok(())
}
