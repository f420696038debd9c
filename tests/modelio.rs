use std::io::Write;

use tapenet::Error;
use tapenet::modelio::{load_weights, save_weights};
use tapenet::tensors::Tensor;

fn temp_path(name: &str) -> String {
    std::env::temp_dir()
        .join(name)
        .to_str()
        .unwrap()
        .to_owned()
}

#[test]
fn test_save_and_load_round_trip() {
    let a = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let b = Tensor::new(vec![1, 4], vec![7.0, 8.0, 9.0, 10.0]);
    let original = vec![a, b];

    let path = temp_path("tapenet_round_trip.tnet");
    save_weights(&path, &original).unwrap();
    let loaded = load_weights(&path).unwrap();

    assert_eq!(original, loaded);
}

#[test]
fn test_load_rejects_bad_magic() {
    let path = temp_path("tapenet_bad_magic.tnet");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"nope\x01").unwrap();
    drop(file);

    assert!(matches!(
        load_weights(&path),
        Err(Error::BadModelFile("invalid magic header"))
    ));
}

#[test]
fn test_load_rejects_truncated_file() {
    let a = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    let path = temp_path("tapenet_truncated.tnet");
    save_weights(&path, &[a]).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

    assert!(matches!(load_weights(&path), Err(Error::Io(_))));
}

#[test]
fn test_scalar_and_empty_shapes_survive() {
    let scalar = Tensor::new(Vec::new(), vec![42.0]);
    let path = temp_path("tapenet_scalar.tnet");
    save_weights(&path, &[scalar.clone()]).unwrap();
    assert_eq!(load_weights(&path).unwrap(), vec![scalar]);
}
