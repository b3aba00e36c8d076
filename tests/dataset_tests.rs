use std::fs;
use std::path::Path;
use std::sync::Arc;

use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use image::{Rgb, RgbImage};
use tempfile::tempdir;

use burn_texture_cvae::{ShuffledLoader, TextureFolderDataset};

type InferBackend = NdArray<f32>;

fn write_png(path: &Path, size: u32, color: [u8; 3]) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create class dir");
    RgbImage::from_pixel(size, size, Rgb(color))
        .save(path)
        .expect("write png");
}

#[test]
fn classes_are_sorted_directory_names() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    write_png(&root.join("stone/a.png"), 16, [128, 128, 128]);
    write_png(&root.join("dirt/a.png"), 12, [120, 80, 40]);
    write_png(&root.join("dirt/deep/b.png"), 20, [100, 60, 30]);
    write_png(&root.join("grass_top/a.png"), 8, [30, 160, 40]);
    fs::write(root.join("dirt/notes.txt"), "not an image").expect("write");
    fs::write(root.join("README.md"), "ignored").expect("write");

    let dataset = TextureFolderDataset::open(root, 8).expect("open dataset");
    assert_eq!(dataset.classes(), ["dirt", "grass_top", "stone"]);
    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.class_counts(), vec![2, 1, 1]);
}

#[test]
fn images_are_resized_and_scaled() {
    let dir = tempdir().expect("tempdir");
    write_png(&dir.path().join("red/big.png"), 24, [255, 0, 0]);

    let dataset = TextureFolderDataset::open(dir.path(), 8).expect("open dataset");
    let item = dataset.get(0).expect("item");
    assert_eq!(item.label, 0);
    assert_eq!(item.pixels.len(), 3 * 8 * 8);

    let plane = 8 * 8;
    assert!(item.pixels[..plane].iter().all(|&v| (v - 1.0).abs() < 1e-3));
    assert!(item.pixels[plane..].iter().all(|&v| v.abs() < 1e-3));
}

#[test]
fn empty_layouts_are_errors() {
    let dir = tempdir().expect("tempdir");
    assert!(TextureFolderDataset::open(dir.path(), 8).is_err());

    fs::create_dir_all(dir.path().join("dirt")).expect("create");
    let err = TextureFolderDataset::open(dir.path(), 8).expect_err("class without images");
    assert!(format!("{err:#}").contains("contains no images"));

    assert!(TextureFolderDataset::open(dir.path().join("missing"), 8).is_err());
}

#[test]
fn loader_covers_every_item_once_per_epoch() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    write_png(&root.join("a/1.png"), 8, [10, 10, 10]);
    write_png(&root.join("a/2.png"), 8, [20, 20, 20]);
    write_png(&root.join("b/1.png"), 8, [30, 30, 30]);
    write_png(&root.join("c/1.png"), 8, [40, 40, 40]);
    write_png(&root.join("c/2.png"), 8, [50, 50, 50]);

    let dataset = Arc::new(TextureFolderDataset::open(root, 8).expect("open dataset"));
    let mut loader = ShuffledLoader::new(dataset, 2, Some(3));
    assert_eq!(loader.batches_per_epoch(), 3);

    let device = <InferBackend as Backend>::Device::default();
    for _ in 0..2 {
        let mut labels = Vec::new();
        let mut sizes = Vec::new();
        for batch in loader.epoch::<InferBackend>(&device) {
            let [count, channels, height, width] = batch.images.dims();
            assert_eq!([channels, height, width], [3, 8, 8]);
            assert_eq!(batch.conditions.dims(), [count, 3]);

            let rows = batch
                .conditions
                .to_data()
                .convert::<f32>()
                .into_vec::<f32>()
                .expect("conditions");
            for (row, &label) in rows.chunks(3).zip(&batch.labels) {
                let mut expected = vec![0.0; 3];
                expected[label] = 1.0;
                assert_eq!(row, expected.as_slice());
            }

            sizes.push(count);
            labels.extend(batch.labels);
        }
        labels.sort();
        assert_eq!(labels, vec![0, 0, 1, 2, 2]);
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
