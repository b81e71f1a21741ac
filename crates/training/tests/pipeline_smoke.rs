use burn::tensor::backend::Backend;
use image::{GrayImage, Luma, Rgb, RgbImage};
use models::{TerrainSegNet, TerrainSegNetConfig};
use seg_dataset::{BatchIter, LoaderConfig, SampleSet};
use std::fs;
use std::path::Path;
use training::{mean_iou, SegBackend};

fn synthetic_pair(root: &Path, name: &str) {
    let images = root.join("images");
    let masks = root.join("masks");
    fs::create_dir_all(&images).unwrap();
    fs::create_dir_all(&masks).unwrap();
    let img = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 64]));
    img.save(images.join(name)).unwrap();
    // Left half sand (raw 0), right half rock (raw 27).
    let mask = GrayImage::from_fn(32, 32, |x, _y| Luma([if x < 16 { 0 } else { 27 }]));
    mask.save(masks.join(name)).unwrap();
}

#[test]
fn forward_pass_from_directories_to_metric() {
    let tmp = tempfile::tempdir().unwrap();
    synthetic_pair(tmp.path(), "frame_00001.png");

    let set = SampleSet::new(tmp.path().join("images"), Some(tmp.path().join("masks"))).unwrap();
    assert_eq!(set.len(), 1);

    let device = <SegBackend as Backend>::Device::default();
    let mut iter = BatchIter::new(
        &set,
        LoaderConfig {
            shuffle: false,
            drop_last: false,
            seed: None,
        },
    );
    let batch = iter.next_batch::<SegBackend>(1, &device).unwrap().unwrap();
    assert_eq!(batch.images.dims(), [1, 3, 512, 512]);
    let masks = batch.masks.expect("mask mode");
    assert_eq!(masks.dims(), [1, 512, 512]);

    let model = TerrainSegNet::<SegBackend>::new(
        TerrainSegNetConfig {
            base_channels: 4,
            num_classes: set.num_classes(),
        },
        &device,
    );
    let logits = model.forward(batch.images);
    assert_eq!(logits.dims(), [1, 6, 512, 512]);

    let score = mean_iou(&logits, &masks, model.config.num_classes);
    assert!((0.0..=1.0).contains(&score));
}
