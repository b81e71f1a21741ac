use image::{GrayImage, Luma, Rgb, RgbImage};
use seg_dataset::{BatchIter, LoaderConfig, SampleSet, SegDataError, TARGET_SIDE};
use std::fs;
use std::path::{Path, PathBuf};

/// Write one image/mask pair; the 2x2 mask holds `raw_vals` row-major, so
/// nearest-neighbor resizing keeps exactly those values per quadrant.
fn write_sample(root: &Path, name: &str, raw_vals: [u8; 4]) -> anyhow::Result<()> {
    let images = root.join("images");
    let masks = root.join("masks");
    fs::create_dir_all(&images)?;
    fs::create_dir_all(&masks)?;

    let seed = name.len() as u8;
    let img = RgbImage::from_fn(8, 6, |x, y| {
        Rgb([seed.wrapping_mul(37), (x * 30) as u8, (y * 40) as u8])
    });
    img.save(images.join(name))?;

    let mask = GrayImage::from_fn(2, 2, |x, y| Luma([raw_vals[(y * 2 + x) as usize]]));
    mask.save(masks.join(name))?;
    Ok(())
}

fn dirs(root: &Path) -> (PathBuf, PathBuf) {
    (root.join("images"), root.join("masks"))
}

#[test]
fn image_tensor_shape_and_range() {
    let tmp = tempfile::tempdir().unwrap();
    write_sample(tmp.path(), "a.png", [0, 1, 2, 3]).unwrap();
    let (images, masks) = dirs(tmp.path());

    let set = SampleSet::new(images, Some(masks)).unwrap();
    assert_eq!(set.len(), 1);
    let sample = set.get(0).unwrap();
    let side = TARGET_SIDE as usize;
    assert_eq!(sample.image_chw.len(), 3 * side * side);
    assert!(sample.image_chw.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn mask_values_are_dense_class_indices() {
    let tmp = tempfile::tempdir().unwrap();
    write_sample(tmp.path(), "a.png", [0, 1, 27, 39]).unwrap();
    let (images, masks) = dirs(tmp.path());

    let set = SampleSet::new(images, Some(masks)).unwrap();
    let mask = set.get(0).unwrap().mask.unwrap();
    let side = TARGET_SIDE as usize;
    assert_eq!(mask.len(), side * side);
    assert!(mask.iter().all(|v| (0..6).contains(v)));
    // Nearest-neighbor upscaling keeps the source quadrants intact.
    assert_eq!(mask[0], 0);
    assert_eq!(mask[side * side - 1], 5);
}

#[test]
fn missing_mask_is_fatal_for_that_access() {
    let tmp = tempfile::tempdir().unwrap();
    write_sample(tmp.path(), "a.png", [0, 0, 0, 0]).unwrap();
    let (images, masks) = dirs(tmp.path());
    fs::remove_file(masks.join("a.png")).unwrap();

    let set = SampleSet::new(images, Some(masks)).unwrap();
    assert!(matches!(
        set.get(0),
        Err(SegDataError::MissingMask { .. })
    ));
}

#[test]
fn unknown_raw_label_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    write_sample(tmp.path(), "a.png", [0, 7, 1, 2]).unwrap();
    let (images, masks) = dirs(tmp.path());

    let set = SampleSet::new(images, Some(masks)).unwrap();
    assert!(matches!(
        set.get(0),
        Err(SegDataError::UnknownLabel { value: 7, .. })
    ));
}

#[test]
fn image_only_mode_has_no_mask() {
    let tmp = tempfile::tempdir().unwrap();
    write_sample(tmp.path(), "a.png", [0, 0, 0, 0]).unwrap();
    let (images, _masks) = dirs(tmp.path());

    let set = SampleSet::new(images, None).unwrap();
    assert!(!set.has_masks());
    assert!(set.get(0).unwrap().mask.is_none());
}

#[test]
fn listing_is_sorted_at_construction() {
    let tmp = tempfile::tempdir().unwrap();
    write_sample(tmp.path(), "b.png", [0, 0, 0, 0]).unwrap();
    write_sample(tmp.path(), "a.png", [0, 0, 0, 0]).unwrap();
    write_sample(tmp.path(), "c.png", [0, 0, 0, 0]).unwrap();
    let (images, masks) = dirs(tmp.path());

    let set = SampleSet::new(images, Some(masks)).unwrap();
    assert_eq!(set.name(0), Some("a.png"));
    assert_eq!(set.name(1), Some("b.png"));
    assert_eq!(set.name(2), Some("c.png"));
}

#[test]
fn drop_last_controls_trailing_batch() {
    type B = burn::backend::ndarray::NdArray<f32>;
    let tmp = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png", "c.png", "d.png", "e.png"] {
        write_sample(tmp.path(), name, [0, 1, 2, 3]).unwrap();
    }
    let (images, masks) = dirs(tmp.path());
    let set = SampleSet::new(images, Some(masks)).unwrap();
    let device = Default::default();

    let mut dropped = BatchIter::new(
        &set,
        LoaderConfig {
            shuffle: false,
            drop_last: true,
            seed: None,
        },
    );
    let mut count = 0;
    while let Some(batch) = dropped.next_batch::<B>(2, &device).unwrap() {
        assert_eq!(batch.images.dims()[0], 2);
        count += 1;
    }
    assert_eq!(count, 2);

    let mut kept = BatchIter::new(
        &set,
        LoaderConfig {
            shuffle: false,
            drop_last: false,
            seed: None,
        },
    );
    let mut sizes = Vec::new();
    while let Some(batch) = kept.next_batch::<B>(2, &device).unwrap() {
        sizes.push(batch.images.dims()[0]);
    }
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[test]
fn seeded_shuffle_is_deterministic() {
    type B = burn::backend::ndarray::NdArray<f32>;
    let tmp = tempfile::tempdir().unwrap();
    for name in ["a.png", "bb.png", "ccc.png", "dddd.png"] {
        write_sample(tmp.path(), name, [0, 1, 2, 3]).unwrap();
    }
    let (images, masks) = dirs(tmp.path());
    let set = SampleSet::new(images, Some(masks)).unwrap();
    let device = Default::default();

    let cfg = LoaderConfig {
        shuffle: true,
        drop_last: true,
        seed: Some(7),
    };
    let first = BatchIter::new(&set, cfg.clone())
        .next_batch::<B>(2, &device)
        .unwrap()
        .unwrap();
    let second = BatchIter::new(&set, cfg)
        .next_batch::<B>(2, &device)
        .unwrap()
        .unwrap();
    let a = first.images.to_data().to_vec::<f32>().unwrap();
    let b = second.images.to_data().to_vec::<f32>().unwrap();
    assert_eq!(a, b);
}
