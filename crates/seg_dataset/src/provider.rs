//! Index-addressable sample loading from an image/mask directory pair.

use crate::remap::LabelMap;
use crate::types::{DatasetResult, SegDataError, SegSample};
use image::imageops::FilterType;
use std::fs;
use std::path::PathBuf;

/// Side length every image and mask is resized to.
pub const TARGET_SIDE: u32 = 512;

/// An ordered collection of samples backed by a one-time directory listing.
///
/// Filenames are captured and sorted at construction, so `get` is a pure,
/// repeatable function of the index for the lifetime of the set. When a
/// masks directory is given, mask filenames must correspond 1:1 with image
/// filenames; a missing mask is an error at access time.
#[derive(Debug)]
pub struct SampleSet {
    images_dir: PathBuf,
    masks_dir: Option<PathBuf>,
    names: Vec<String>,
    labels: LabelMap,
}

impl SampleSet {
    pub fn new(images_dir: impl Into<PathBuf>, masks_dir: Option<PathBuf>) -> DatasetResult<Self> {
        let images_dir = images_dir.into();
        let entries = fs::read_dir(&images_dir).map_err(|e| SegDataError::Io {
            path: images_dir.clone(),
            source: e,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(Self {
            images_dir,
            masks_dir,
            names,
            labels: LabelMap::desert(),
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn has_masks(&self) -> bool {
        self.masks_dir.is_some()
    }

    pub fn num_classes(&self) -> usize {
        self.labels.num_classes()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Load the sample at `index`: decode, resize to 512x512, normalize.
    ///
    /// Images use a smooth (bilinear) filter; masks use nearest-neighbor
    /// only, since any smoothing filter invents fractional class values.
    pub fn get(&self, index: usize) -> DatasetResult<SegSample> {
        let name = self.names.get(index).ok_or(SegDataError::BadIndex {
            index,
            len: self.names.len(),
        })?;

        let img_path = self.images_dir.join(name);
        let img = image::open(&img_path)
            .map_err(|e| SegDataError::Image {
                path: img_path.clone(),
                source: e,
            })?
            .to_rgb8();
        let img = image::imageops::resize(&img, TARGET_SIDE, TARGET_SIDE, FilterType::Triangle);

        let side = TARGET_SIDE as usize;
        let mut image_chw = Vec::with_capacity(3 * side * side);
        for c in 0..3 {
            for y in 0..TARGET_SIDE {
                for x in 0..TARGET_SIDE {
                    let p = img.get_pixel(x, y);
                    image_chw.push(p[c] as f32 / 255.0);
                }
            }
        }

        let mask = match &self.masks_dir {
            Some(dir) => {
                let mask_path = dir.join(name);
                if !mask_path.exists() {
                    return Err(SegDataError::MissingMask {
                        image: img_path,
                        mask: mask_path,
                    });
                }
                let raw = image::open(&mask_path)
                    .map_err(|e| SegDataError::Image {
                        path: mask_path.clone(),
                        source: e,
                    })?
                    .to_luma8();
                let raw =
                    image::imageops::resize(&raw, TARGET_SIDE, TARGET_SIDE, FilterType::Nearest);
                let encoded = self
                    .labels
                    .remap(raw.as_raw())
                    .map_err(|value| SegDataError::UnknownLabel {
                        path: mask_path,
                        value,
                    })?;
                Some(encoded)
            }
            None => None,
        };

        Ok(SegSample { image_chw, mask })
    }
}
