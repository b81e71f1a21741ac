//! Core types and error definitions for seg_dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, SegDataError>;

#[derive(Debug, Error)]
pub enum SegDataError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("mask file missing for image {image}: expected {mask}")]
    MissingMask { image: PathBuf, mask: PathBuf },
    #[error("unknown raw label value {value} in mask {path}")]
    UnknownLabel { path: PathBuf, value: u8 },
    #[error("sample index {index} out of bounds for set of {len}")]
    BadIndex { index: usize, len: usize },
}

#[derive(Debug, Clone)]
pub struct SegSample {
    /// Image in CHW layout, normalized to [0, 1].
    pub image_chw: Vec<f32>,
    /// Dense class indices, row-major; `None` when the set has no masks directory.
    pub mask: Option<Vec<i32>>,
}
