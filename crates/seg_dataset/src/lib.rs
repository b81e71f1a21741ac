//! Dataset loading, label remapping, and batching for desert terrain
//! segmentation.
//!
//! This crate provides:
//! - A fixed raw-to-dense label mapping for mask pixel values
//! - Index-addressable sample loading from an image/mask directory pair
//! - Burn-compatible batch iteration with shuffling and drop-last semantics

pub mod batch;
pub mod provider;
pub mod remap;
pub mod types;

pub use batch::{BatchIter, LoaderConfig, SegBatch};
pub use provider::{SampleSet, TARGET_SIDE};
pub use remap::LabelMap;
pub use types::{DatasetResult, SegDataError, SegSample};
