//! Batch iteration over a sample set for training and validation.

use crate::provider::{SampleSet, TARGET_SIDE};
use crate::types::{DatasetResult, SegSample};
use burn::tensor::{backend::Backend, Int, Tensor, TensorData};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Shuffle sample order once, at iterator construction.
    pub shuffle: bool,
    /// Drop an incomplete trailing batch (deterministic batch counts).
    pub drop_last: bool,
    /// Seed for reproducible shuffling; entropy-seeded when `None`.
    pub seed: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            shuffle: true,
            drop_last: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SegBatch<B: Backend> {
    /// Images, shape `[batch, 3, 512, 512]`, values in [0, 1].
    pub images: Tensor<B, 4>,
    /// Class-index targets, shape `[batch, 512, 512]`; `None` in image-only mode.
    pub masks: Option<Tensor<B, 3, Int>>,
}

pub struct BatchIter<'a> {
    set: &'a SampleSet,
    order: Vec<usize>,
    cursor: usize,
    drop_last: bool,
}

impl<'a> BatchIter<'a> {
    pub fn new(set: &'a SampleSet, cfg: LoaderConfig) -> Self {
        let mut order: Vec<usize> = (0..set.len()).collect();
        if cfg.shuffle {
            let mut rng = match cfg.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            order.shuffle(&mut rng);
        }
        Self {
            set,
            order,
            cursor: 0,
            drop_last: cfg.drop_last,
        }
    }

    /// Load and pack the next batch, or `None` when the pass is exhausted.
    ///
    /// Samples are decoded in parallel but packed in iteration order, so
    /// batch composition never depends on load timing. Any sample error
    /// aborts the batch.
    pub fn next_batch<B: Backend>(
        &mut self,
        batch_size: usize,
        device: &B::Device,
    ) -> DatasetResult<Option<SegBatch<B>>> {
        let batch_size = batch_size.max(1);
        let start = self.cursor;
        if start >= self.order.len() {
            return Ok(None);
        }
        let end = (start + batch_size).min(self.order.len());
        if self.drop_last && end - start < batch_size {
            self.cursor = self.order.len();
            return Ok(None);
        }
        let indices: Vec<usize> = self.order[start..end].to_vec();
        self.cursor = end;

        let set = self.set;
        let mut loaded: Vec<(usize, DatasetResult<SegSample>)> = indices
            .par_iter()
            .enumerate()
            .map(|(i, &idx)| (i, set.get(idx)))
            .collect();
        loaded.sort_by_key(|(i, _)| *i);

        let side = TARGET_SIDE as usize;
        let n = loaded.len();
        let mut images_buf: Vec<f32> = Vec::with_capacity(n * 3 * side * side);
        let mut masks_buf: Vec<i32> = Vec::with_capacity(if set.has_masks() {
            n * side * side
        } else {
            0
        });
        for (_i, res) in loaded {
            let sample = res?;
            images_buf.extend_from_slice(&sample.image_chw);
            if let Some(mask) = sample.mask {
                masks_buf.extend_from_slice(&mask);
            }
        }

        let images = Tensor::<B, 1>::from_floats(images_buf.as_slice(), device)
            .reshape([n, 3, side, side]);
        let masks = if set.has_masks() {
            Some(Tensor::<B, 3, Int>::from_data(
                TensorData::new(masks_buf, [n, side, side]).convert::<B::IntElem>(),
                device,
            ))
        } else {
            None
        };

        Ok(Some(SegBatch { images, masks }))
    }
}
