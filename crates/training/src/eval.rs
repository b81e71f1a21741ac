//! Offline evaluation of a persisted checkpoint by mean IoU.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use clap::Parser;
use models::{TerrainSegNet, TerrainSegNetConfig};
use seg_dataset::{BatchIter, LoaderConfig, SampleSet};

use crate::metric::mean_iou;
use crate::SegBackend;

#[derive(Parser, Debug)]
#[command(name = "eval", about = "Evaluate a terrain segmentation checkpoint (mean IoU over the validation set)")]
pub struct EvalArgs {
    /// Validation images directory.
    #[arg(long, default_value = "data/val/images")]
    pub val_images: String,
    /// Validation masks directory.
    #[arg(long, default_value = "data/val/masks")]
    pub val_masks: String,
    /// Batch size (must match training for a comparable score).
    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,
    /// Checkpoint path to load.
    #[arg(long, default_value = "checkpoints/best_model.bin")]
    pub checkpoint: String,
}

pub fn run_eval(args: EvalArgs) -> anyhow::Result<()> {
    let device = <SegBackend as Backend>::Device::default();

    let val_set = SampleSet::new(&args.val_images, Some(PathBuf::from(&args.val_masks)))?;
    if val_set.is_empty() {
        anyhow::bail!("no validation samples under {}", args.val_images);
    }
    let num_classes = val_set.num_classes();

    let ckpt_path = Path::new(&args.checkpoint);
    if !ckpt_path.exists() {
        anyhow::bail!("checkpoint {} not found; train first", ckpt_path.display());
    }
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    let model = TerrainSegNet::<SegBackend>::new(
        TerrainSegNetConfig {
            num_classes,
            ..Default::default()
        },
        &device,
    )
    .load_file(ckpt_path, &recorder, &device)
    .map_err(|e| {
        anyhow::anyhow!(
            "checkpoint {} does not match the model: {e}",
            ckpt_path.display()
        )
    })?;

    // Full pass over the validation set, trailing batch included.
    let mut iter = BatchIter::new(
        &val_set,
        LoaderConfig {
            shuffle: false,
            drop_last: false,
            seed: None,
        },
    );
    let mut total_iou = 0.0f32;
    let mut batches = 0usize;
    while let Some(batch) = iter.next_batch::<SegBackend>(args.batch_size, &device)? {
        let masks = batch
            .masks
            .ok_or_else(|| anyhow::anyhow!("validation batch has no masks"))?;
        let logits = model.forward(batch.images);
        total_iou += mean_iou(&logits, &masks, model.config.num_classes);
        batches += 1;
    }
    if batches == 0 {
        anyhow::bail!("no validation batches under {}", args.val_images);
    }

    println!(
        "\nFinal Mean IoU (Validation Set): {:.4}",
        total_iou / batches as f32
    );
    Ok(())
}
