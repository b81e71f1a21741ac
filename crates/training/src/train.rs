//! Epoch-driven training loop with checkpoint-on-improvement and resume.

use std::fs;
use std::path::{Path, PathBuf};

use burn::lr_scheduler::{
    cosine::{CosineAnnealingLrScheduler, CosineAnnealingLrSchedulerConfig},
    linear::{LinearLrScheduler, LinearLrSchedulerConfig},
    LrScheduler,
};
use burn::module::{AutodiffModule, Module};
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::{backend::Backend, Int, Tensor};
use clap::Parser;
use models::{TerrainSegNet, TerrainSegNetConfig};
use seg_dataset::{BatchIter, LoaderConfig, SampleSet};
use serde::{Deserialize, Serialize};

use crate::metric::mean_iou;
use crate::{AutodiffSegBackend, SegBackend};

/// Checkpoint filename inside the checkpoint directory. At most one
/// checkpoint exists per model slot; it always holds the best-by-val-loss
/// parameters seen across all runs against that directory.
pub const CHECKPOINT_FILE: &str = "best_model.bin";

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the terrain segmentation model (resumes from the best checkpoint)")]
pub struct TrainArgs {
    /// Training images directory.
    #[arg(long, default_value = "data/train/images")]
    pub train_images: String,
    /// Training masks directory.
    #[arg(long, default_value = "data/train/masks")]
    pub train_masks: String,
    /// Validation images directory.
    #[arg(long, default_value = "data/val/images")]
    pub val_images: String,
    /// Validation masks directory.
    #[arg(long, default_value = "data/val/masks")]
    pub val_masks: String,
    /// Batch size (training and validation).
    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,
    /// Number of epochs.
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,
    /// Starting learning rate.
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,
    /// Ending learning rate for the schedule.
    #[arg(long, default_value_t = 1e-5)]
    pub lr_end: f64,
    /// Scheduler type: linear or cosine (stepped once per epoch).
    #[arg(long, default_value = "linear", value_parser = ["linear", "cosine"])]
    pub scheduler: String,
    /// Optional shuffle seed for deterministic batching.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Checkpoint directory.
    #[arg(long, default_value = "checkpoints")]
    pub ckpt_dir: String,
    /// Also report mean IoU on the validation set each epoch.
    #[arg(long, default_value_t = false)]
    pub monitor_iou: bool,
}

/// Improvement baseline persisted next to the checkpoint, so a resumed run
/// keeps the prior best validation loss instead of resetting to infinity
/// and risking an overwrite of a better checkpoint with a worse one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestState {
    pub best_val_loss: f32,
    pub epoch: usize,
}

impl BestState {
    pub fn load(path: &Path) -> Option<Self> {
        let raw = fs::read(path).ok()?;
        serde_json::from_slice(&raw).ok()
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

enum Scheduler {
    Linear(LinearLrScheduler),
    Cosine(CosineAnnealingLrScheduler),
}

fn scheduler_step(s: &mut Scheduler) -> f64 {
    match s {
        Scheduler::Linear(inner) => LrScheduler::<AutodiffSegBackend>::step(inner),
        Scheduler::Cosine(inner) => LrScheduler::<AutodiffSegBackend>::step(inner),
    }
}

/// Per-pixel cross-entropy over raw class logits `[B, C, H, W]` against
/// class-index targets `[B, H, W]`.
pub(crate) fn per_pixel_loss<B: Backend>(
    logits: Tensor<B, 4>,
    targets: Tensor<B, 3, Int>,
    device: &B::Device,
) -> Tensor<B, 1> {
    let [b, c, h, w] = logits.dims();
    let flat = logits.permute([0, 2, 3, 1]).reshape([b * h * w, c]);
    let targets = targets.reshape([b * h * w]);
    CrossEntropyLossConfig::new()
        .init(device)
        .forward(flat, targets)
}

fn loss_scalar<B: Backend>(loss: &Tensor<B, 1>) -> f32 {
    loss.to_data()
        .to_vec::<f32>()
        .unwrap_or_default()
        .first()
        .copied()
        .unwrap_or(0.0)
}

pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let device = <AutodiffSegBackend as Backend>::Device::default();

    let train_set = SampleSet::new(&args.train_images, Some(PathBuf::from(&args.train_masks)))?;
    let val_set = SampleSet::new(&args.val_images, Some(PathBuf::from(&args.val_masks)))?;
    if train_set.is_empty() {
        println!("No training samples found under {}", args.train_images);
        return Ok(());
    }
    let num_classes = train_set.num_classes();

    let mut model = TerrainSegNet::<AutodiffSegBackend>::new(
        TerrainSegNetConfig {
            num_classes,
            ..Default::default()
        },
        &device,
    );

    fs::create_dir_all(&args.ckpt_dir)?;
    let ckpt_path = Path::new(&args.ckpt_dir).join(CHECKPOINT_FILE);
    let state_path = ckpt_path.with_extension("json");
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();

    let mut best_val_loss = f32::INFINITY;
    if ckpt_path.exists() {
        model = model.load_file(&ckpt_path, &recorder, &device).map_err(|e| {
            anyhow::anyhow!(
                "checkpoint at {} does not match the model: {e}",
                ckpt_path.display()
            )
        })?;
        println!("Loaded previous best model. Continuing training...");
        if let Some(state) = BestState::load(&state_path) {
            best_val_loss = state.best_val_loss;
        }
    }

    let mut optim = AdamConfig::new().init();
    let mut scheduler = match args.scheduler.as_str() {
        "cosine" => Scheduler::Cosine(
            CosineAnnealingLrSchedulerConfig::new(args.lr, args.epochs.max(1))
                .with_min_lr(args.lr_end)
                .init(),
        ),
        _ => Scheduler::Linear(
            LinearLrSchedulerConfig::new(args.lr, args.lr_end, args.epochs.max(1)).init(),
        ),
    };
    let mut lr = args.lr;

    for epoch in 0..args.epochs {
        println!("\nEpoch {}/{}", epoch + 1, args.epochs);

        let train_cfg = LoaderConfig {
            shuffle: true,
            drop_last: true,
            seed: args.seed.map(|s| s.wrapping_add(epoch as u64)),
        };
        let mut train_iter = BatchIter::new(&train_set, train_cfg);
        let mut train_loss = 0.0f32;
        let mut train_batches = 0usize;
        while let Some(batch) = train_iter.next_batch::<AutodiffSegBackend>(args.batch_size, &device)? {
            let masks = batch
                .masks
                .ok_or_else(|| anyhow::anyhow!("training batch has no masks"))?;
            let logits = model.forward(batch.images);
            let loss = per_pixel_loss(logits, masks, &device);
            train_loss += loss_scalar(&loss);
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);
            train_batches += 1;
        }
        if train_batches == 0 {
            anyhow::bail!(
                "no training batches: need at least {} samples when dropping incomplete batches",
                args.batch_size
            );
        }
        println!("Train Loss: {:.4}", train_loss / train_batches as f32);

        let vmodel = model.valid();
        let val_cfg = LoaderConfig {
            shuffle: false,
            drop_last: true,
            seed: None,
        };
        let mut val_iter = BatchIter::new(&val_set, val_cfg);
        let mut val_loss = 0.0f32;
        let mut iou_sum = 0.0f32;
        let mut val_batches = 0usize;
        while let Some(batch) = val_iter.next_batch::<SegBackend>(args.batch_size, &device)? {
            let masks = batch
                .masks
                .ok_or_else(|| anyhow::anyhow!("validation batch has no masks"))?;
            let logits = vmodel.forward(batch.images);
            if args.monitor_iou {
                iou_sum += mean_iou(&logits, &masks, vmodel.config.num_classes);
            }
            let loss = per_pixel_loss(logits, masks, &device);
            val_loss += loss_scalar(&loss);
            val_batches += 1;
        }
        if val_batches == 0 {
            anyhow::bail!(
                "no validation batches: need at least {} samples when dropping incomplete batches",
                args.batch_size
            );
        }
        let val_loss = val_loss / val_batches as f32;
        println!("Val Loss: {:.4}", val_loss);
        if args.monitor_iou {
            println!("Val Mean IoU: {:.4}", iou_sum / val_batches as f32);
        }

        lr = scheduler_step(&mut scheduler);

        if val_loss < best_val_loss {
            best_val_loss = val_loss;
            model
                .clone()
                .save_file(&ckpt_path, &recorder)
                .map_err(|e| anyhow::anyhow!("failed to save checkpoint: {e}"))?;
            BestState {
                best_val_loss,
                epoch: epoch + 1,
            }
            .save(&state_path)?;
            println!("Model Saved!");
        }
    }

    Ok(())
}
