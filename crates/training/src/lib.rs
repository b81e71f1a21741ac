//! Training loop, evaluation runner, and mean-IoU metric for desert
//! terrain segmentation.

pub mod eval;
pub mod metric;
pub mod train;

pub use eval::{run_eval, EvalArgs};
pub use metric::mean_iou;
pub use train::{run_train, BestState, TrainArgs, CHECKPOINT_FILE};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type SegBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type SegBackend = burn::backend::ndarray::NdArray<f32>;

pub type AutodiffSegBackend = burn::backend::Autodiff<SegBackend>;
