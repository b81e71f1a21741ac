//! Burn segmentation model for desert terrain classification.
//!
//! `TerrainSegNet` is a compact conv encoder-decoder producing raw
//! per-pixel class logits:
//! - Input images: `[B, 3, H, W]`
//! - Output logits: `[B, num_classes, H, W]` (no output activation)
//!
//! The training and evaluation pipeline treats this as an opaque unit
//! exposing `forward`; any module with the same input/output contract can
//! take its place.

use burn::module::{Ignored, Module};
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::relu;
use burn::tensor::{backend::Backend, Tensor};

#[derive(Debug, Clone)]
pub struct TerrainSegNetConfig {
    pub base_channels: usize,
    pub num_classes: usize,
}

impl Default for TerrainSegNetConfig {
    fn default() -> Self {
        Self {
            base_channels: 32,
            num_classes: 6,
        }
    }
}

#[derive(Module, Debug)]
pub struct TerrainSegNet<B: Backend> {
    enc1: Conv2d<B>,
    enc2: Conv2d<B>,
    pool: MaxPool2d,
    up1: ConvTranspose2d<B>,
    up2: ConvTranspose2d<B>,
    head: Conv2d<B>,
    pub config: Ignored<TerrainSegNetConfig>,
}

impl<B: Backend> TerrainSegNet<B> {
    pub fn new(config: TerrainSegNetConfig, device: &B::Device) -> Self {
        let c = config.base_channels.max(1);
        let enc1 = Conv2dConfig::new([3, c], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let enc2 = Conv2dConfig::new([c, 2 * c], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let up1 = ConvTranspose2dConfig::new([2 * c, c], [2, 2])
            .with_stride([2, 2])
            .init(device);
        let up2 = ConvTranspose2dConfig::new([c, c], [2, 2])
            .with_stride([2, 2])
            .init(device);
        let head = Conv2dConfig::new([c, config.num_classes.max(1)], [1, 1]).init(device);

        Self {
            enc1,
            enc2,
            pool,
            up1,
            up2,
            head,
            config: Ignored(config),
        }
    }

    /// Forward pass returning per-pixel class logits `[B, num_classes, H, W]`.
    /// H and W must be divisible by 4 (two pooling stages).
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.enc1.forward(input));
        let x = self.pool.forward(x);
        let x = relu(self.enc2.forward(x));
        let x = self.pool.forward(x);
        let x = relu(self.up1.forward(x));
        let x = relu(self.up2.forward(x));
        self.head.forward(x)
    }
}
