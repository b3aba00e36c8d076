use anyhow::{Result, ensure};

use crate::config::ModelOverrides;

/// Output channels of the three encoder convolutions; the decoder mirrors them.
pub const ENCODER_CHANNELS: [usize; 3] = [64, 128, 256];

/// Total spatial downsampling of the encoder (three stride-2 convolutions).
pub const DOWNSAMPLE_FACTOR: usize = 8;

pub const KERNEL_SIZE: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CvaeConfig {
    pub z_dim: usize,
    pub num_classes: usize,
    pub img_channels: usize,
    pub img_size: usize,
}

impl Default for CvaeConfig {
    fn default() -> Self {
        Self {
            z_dim: 64,
            num_classes: 1,
            img_channels: 3,
            img_size: 32,
        }
    }
}

impl CvaeConfig {
    pub fn new(z_dim: usize, num_classes: usize, img_size: usize) -> Self {
        Self {
            z_dim,
            num_classes,
            img_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.z_dim > 0, "z_dim must be positive");
        ensure!(self.num_classes > 0, "num_classes must be positive");
        ensure!(self.img_channels > 0, "img_channels must be positive");
        ensure!(
            self.img_size > 0 && self.img_size.is_multiple_of(DOWNSAMPLE_FACTOR),
            "image size {} must be a positive multiple of {DOWNSAMPLE_FACTOR}",
            self.img_size
        );
        Ok(())
    }

    /// Side length of the deepest encoder feature map.
    pub fn feature_side(&self) -> usize {
        self.img_size / DOWNSAMPLE_FACTOR
    }

    pub fn flat_features(&self) -> usize {
        let side = self.feature_side();
        ENCODER_CHANNELS[2] * side * side
    }
}

/// Build a model configuration from the configured overrides and a discovered class count.
pub fn build_model_config(overrides: &ModelOverrides, num_classes: usize) -> CvaeConfig {
    CvaeConfig::new(overrides.z_dim, num_classes, overrides.img_size)
}
