use anyhow::{Result, bail};
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d};
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor, activation};

use super::config::{CvaeConfig, DOWNSAMPLE_FACTOR, ENCODER_CHANNELS, KERNEL_SIZE};

/// Conditional VAE over square RGB textures.
///
/// The encoder sees the image with the condition vector broadcast over every
/// pixel as extra channels; the decoder sees the latent concatenated with the
/// condition vector.
#[derive(Module, Debug)]
pub struct Cvae<B: Backend> {
    z_dim: usize,
    num_classes: usize,
    img_size: usize,
    enc_conv1: Conv2d<B>,
    enc_conv2: Conv2d<B>,
    enc_conv3: Conv2d<B>,
    fc_mu: Linear<B>,
    fc_logvar: Linear<B>,
    fc_dec: Linear<B>,
    dec_conv1: ConvTranspose2d<B>,
    dec_conv2: ConvTranspose2d<B>,
    dec_conv3: ConvTranspose2d<B>,
}

/// Reconstruction plus the latent distribution it was sampled from.
#[derive(Debug, Clone)]
pub struct CvaeOutput<B: Backend> {
    pub reconstruction: Tensor<B, 4>,
    pub mu: Tensor<B, 2>,
    pub logvar: Tensor<B, 2>,
}

impl<B: Backend> Cvae<B> {
    /// Panics if `config` fails [`CvaeConfig::validate`].
    pub fn new(config: &CvaeConfig, device: &B::Device) -> Self {
        if let Err(err) = config.validate() {
            panic!("invalid CVAE config: {err}");
        }

        let [c1, c2, c3] = ENCODER_CHANNELS;
        let kernel = [KERNEL_SIZE, KERNEL_SIZE];
        let down = |input: usize, output: usize| {
            Conv2dConfig::new([input, output], kernel)
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };
        let up = |input: usize, output: usize| {
            ConvTranspose2dConfig::new([input, output], kernel)
                .with_stride([2, 2])
                .with_padding([1, 1])
                .init(device)
        };

        let flat = config.flat_features();
        Self {
            z_dim: config.z_dim,
            num_classes: config.num_classes,
            img_size: config.img_size,
            enc_conv1: down(config.img_channels + config.num_classes, c1),
            enc_conv2: down(c1, c2),
            enc_conv3: down(c2, c3),
            fc_mu: LinearConfig::new(flat, config.z_dim).init(device),
            fc_logvar: LinearConfig::new(flat, config.z_dim).init(device),
            fc_dec: LinearConfig::new(config.z_dim + config.num_classes, flat).init(device),
            dec_conv1: up(c3, c2),
            dec_conv2: up(c2, c1),
            dec_conv3: up(c1, config.img_channels),
        }
    }

    pub fn z_dim(&self) -> usize {
        self.z_dim
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn img_size(&self) -> usize {
        self.img_size
    }

    /// Map images `[B, C, H, W]` and conditions `[B, num_classes]` to `(mu, logvar)`.
    pub fn encode(
        &self,
        images: Tensor<B, 4>,
        conditions: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, _, height, width] = images.dims();
        let condition_map = conditions
            .reshape([batch, self.num_classes, 1, 1])
            .expand([batch, self.num_classes, height, width]);

        let hidden = Tensor::cat(vec![images, condition_map], 1);
        let hidden = activation::relu(self.enc_conv1.forward(hidden));
        let hidden = activation::relu(self.enc_conv2.forward(hidden));
        let hidden = activation::relu(self.enc_conv3.forward(hidden));
        let hidden: Tensor<B, 2> = hidden.flatten(1, 3);

        (
            self.fc_mu.forward(hidden.clone()),
            self.fc_logvar.forward(hidden),
        )
    }

    /// `mu + eps * exp(0.5 * logvar)` with a fresh `eps ~ N(0, 1)` on every call.
    pub fn reparam(&self, mu: Tensor<B, 2>, logvar: Tensor<B, 2>) -> Tensor<B, 2> {
        let std = logvar.mul_scalar(0.5).exp();
        let eps = Tensor::random_like(&std, Distribution::Normal(0.0, 1.0));
        mu + eps * std
    }

    /// Map latents `[B, z_dim]` and conditions `[B, num_classes]` to images in `[0, 1]`.
    pub fn decode(&self, latent: Tensor<B, 2>, conditions: Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch, _] = latent.dims();
        let side = self.img_size / DOWNSAMPLE_FACTOR;

        let hidden = self.fc_dec.forward(Tensor::cat(vec![latent, conditions], 1));
        let hidden = hidden.reshape([batch, ENCODER_CHANNELS[2], side, side]);
        let hidden = activation::relu(self.dec_conv1.forward(hidden));
        let hidden = activation::relu(self.dec_conv2.forward(hidden));
        activation::sigmoid(self.dec_conv3.forward(hidden))
    }

    pub fn forward(&self, images: Tensor<B, 4>, conditions: Tensor<B, 2>) -> CvaeOutput<B> {
        let (mu, logvar) = self.encode(images, conditions.clone());
        let latent = self.reparam(mu.clone(), logvar.clone());
        CvaeOutput {
            reconstruction: self.decode(latent, conditions),
            mu,
            logvar,
        }
    }

    /// Decode one standard-normal latent per condition row.
    pub fn sample(&self, conditions: Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch, _] = conditions.dims();
        let latent = Tensor::random(
            [batch, self.z_dim],
            Distribution::Normal(0.0, 1.0),
            &conditions.device(),
        );
        self.decode(latent, conditions)
    }

    /// Check parameter shapes against `config`.
    ///
    /// Loading a record does not validate tensor shapes, so this must run
    /// after every checkpoint load.
    pub fn check_dimensions(&self, config: &CvaeConfig) -> Result<()> {
        let flat = config.flat_features();
        let checks = [
            (
                "enc_conv1.weight",
                self.enc_conv1.weight.val().dims().to_vec(),
                vec![
                    ENCODER_CHANNELS[0],
                    config.img_channels + config.num_classes,
                    KERNEL_SIZE,
                    KERNEL_SIZE,
                ],
            ),
            (
                "fc_mu.weight",
                self.fc_mu.weight.val().dims().to_vec(),
                vec![flat, config.z_dim],
            ),
            (
                "fc_logvar.weight",
                self.fc_logvar.weight.val().dims().to_vec(),
                vec![flat, config.z_dim],
            ),
            (
                "fc_dec.weight",
                self.fc_dec.weight.val().dims().to_vec(),
                vec![config.z_dim + config.num_classes, flat],
            ),
            (
                "dec_conv3.weight",
                self.dec_conv3.weight.val().dims().to_vec(),
                vec![ENCODER_CHANNELS[0], config.img_channels, KERNEL_SIZE, KERNEL_SIZE],
            ),
        ];

        for (name, actual, expected) in checks {
            if actual != expected {
                bail!(
                    "parameter {name} has shape {actual:?} but z_dim={}, num_classes={}, img={} requires {expected:?}",
                    config.z_dim,
                    config.num_classes,
                    config.img_size
                );
            }
        }
        Ok(())
    }
}
