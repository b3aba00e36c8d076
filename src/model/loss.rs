use burn::nn::loss::{MseLoss, Reduction};
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

use super::cvae::CvaeOutput;

/// Default weight of the KL term.
pub const DEFAULT_KL_WEIGHT: f32 = 0.01;

/// Mean squared reconstruction error plus a `kl_weight`-scaled KL divergence.
pub fn cvae_loss<B: Backend>(
    output: CvaeOutput<B>,
    targets: Tensor<B, 4>,
    kl_weight: f32,
) -> Tensor<B, 1> {
    let reconstruction = MseLoss::new().forward(output.reconstruction, targets, Reduction::Mean);
    let kl = kl_divergence(output.mu, output.logvar);
    reconstruction + kl.mul_scalar(kl_weight)
}

/// KL(N(mu, exp(logvar)) || N(0, 1)), averaged over batch and latent dimensions.
pub fn kl_divergence<B: Backend>(mu: Tensor<B, 2>, logvar: Tensor<B, 2>) -> Tensor<B, 1> {
    let terms = logvar.clone().add_scalar(1.0) - mu.powf_scalar(2.0) - logvar.exp();
    terms.mean().mul_scalar(-0.5)
}
