mod condition;
mod config;
mod cvae;
mod loss;

pub use condition::{blend_condition, condition_tensor, one_hot, one_hot_batch};
pub use config::{
    CvaeConfig, DOWNSAMPLE_FACTOR, ENCODER_CHANNELS, KERNEL_SIZE, build_model_config,
};
pub use cvae::{Cvae, CvaeOutput};
pub use loss::{DEFAULT_KL_WEIGHT, cvae_loss, kl_divergence};
