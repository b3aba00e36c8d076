pub mod core;
mod load;

pub use self::core::{
    ArtifactPaths, DatasetConfig, ModelOverrides, ServerConfig, TextureConfig,
    TrainingHyperparameters, TransitionConfig,
};
pub use load::load_config;
