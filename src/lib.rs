#![recursion_limit = "256"]

pub mod backend;
pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod generation;
pub mod metadata;
pub mod model;
pub mod server;
pub mod texture;
pub mod training;

pub use backend::{BackendArg, init_tracing, init_wgpu_runtime};
pub use checkpoint::{
    checkpoint_exists, checkpoint_file, load_checkpoint, resume_or_init, save_checkpoint,
};
pub use config::{
    ArtifactPaths, DatasetConfig, ModelOverrides, ServerConfig, TextureConfig,
    TrainingHyperparameters, TransitionConfig, load_config,
};
pub use dataset::{ShuffledLoader, TextureBatch, TextureBatcher, TextureFolderDataset, TextureItem};
pub use generation::{GenerationError, TextureGenerator, apply_transitions};
pub use metadata::{ClassMap, TextureMetadata};
pub use model::{
    Cvae, CvaeConfig, CvaeOutput, blend_condition, build_model_config, cvae_loss, one_hot,
};
pub use server::{AppState, GeneratorHandle, router};
pub use texture::{
    decode_png_base64, encode_png, encode_png_base64, mix_vertical, tensor_to_images,
};
pub use training::{TrainingSummary, train};
