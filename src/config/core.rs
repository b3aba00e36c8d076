use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete configuration shared by the training, serving and batch binaries.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct TextureConfig {
    #[serde(default)]
    pub model: ModelOverrides,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub training: TrainingHyperparameters,
    #[serde(default)]
    pub artifacts: ArtifactPaths,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Architecture knobs that are not discovered from the dataset.
///
/// The class count always comes from the dataset (training) or the metadata
/// file (serving), never from here.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelOverrides {
    #[serde(default = "default_z_dim")]
    pub z_dim: usize,
    #[serde(default = "default_img_size")]
    pub img_size: usize,
}

impl Default for ModelOverrides {
    fn default() -> Self {
        Self {
            z_dim: default_z_dim(),
            img_size: default_img_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DatasetConfig {
    /// Root directory holding one subdirectory per texture class.
    #[serde(default = "default_dataset_root")]
    pub root: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: default_dataset_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrainingHyperparameters {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_kl_weight")]
    pub kl_weight: f32,
    /// Save the checkpoint every this many epochs (and always after the last one).
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainingHyperparameters {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            kl_weight: default_kl_weight(),
            checkpoint_interval: default_checkpoint_interval(),
            seed: None,
        }
    }
}

/// Files written by training and read by serving.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ArtifactPaths {
    #[serde(default = "default_checkpoint")]
    pub checkpoint: PathBuf,
    #[serde(default = "default_metadata")]
    pub metadata: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            checkpoint: default_checkpoint(),
            metadata: default_metadata(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Pending generation jobs accepted before handlers start waiting.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_mix_ratio")]
    pub default_mix_ratio: f32,
    #[serde(default = "default_transitions")]
    pub transitions: Vec<TransitionConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            queue_capacity: default_queue_capacity(),
            default_mix_ratio: default_mix_ratio(),
            transitions: default_transitions(),
        }
    }
}

/// A derived texture built by blending `top` over `bottom` with [`crate::mix_vertical`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TransitionConfig {
    pub name: String,
    pub top: String,
    pub bottom: String,
    #[serde(default = "default_cutoff")]
    pub cutoff: f32,
}

impl TransitionConfig {
    pub fn new(name: impl Into<String>, top: impl Into<String>, bottom: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            top: top.into(),
            bottom: bottom.into(),
            cutoff: default_cutoff(),
        }
    }
}

fn default_z_dim() -> usize {
    64
}

fn default_img_size() -> usize {
    32
}

fn default_dataset_root() -> PathBuf {
    PathBuf::from("dataset")
}

fn default_epochs() -> usize {
    1000
}

fn default_batch_size() -> usize {
    32
}

fn default_learning_rate() -> f64 {
    1e-3
}

fn default_kl_weight() -> f32 {
    0.01
}

fn default_checkpoint_interval() -> usize {
    5
}

fn default_checkpoint() -> PathBuf {
    PathBuf::from("cvae.bin")
}

fn default_metadata() -> PathBuf {
    PathBuf::from("metadata.json")
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

fn default_mix_ratio() -> f32 {
    0.5
}

fn default_cutoff() -> f32 {
    0.3
}

fn default_transitions() -> Vec<TransitionConfig> {
    vec![
        TransitionConfig::new("grass_side", "grass_top", "dirt"),
        TransitionConfig::new("snow_transition_side", "snow_top", "dirt"),
    ]
}
