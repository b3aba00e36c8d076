use anyhow::anyhow;
use burn::tensor::backend::Backend;
use image::RgbImage;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::checkpoint::load_checkpoint;
use crate::config::{ArtifactPaths, TransitionConfig};
use crate::metadata::{ClassMap, TextureMetadata};
use crate::model::{Cvae, blend_condition, condition_tensor, one_hot};
use crate::texture::{mix_vertical, tensor_to_images};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unknown texture {0:?}")]
    UnknownTexture(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A trained model paired with the class list it was trained on.
pub struct TextureGenerator<B: Backend> {
    model: Cvae<B>,
    metadata: TextureMetadata,
    classes: ClassMap,
    device: B::Device,
}

impl<B: Backend> TextureGenerator<B> {
    /// Read metadata, then load the checkpoint it describes.
    pub fn load(artifacts: &ArtifactPaths, device: &B::Device) -> anyhow::Result<Self> {
        let metadata = TextureMetadata::load(&artifacts.metadata)?;
        let model = load_checkpoint::<B>(&metadata.model_config(), &artifacts.checkpoint, device)?;
        Self::new(model, metadata, device.clone())
    }

    pub fn new(model: Cvae<B>, metadata: TextureMetadata, device: B::Device) -> anyhow::Result<Self> {
        metadata.validate()?;
        model.check_dimensions(&metadata.model_config())?;
        let classes = metadata.class_map();
        Ok(Self {
            model,
            metadata,
            classes,
            device,
        })
    }

    pub fn metadata(&self) -> &TextureMetadata {
        &self.metadata
    }

    pub fn resolve(&self, name: &str) -> Result<usize, GenerationError> {
        self.classes
            .index_of(name)
            .ok_or_else(|| GenerationError::UnknownTexture(name.to_string()))
    }

    /// Decode one fresh latent per condition row.
    pub fn sample_conditions(&self, rows: &[Vec<f32>]) -> Result<Vec<RgbImage>, GenerationError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let conditions = condition_tensor::<B>(rows, self.classes.len(), &self.device);
        let images = tensor_to_images(self.model.sample(conditions))?;
        if images.len() != rows.len() {
            return Err(anyhow!(
                "decoded {} images for {} conditions",
                images.len(),
                rows.len()
            )
            .into());
        }
        Ok(images)
    }

    pub fn generate(&self, name: &str) -> Result<RgbImage, GenerationError> {
        let index = self.resolve(name)?;
        let row = one_hot(index, self.classes.len());
        self.sample_conditions(&[row])?
            .pop()
            .ok_or_else(|| anyhow!("decoder returned no image").into())
    }

    /// Generate the named classes in one decoder pass, keyed in request order.
    pub fn generate_many(
        &self,
        names: &[String],
    ) -> Result<IndexMap<String, RgbImage>, GenerationError> {
        let rows = names
            .iter()
            .map(|name| Ok(one_hot(self.resolve(name)?, self.classes.len())))
            .collect::<Result<Vec<_>, GenerationError>>()?;
        let images = self.sample_conditions(&rows)?;
        Ok(names.iter().cloned().zip(images).collect())
    }

    /// One sample per trained class, in class index order.
    pub fn generate_all(&self) -> Result<IndexMap<String, RgbImage>, GenerationError> {
        let names: Vec<String> = self.metadata.classes.clone();
        debug!(classes = names.len(), "generating full texture set");
        self.generate_many(&names)
    }

    /// Sample from the blended condition of two classes.
    ///
    /// `ratio` is clamped to `[0, 1]`; 0 is pure `first`, 1 is pure `second`.
    pub fn mix(&self, first: &str, second: &str, ratio: f32) -> Result<RgbImage, GenerationError> {
        let first = self.resolve(first)?;
        let second = self.resolve(second)?;
        let row = blend_condition(first, second, ratio.clamp(0.0, 1.0), self.classes.len());
        self.sample_conditions(&[row])?
            .pop()
            .ok_or_else(|| anyhow!("decoder returned no image").into())
    }
}

/// Add configured transitions to a generated set.
///
/// A transition whose top or bottom is missing is skipped. A transition named
/// like an existing entry replaces it in place. Returns the names written.
pub fn apply_transitions(
    images: &mut IndexMap<String, RgbImage>,
    transitions: &[TransitionConfig],
) -> anyhow::Result<Vec<String>> {
    let mut written = Vec::new();
    for transition in transitions {
        let (Some(top), Some(bottom)) = (images.get(&transition.top), images.get(&transition.bottom))
        else {
            warn!(
                "skipping transition {}: needs {} and {}",
                transition.name, transition.top, transition.bottom
            );
            continue;
        };
        let mixed = mix_vertical(top, bottom, transition.cutoff)?;
        images.insert(transition.name.clone(), mixed);
        written.push(transition.name.clone());
    }
    Ok(written)
}
