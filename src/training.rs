use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail, ensure};
use burn::data::dataset::Dataset;
use burn::optim::{AdamConfig, GradientsParams, LearningRate, Optimizer};
use burn::tensor::Tensor;
use burn::tensor::backend::{AutodiffBackend, Backend};
use tracing::{info, warn};

use crate::checkpoint::{checkpoint_exists, checkpoint_file, resume_or_init, save_checkpoint};
use crate::config::TextureConfig;
use crate::dataset::{ShuffledLoader, TextureFolderDataset};
use crate::metadata::TextureMetadata;
use crate::model::{Cvae, cvae_loss};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub metadata: TextureMetadata,
    pub resumed: bool,
    pub epochs: usize,
    /// Mean loss over the last epoch, `None` when no epoch ran.
    pub final_loss: Option<f32>,
}

/// Fit the CVAE to the configured image folder.
///
/// Metadata is written before the model is built, resuming or not. The
/// checkpoint is saved every `checkpoint_interval` epochs and after the last
/// epoch.
pub fn train<B>(config: &TextureConfig, device: &B::Device) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
{
    let training = &config.training;
    let dataset = TextureFolderDataset::open(&config.dataset.root, config.model.img_size)
        .with_context(|| {
            format!(
                "failed to prepare dataset {}",
                config.dataset.root.display()
            )
        })?;
    info!(
        "Found {} images across {} classes: {:?}",
        dataset.len(),
        dataset.num_classes(),
        dataset.classes()
    );

    let metadata = TextureMetadata::new(
        dataset.classes().to_vec(),
        config.model.z_dim,
        config.model.img_size,
    );
    metadata.validate()?;

    let model_config = metadata.model_config();
    let checkpoint = &config.artifacts.checkpoint;
    if let Some(previous) = previous_metadata(&metadata, &config.artifacts.metadata)
        && checkpoint_exists(checkpoint)
        && previous.model_config() != model_config
    {
        bail!(
            "checkpoint {} was trained for {} classes (z_dim={}, img={}) but the run needs {} classes (z_dim={}, img={}); move the checkpoint aside to start over",
            checkpoint_file(checkpoint).display(),
            previous.num_classes,
            previous.z_dim,
            previous.img,
            metadata.num_classes,
            metadata.z_dim,
            metadata.img
        );
    }
    metadata.save(&config.artifacts.metadata)?;
    info!("Wrote metadata to {}", config.artifacts.metadata.display());

    if let Some(seed) = training.seed {
        B::seed(device, seed);
    }
    let (mut model, resumed) = resume_or_init::<B>(&model_config, checkpoint, device)?;

    let mut optimizer = AdamConfig::new().init::<B, Cvae<B>>();
    let mut loader = ShuffledLoader::new(Arc::new(dataset), training.batch_size, training.seed);
    info!(
        "train schedule: epochs={}, batch_size={}, batches_per_epoch={}, lr={}, kl_weight={}",
        training.epochs,
        training.batch_size,
        loader.batches_per_epoch(),
        training.learning_rate,
        training.kl_weight
    );

    let mut final_loss = None;
    for epoch in 1..=training.epochs {
        let (updated, loss) = train_epoch(
            model,
            &mut optimizer,
            &mut loader,
            training.learning_rate,
            training.kl_weight,
            device,
        )?;
        model = updated;
        final_loss = Some(loss);
        info!("Epoch {epoch}: {loss:.6}");

        if training.checkpoint_interval > 0 && epoch.is_multiple_of(training.checkpoint_interval) {
            save_checkpoint(&model, checkpoint)?;
            info!("Checkpoint saved to {}", checkpoint_file(checkpoint).display());
        }
    }

    save_checkpoint(&model, checkpoint)?;
    info!(
        "Training finished; weights at {}",
        checkpoint_file(checkpoint).display()
    );

    Ok(TrainingSummary {
        metadata,
        resumed,
        epochs: training.epochs,
        final_loss,
    })
}

/// Run one pass over the loader and return the updated model with its mean batch loss.
pub fn train_epoch<B, O>(
    mut model: Cvae<B>,
    optimizer: &mut O,
    loader: &mut ShuffledLoader,
    learning_rate: LearningRate,
    kl_weight: f32,
    device: &B::Device,
) -> Result<(Cvae<B>, f32)>
where
    B: AutodiffBackend,
    O: Optimizer<Cvae<B>, B>,
{
    let mut total = 0.0f32;
    let mut batches = 0usize;

    for batch in loader.epoch::<B>(device) {
        let output = model.forward(batch.images.clone(), batch.conditions);
        let loss = cvae_loss(output, batch.images, kl_weight);
        total += loss_value(&loss)?;
        batches += 1;

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(learning_rate, model, grads);
    }

    ensure!(batches > 0, "dataset produced no batches");
    Ok((model, total / batches as f32))
}

pub fn loss_value<B: Backend>(loss: &Tensor<B, 1>) -> Result<f32> {
    loss.clone()
        .to_data()
        .convert::<f32>()
        .into_vec::<f32>()
        .map_err(|err| anyhow!("failed to read loss: {err:?}"))?
        .first()
        .copied()
        .ok_or_else(|| anyhow!("loss tensor is empty"))
}

/// Metadata left by an earlier run, if readable. Warns when the class list differs.
fn previous_metadata(metadata: &TextureMetadata, path: &Path) -> Option<TextureMetadata> {
    if !path.is_file() {
        return None;
    }
    match TextureMetadata::load(path) {
        Ok(previous) => {
            if previous.classes != metadata.classes {
                warn!(
                    "Replacing {} with a different class list ({:?} -> {:?})",
                    path.display(),
                    previous.classes,
                    metadata.classes
                );
            }
            Some(previous)
        }
        Err(err) => {
            warn!("Replacing unreadable metadata {}: {err:#}", path.display());
            None
        }
    }
}
