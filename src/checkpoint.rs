use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use tracing::info;

use crate::model::{Cvae, CvaeConfig};

/// Extension appended by [`BinFileRecorder`] to checkpoint paths.
pub const CHECKPOINT_EXTENSION: &str = "bin";

type CheckpointRecorder = BinFileRecorder<FullPrecisionSettings>;

/// Path the recorder actually reads and writes for `path`.
pub fn checkpoint_file(path: &Path) -> PathBuf {
    path.with_extension(CHECKPOINT_EXTENSION)
}

pub fn checkpoint_exists(path: &Path) -> bool {
    checkpoint_file(path).is_file()
}

pub fn save_checkpoint<B: Backend>(model: &Cvae<B>, path: &Path) -> Result<()> {
    let file = checkpoint_file(path);
    if let Some(parent) = file.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    model
        .clone()
        .save_file(file.clone(), &CheckpointRecorder::new())
        .with_context(|| format!("failed to save checkpoint {}", file.display()))
}

/// Load weights for `config` and verify they fit it.
pub fn load_checkpoint<B: Backend>(
    config: &CvaeConfig,
    path: &Path,
    device: &B::Device,
) -> Result<Cvae<B>> {
    config.validate()?;
    let file = checkpoint_file(path);
    let model = Cvae::<B>::new(config, device)
        .load_file(file.clone(), &CheckpointRecorder::new(), device)
        .with_context(|| format!("failed to load checkpoint {}", file.display()))?;
    model.check_dimensions(config).with_context(|| {
        format!(
            "checkpoint {} does not match the model architecture",
            file.display()
        )
    })?;
    Ok(model)
}

/// Continue from an existing checkpoint, or start from fresh weights.
///
/// Returns the model and whether a checkpoint was loaded.
pub fn resume_or_init<B: Backend>(
    config: &CvaeConfig,
    path: &Path,
    device: &B::Device,
) -> Result<(Cvae<B>, bool)> {
    if checkpoint_exists(path) {
        let model = load_checkpoint(config, path, device)?;
        info!(
            "Resuming from checkpoint {}",
            checkpoint_file(path).display()
        );
        Ok((model, true))
    } else {
        info!(
            "No checkpoint at {}; training from scratch",
            checkpoint_file(path).display()
        );
        Ok((Cvae::new(config, device), false))
    }
}
