//! Metadata shared between training and serving.
//!
//! Training writes this file once per run; serving reads it before touching
//! the checkpoint, since the checkpoint's shapes depend on it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::{CvaeConfig, DOWNSAMPLE_FACTOR};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureMetadata {
    /// Class names; a class's index is its position in this list.
    pub classes: Vec<String>,
    pub num_classes: usize,
    pub z_dim: usize,
    /// Side length of the square training images.
    pub img: usize,
}

impl TextureMetadata {
    pub fn new(classes: Vec<String>, z_dim: usize, img: usize) -> Self {
        Self {
            num_classes: classes.len(),
            classes,
            z_dim,
            img,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.classes.is_empty(), "metadata lists no classes");
        ensure!(
            self.num_classes == self.classes.len(),
            "metadata num_classes={} but {} class names are listed",
            self.num_classes,
            self.classes.len()
        );
        let mut seen = IndexSet::with_capacity(self.classes.len());
        for name in &self.classes {
            ensure!(!name.is_empty(), "metadata contains an empty class name");
            ensure!(seen.insert(name.as_str()), "duplicate class name {name:?}");
        }
        ensure!(self.z_dim > 0, "metadata z_dim must be positive");
        ensure!(
            self.img > 0 && self.img.is_multiple_of(DOWNSAMPLE_FACTOR),
            "metadata img={} must be a positive multiple of {DOWNSAMPLE_FACTOR}",
            self.img
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata {}", path.display()))?;
        let metadata: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse metadata {}", path.display()))?;
        metadata
            .validate()
            .with_context(|| format!("invalid metadata {}", path.display()))?;
        Ok(metadata)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize metadata")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn model_config(&self) -> CvaeConfig {
        CvaeConfig::new(self.z_dim, self.num_classes, self.img)
    }

    pub fn class_map(&self) -> ClassMap {
        ClassMap::new(self.classes.iter().cloned())
    }
}

/// Dense, order-preserving class name <-> index mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassMap {
    names: IndexSet<String>,
}

impl ClassMap {
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get_index(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
