use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, ensure};
use burn::data::dataset::Dataset;
use image::imageops::{self, FilterType};

/// File extensions recognised as images inside class directories.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "ppm", "pgm", "tif", "tiff", "webp", "gif",
];

/// One training image as CHW floats in `[0, 1]` plus its class index.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureItem {
    pub pixels: Vec<f32>,
    pub label: usize,
}

/// Directory-per-class image dataset held fully in memory.
///
/// Class names are the subdirectory names of the root in lexical order, so
/// the same folder always yields the same class indices.
#[derive(Clone, Debug)]
pub struct TextureFolderDataset {
    classes: Vec<String>,
    items: Vec<TextureItem>,
    img_size: usize,
}

impl TextureFolderDataset {
    pub fn open(root: impl AsRef<Path>, img_size: usize) -> Result<Self> {
        let root = root.as_ref();
        ensure!(img_size > 0, "image size must be positive");

        let classes = discover_classes(root)?;
        ensure!(
            !classes.is_empty(),
            "no class directories found in {}",
            root.display()
        );

        let mut items = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let class_dir = root.join(class);
            let mut files = Vec::new();
            collect_images(&class_dir, &mut files)?;
            ensure!(
                !files.is_empty(),
                "class directory {} contains no images",
                class_dir.display()
            );
            for file in files {
                let pixels = load_texture(&file, img_size)?;
                items.push(TextureItem { pixels, label });
            }
        }

        Ok(Self {
            classes,
            items,
            img_size,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn img_size(&self) -> usize {
        self.img_size
    }

    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for item in &self.items {
            counts[item.label] += 1;
        }
        counts
    }
}

impl Dataset<TextureItem> for TextureFolderDataset {
    fn get(&self, index: usize) -> Option<TextureItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

fn discover_classes(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to read dataset root {}", root.display()))?;

    let mut classes = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", root.display()))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| anyhow!("class directory name {name:?} is not valid UTF-8"))?;
        classes.push(name);
    }
    classes.sort();
    Ok(classes)
}

fn collect_images(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("failed to list {}", dir.display()))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_images(&path, files)?;
        } else if is_image(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Load an image as RGB, resize to `size x size` and lay it out as CHW in `[0, 1]`.
pub fn load_texture(path: &Path, size: usize) -> Result<Vec<f32>> {
    let image = image::open(path)
        .with_context(|| format!("failed to load image {}", path.display()))?
        .to_rgb8();
    let side = size as u32;
    let resized = if image.dimensions() == (side, side) {
        image
    } else {
        imageops::resize(&image, side, side, FilterType::Triangle)
    };

    let plane = size * size;
    let mut pixels = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = y as usize * size + x as usize;
        for channel in 0..3 {
            pixels[channel * plane + offset] = pixel[channel] as f32 / 255.0;
        }
    }
    Ok(pixels)
}
