use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use toml::{Table, Value};

use super::TextureConfig;

/// Load configuration files in order; keys in later files override earlier ones.
///
/// Tables are merged recursively, arrays (such as `server.transitions`) are
/// replaced wholesale.
pub fn load_config(paths: &[PathBuf]) -> Result<TextureConfig> {
    let mut merged = Table::new();
    for path in paths {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let layer: Table = text
            .parse()
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        merge_tables(&mut merged, layer);
    }

    Value::Table(merged)
        .try_into::<TextureConfig>()
        .context("invalid texture configuration")
}

fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
