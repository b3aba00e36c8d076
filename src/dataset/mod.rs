mod batcher;
mod folder;

pub use batcher::{ShuffledLoader, TextureBatch, TextureBatcher};
pub use folder::{IMAGE_EXTENSIONS, TextureFolderDataset, TextureItem, load_texture};
