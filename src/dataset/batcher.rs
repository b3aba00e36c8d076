use std::sync::Arc;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::folder::{TextureFolderDataset, TextureItem};
use crate::model::one_hot_batch;

/// Images `[B, 3, S, S]` with their one-hot conditions `[B, num_classes]`.
#[derive(Clone, Debug)]
pub struct TextureBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub conditions: Tensor<B, 2>,
    pub labels: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct TextureBatcher {
    num_classes: usize,
    img_size: usize,
}

impl TextureBatcher {
    pub fn new(num_classes: usize, img_size: usize) -> Self {
        Self {
            num_classes,
            img_size,
        }
    }
}

impl<B: Backend> Batcher<B, TextureItem, TextureBatch<B>> for TextureBatcher {
    fn batch(&self, items: Vec<TextureItem>, device: &B::Device) -> TextureBatch<B> {
        let batch = items.len();
        let side = self.img_size;
        let mut pixels = Vec::with_capacity(batch * 3 * side * side);
        let mut labels = Vec::with_capacity(batch);
        for item in items {
            pixels.extend_from_slice(&item.pixels);
            labels.push(item.label);
        }

        let images = Tensor::from_data(TensorData::new(pixels, [batch, 3, side, side]), device);
        let conditions = one_hot_batch(&labels, self.num_classes, device);

        TextureBatch {
            images,
            conditions,
            labels,
        }
    }
}

/// Reshuffles the dataset at the start of every epoch and yields mini-batches.
///
/// The last batch of an epoch may be smaller than `batch_size`.
pub struct ShuffledLoader {
    dataset: Arc<TextureFolderDataset>,
    batcher: TextureBatcher,
    batch_size: usize,
    rng: StdRng,
}

impl ShuffledLoader {
    pub fn new(dataset: Arc<TextureFolderDataset>, batch_size: usize, seed: Option<u64>) -> Self {
        let batcher = TextureBatcher::new(dataset.num_classes(), dataset.img_size());
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            dataset,
            batcher,
            batch_size: batch_size.max(1),
            rng,
        }
    }

    pub fn batches_per_epoch(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn epoch<'a, B: Backend>(
        &'a mut self,
        device: &'a B::Device,
    ) -> impl Iterator<Item = TextureBatch<B>> + 'a {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        order.shuffle(&mut self.rng);
        let chunks: Vec<Vec<usize>> = order
            .chunks(self.batch_size)
            .map(<[usize]>::to_vec)
            .collect();

        let dataset = &self.dataset;
        let batcher = &self.batcher;
        chunks.into_iter().map(move |indices| {
            let items: Vec<TextureItem> = indices
                .into_iter()
                .filter_map(|index| dataset.get(index))
                .collect();
            <TextureBatcher as Batcher<B, TextureItem, TextureBatch<B>>>::batch(
                batcher, items, device,
            )
        })
    }
}
