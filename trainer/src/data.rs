// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image data: grayscale images, dataset splits and tensor packing

use crate::error::TrainerError;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use burn_dataset::vision::{MnistDataset, MnistItem};
use burn_dataset::Dataset;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Single-channel image with pixels in `[0, 1]`, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<f32>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Result<Self, TrainerError> {
        if pixels.len() != width * height {
            return Err(TrainerError::PixelCount {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Convert an MNIST item, scaling its 0-255 intensities to `[0, 1]`
    pub fn from_mnist(item: &MnistItem) -> Self {
        let height = item.image.len();
        let width = item.image.first().map_or(0, |row| row.len());
        let pixels = item
            .image
            .iter()
            .flat_map(|row| row.iter().map(|&v| v / 255.0))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> f32 {
        self.pixels[y * self.width + x]
    }
}

/// Random disjoint train/validation index sets out of `0..len`.
///
/// Whatever is left after taking `train + valid` samples is discarded.
pub fn split_indices(
    len: usize,
    train: usize,
    valid: usize,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), TrainerError> {
    if train.checked_add(valid).map_or(true, |wanted| wanted > len) {
        return Err(TrainerError::InvalidSplit {
            train,
            valid,
            available: len,
        });
    }

    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    indices.truncate(train + valid);
    let valid_indices = indices.split_off(train);
    Ok((indices, valid_indices))
}

/// Pull a train/validation split of images out of any MNIST-shaped dataset
pub fn split_dataset<D: Dataset<MnistItem>>(
    dataset: &D,
    train: usize,
    valid: usize,
    seed: u64,
) -> Result<(Vec<GrayImage>, Vec<GrayImage>), TrainerError> {
    if dataset.is_empty() {
        return Err(TrainerError::EmptyDataset);
    }
    let (train_idx, valid_idx) = split_indices(dataset.len(), train, valid, seed)?;
    let fetch = |indices: Vec<usize>| -> Result<Vec<GrayImage>, TrainerError> {
        indices
            .into_iter()
            .map(|index| {
                dataset
                    .get(index)
                    .map(|item| GrayImage::from_mnist(&item))
                    .ok_or(TrainerError::MissingItem { index })
            })
            .collect()
    };
    Ok((fetch(train_idx)?, fetch(valid_idx)?))
}

/// Download (or reuse the cached) MNIST training set and split it
pub fn load_mnist(
    train: usize,
    valid: usize,
    seed: u64,
) -> Result<(Vec<GrayImage>, Vec<GrayImage>), TrainerError> {
    let dataset = MnistDataset::train();
    info!(samples = dataset.len(), "MNIST training set ready");
    split_dataset(&dataset, train, valid, seed)
}

/// Pack same-sized images into a `[batch, 1, height, width]` tensor
pub fn images_to_tensor<'a, B: Backend>(
    images: impl IntoIterator<Item = &'a GrayImage>,
    device: &B::Device,
) -> Result<Tensor<B, 4>, TrainerError> {
    let mut values = Vec::new();
    let mut size: Option<(usize, usize)> = None;
    let mut count = 0;

    for (index, image) in images.into_iter().enumerate() {
        let (width, height) = *size.get_or_insert((image.width, image.height));
        if (image.width, image.height) != (width, height) {
            return Err(TrainerError::MixedSizes {
                index,
                width: image.width,
                height: image.height,
                expected_width: width,
                expected_height: height,
            });
        }
        values.extend_from_slice(&image.pixels);
        count += 1;
    }

    let (width, height) = size.ok_or(TrainerError::EmptyDataset)?;
    let data = TensorData::new(values, [count, 1, height, width]);
    Ok(Tensor::from_data(data, device))
}

/// Split a `[batch, channels, height, width]` tensor back into images,
/// keeping the first channel
pub fn tensor_to_images<B: Backend>(tensor: Tensor<B, 4>) -> Result<Vec<GrayImage>, TrainerError> {
    let [batch, channels, height, width] = tensor.dims();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrainerError::Tensor(format!("{:?}", e)))?;

    let plane = height * width;
    (0..batch)
        .map(|b| {
            let start = b * channels * plane;
            GrayImage::new(width, height, values[start..start + plane].to_vec())
        })
        .collect()
}
