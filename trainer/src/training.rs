// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconstruction training loop

use crate::data::{images_to_tensor, tensor_to_images, GrayImage};
use crate::error::TrainerError;
use crate::model::{Autoencoder, AutoencoderConfig};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ElementConversion;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub model: AutoencoderConfig,
    /// Samples drawn from the dataset for training
    pub train_size: usize,
    /// Samples drawn for validation
    pub valid_size: usize,
    pub batch_size: usize,
    pub epochs: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    pub seed: u64,
    /// Log every this many steps
    pub log_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: AutoencoderConfig::default(),
            train_size: 20_000,
            valid_size: 500,
            batch_size: 64,
            epochs: 1,
            learning_rate: 1e-3,
            seed: 42,
            log_interval: 50,
        }
    }
}

impl TrainingConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, TrainerError> {
        let text = std::fs::read_to_string(path).map_err(|source| TrainerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| TrainerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), TrainerError> {
        self.model.validate()?;
        if self.batch_size == 0 {
            return Err(TrainerError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.epochs == 0 {
            return Err(TrainerError::InvalidConfig("epochs must be positive".into()));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(TrainerError::InvalidConfig(
                "learning_rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// What a training run did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub steps: usize,
    /// Loss of every optimisation step, in order
    pub train_losses: Vec<f32>,
    pub final_train_loss: f32,
    pub mean_train_loss: f32,
    /// Mean loss over the validation images after the last epoch
    pub validation_loss: Option<f32>,
}

/// Fit a fresh autoencoder to `train_images`
pub fn train<B: AutodiffBackend>(
    config: &TrainingConfig,
    train_images: &[GrayImage],
    valid_images: &[GrayImage],
    device: &B::Device,
) -> Result<(Autoencoder<B>, TrainingReport), TrainerError> {
    config.validate()?;
    let first = train_images.first().ok_or(TrainerError::EmptyDataset)?;
    let latent = config.model.latent_size(first.width, first.height)?;
    // Batches are reshuffled every epoch, so every training image must match
    for (index, image) in train_images.iter().enumerate() {
        if (image.width, image.height) != (first.width, first.height) {
            return Err(TrainerError::MixedSizes {
                index,
                width: image.width,
                height: image.height,
                expected_width: first.width,
                expected_height: first.height,
            });
        }
    }
    for image in valid_images {
        config.model.latent_size(image.width, image.height)?;
    }
    info!(
        train = train_images.len(),
        valid = valid_images.len(),
        latent_width = latent.0,
        latent_height = latent.1,
        "starting autoencoder training"
    );

    let mut model = config.model.init::<B>(device);
    let mut optim = AdamConfig::new().init();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..train_images.len()).collect();
    let mut losses = Vec::new();

    for epoch in 1..=config.epochs {
        order.shuffle(&mut rng);
        for chunk in order.chunks(config.batch_size) {
            let batch = images_to_tensor::<B>(chunk.iter().map(|&i| &train_images[i]), device)?;
            let loss = model.reconstruction_loss(batch);
            let value = loss.clone().into_scalar().elem::<f32>();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);

            losses.push(value);
            let step = losses.len();
            if step % config.log_interval.max(1) == 0 {
                info!(epoch, step, train_loss = value, "training");
            } else {
                debug!(epoch, step, train_loss = value, "training");
            }
        }
    }

    let validation_loss = if valid_images.is_empty() {
        None
    } else {
        let loss = evaluate(&model.valid(), valid_images, config.batch_size, device)?;
        info!(valid_loss = loss, "validation");
        Some(loss)
    };

    let final_train_loss = losses.last().copied().unwrap_or_default();
    let mean_train_loss = losses.iter().sum::<f32>() / losses.len().max(1) as f32;
    let report = TrainingReport {
        epochs: config.epochs,
        steps: losses.len(),
        train_losses: losses,
        final_train_loss,
        mean_train_loss,
        validation_loss,
    };
    Ok((model, report))
}

/// Mean reconstruction loss over `images`, weighted by batch size
pub fn evaluate<B: Backend>(
    model: &Autoencoder<B>,
    images: &[GrayImage],
    batch_size: usize,
    device: &B::Device,
) -> Result<f32, TrainerError> {
    if images.is_empty() {
        return Err(TrainerError::EmptyDataset);
    }
    check_inputs(model, images)?;

    let mut total = 0.0f32;
    for chunk in images.chunks(batch_size.max(1)) {
        let batch = images_to_tensor::<B>(chunk, device)?;
        let loss = model.reconstruction_loss(batch).into_scalar().elem::<f32>();
        total += loss * chunk.len() as f32;
    }
    Ok(total / images.len() as f32)
}

/// Run `images` through the model and read the reconstructions back
pub fn reconstruct<B: Backend>(
    model: &Autoencoder<B>,
    images: &[GrayImage],
    device: &B::Device,
) -> Result<Vec<GrayImage>, TrainerError> {
    check_inputs(model, images)?;
    let batch = images_to_tensor::<B>(images, device)?;
    tensor_to_images(model.forward(batch))
}

fn check_inputs<B: Backend>(model: &Autoencoder<B>, images: &[GrayImage]) -> Result<(), TrainerError> {
    images
        .iter()
        .try_for_each(|image| model.check_input(image.width, image.height))
}
