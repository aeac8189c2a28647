// SPDX-License-Identifier: MIT OR Apache-2.0

//! `train-autoencoder`: fit the autoencoder on MNIST and show reconstructions

use anyhow::{Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::wgpu::WgpuDevice;
use burn::backend::{Autodiff, NdArray, Wgpu};
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use clap::{Parser, ValueEnum};
use gotrain_trainer::{load_mnist, reconstruct, train, GrayImage, TrainingConfig, TrainingReport};
use gotrain_viewer::show_reconstructions;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reconstructions handed to the viewer
pub const VIEWER_SAMPLES: usize = 16;

/// Compute backend to train on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// GPU through wgpu
    #[default]
    Wgpu,
    /// CPU through ndarray
    Ndarray,
}

#[derive(Parser, Debug)]
#[clap(
    name = "train-autoencoder",
    version,
    about = "Train a convolutional autoencoder on MNIST and view its reconstructions"
)]
pub struct TrainArgs {
    /// JSON training config; flags take precedence over its values
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(long)]
    pub epochs: Option<usize>,

    #[clap(long)]
    pub batch_size: Option<usize>,

    /// Training samples drawn from MNIST
    #[clap(long)]
    pub train_size: Option<usize>,

    /// Validation samples drawn from MNIST
    #[clap(long)]
    pub valid_size: Option<usize>,

    #[clap(long)]
    pub learning_rate: Option<f64>,

    /// Seed for the split and the per-epoch shuffle
    #[clap(long)]
    pub seed: Option<u64>,

    #[clap(long, value_enum, default_value = "wgpu")]
    pub backend: BackendKind,

    /// Skip the reconstruction window
    #[clap(long)]
    pub no_viewer: bool,

    /// Write the training report as JSON to this path
    #[clap(long)]
    pub report: Option<PathBuf>,

    /// Debug logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl TrainArgs {
    /// Training config from `--config`, with command-line overrides applied
    pub fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)?,
            None => TrainingConfig::default(),
        };
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(train_size) = self.train_size {
            config.train_size = train_size;
        }
        if let Some(valid_size) = self.valid_size {
            config.valid_size = valid_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Train on MNIST, write the report and open the viewer as requested
pub fn run(args: &TrainArgs) -> Result<TrainingReport> {
    let config = args.training_config()?;
    let (train_images, valid_images) = load_mnist(config.train_size, config.valid_size, config.seed)
        .context("failed to prepare MNIST")?;

    info!(backend = ?args.backend, "training");
    let (report, pairs) = match args.backend {
        BackendKind::Wgpu => fit::<Autodiff<Wgpu>>(
            &config,
            &train_images,
            &valid_images,
            &WgpuDevice::default(),
        )?,
        BackendKind::Ndarray => fit::<Autodiff<NdArray>>(
            &config,
            &train_images,
            &valid_images,
            &NdArrayDevice::default(),
        )?,
    };

    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }
    if !args.no_viewer && !pairs.is_empty() {
        show_reconstructions(pairs, "Autoencoder reconstructions")?;
    }
    Ok(report)
}

/// Train on `B`, then reconstruct up to [`VIEWER_SAMPLES`] images, taken
/// from the validation set when there is one.
pub fn fit<B: AutodiffBackend>(
    config: &TrainingConfig,
    train_images: &[GrayImage],
    valid_images: &[GrayImage],
    device: &B::Device,
) -> Result<(TrainingReport, Vec<(GrayImage, GrayImage)>)> {
    let (model, report) =
        train::<B>(config, train_images, valid_images, device).context("training failed")?;

    let source = if valid_images.is_empty() {
        train_images
    } else {
        valid_images
    };
    let samples = &source[..source.len().min(VIEWER_SAMPLES)];
    let rebuilt = reconstruct(&model.valid(), samples, device)
        .context("failed to reconstruct sample images")?;
    Ok((report, samples.iter().cloned().zip(rebuilt).collect()))
}

pub fn write_report(path: &Path, report: &TrainingReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    info!(path = %path.display(), "wrote training report");
    Ok(())
}
