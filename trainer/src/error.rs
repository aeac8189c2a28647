// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing data for, running or reading back the autoencoder
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("cannot take {train} training and {valid} validation samples from {available}")]
    InvalidSplit {
        train: usize,
        valid: usize,
        available: usize,
    },

    #[error("dataset has no item at index {index}")]
    MissingItem { index: usize },

    #[error("image has {actual} pixels but is declared {width}x{height}")]
    PixelCount {
        width: usize,
        height: usize,
        actual: usize,
    },

    #[error("image {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    MixedSizes {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("{width}x{height} images are too small for a model that trims {trim} pixels per side length")]
    ImageTooSmall {
        width: usize,
        height: usize,
        trim: usize,
    },

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("tensor conversion failed: {0}")]
    Tensor(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid training config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
