// SPDX-License-Identifier: MIT OR Apache-2.0

//! Autoencoder training on MNIST
//!
//! Builds a symmetric convolutional autoencoder with burn, fits it with a
//! mean-squared reconstruction loss and reads reconstructions back as
//! [`GrayImage`]s for display.

pub mod data;
pub mod error;
pub mod model;
pub mod training;

pub use data::{images_to_tensor, load_mnist, split_dataset, split_indices, tensor_to_images, GrayImage};
pub use error::TrainerError;
pub use model::{Autoencoder, AutoencoderConfig};
pub use training::{evaluate, reconstruct, train, TrainingConfig, TrainingReport};
