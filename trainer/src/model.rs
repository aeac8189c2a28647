// SPDX-License-Identifier: MIT OR Apache-2.0

//! Convolutional autoencoder
//!
//! The encoder is a stack of unpadded 3x3 convolutions, widening the channel
//! count `base * 2^i` at each level before collapsing to the latent channels;
//! the decoder mirrors it with transposed convolutions. With the defaults a
//! 28x28 image encodes to 20x20 and decodes back to 28x28.

use crate::error::TrainerError;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::loss::{MseLoss, Reduction};
use burn::nn::Relu;
use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

/// Layer shapes for [`Autoencoder`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoencoderConfig {
    pub in_channels: usize,
    pub latent_channels: usize,
    /// Channels of the first hidden level
    pub base_channels: usize,
    /// Number of widening levels after the first hidden level
    pub depth: usize,
    pub kernel_size: usize,
}

impl Default for AutoencoderConfig {
    fn default() -> Self {
        Self {
            in_channels: 1,
            latent_channels: 1,
            base_channels: 4,
            depth: 2,
            kernel_size: 3,
        }
    }
}

impl AutoencoderConfig {
    /// Hidden channel counts, e.g. `[4, 8, 16]` for the defaults
    pub fn channel_ladder(&self) -> Vec<usize> {
        (0..=self.depth)
            .map(|level| self.base_channels << level)
            .collect()
    }

    /// Pixels the encoder removes from each side length
    pub fn trim(&self) -> usize {
        (self.depth + 2) * self.kernel_size.saturating_sub(1)
    }

    /// Latent `(width, height)` for an input of the given size
    pub fn latent_size(&self, width: usize, height: usize) -> Result<(usize, usize), TrainerError> {
        let trim = self.trim();
        if width <= trim || height <= trim {
            return Err(TrainerError::ImageTooSmall {
                width,
                height,
                trim,
            });
        }
        Ok((width - trim, height - trim))
    }

    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.in_channels == 0 || self.latent_channels == 0 || self.base_channels == 0 {
            return Err(TrainerError::InvalidConfig(
                "channel counts must be positive".to_string(),
            ));
        }
        if self.kernel_size == 0 {
            return Err(TrainerError::InvalidConfig(
                "kernel_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a freshly initialised model on `device`
    pub fn init<B: Backend>(&self, device: &B::Device) -> Autoencoder<B> {
        let kernel = [self.kernel_size, self.kernel_size];
        let ladder = self.channel_ladder();
        let deepest = ladder[ladder.len() - 1];

        let mut encoder = vec![Conv2dConfig::new([self.in_channels, ladder[0]], kernel).init(device)];
        for pair in ladder.windows(2) {
            encoder.push(Conv2dConfig::new([pair[0], pair[1]], kernel).init(device));
        }
        encoder.push(Conv2dConfig::new([deepest, self.latent_channels], kernel).init(device));

        let mut decoder =
            vec![ConvTranspose2dConfig::new([self.latent_channels, deepest], kernel).init(device)];
        for pair in ladder.windows(2).rev() {
            decoder.push(ConvTranspose2dConfig::new([pair[1], pair[0]], kernel).init(device));
        }
        decoder.push(ConvTranspose2dConfig::new([ladder[0], self.in_channels], kernel).init(device));

        Autoencoder {
            encoder,
            decoder,
            activation: Relu::new(),
            trim: self.trim(),
        }
    }
}

/// Symmetric convolutional autoencoder
#[derive(Module, Debug)]
pub struct Autoencoder<B: Backend> {
    encoder: Vec<Conv2d<B>>,
    decoder: Vec<ConvTranspose2d<B>>,
    activation: Relu,
    /// Pixels the encoder removes from each side length
    trim: usize,
}

impl<B: Backend> Autoencoder<B> {
    pub fn trim(&self) -> usize {
        self.trim
    }

    /// Fail unless `width x height` images survive the encoder
    pub fn check_input(&self, width: usize, height: usize) -> Result<(), TrainerError> {
        if width <= self.trim || height <= self.trim {
            return Err(TrainerError::ImageTooSmall {
                width,
                height,
                trim: self.trim,
            });
        }
        Ok(())
    }

    /// `[batch, in, h, w]` to `[batch, latent, h - trim, w - trim]`.
    /// Every layer but the last is followed by a ReLU.
    pub fn encode(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let last = self.encoder.len() - 1;
        let mut x = input;
        for (i, conv) in self.encoder.iter().enumerate() {
            x = conv.forward(x);
            if i < last {
                x = self.activation.forward(x);
            }
        }
        x
    }

    /// Inverse of [`Self::encode`]. Only the inner layers carry a ReLU; the
    /// first expands the latent linearly and the last emits raw pixels.
    pub fn decode(&self, latent: Tensor<B, 4>) -> Tensor<B, 4> {
        let last = self.decoder.len() - 1;
        let mut x = latent;
        for (i, deconv) in self.decoder.iter().enumerate() {
            x = deconv.forward(x);
            if i > 0 && i < last {
                x = self.activation.forward(x);
            }
        }
        x
    }

    /// Reconstruction of `input`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.decode(self.encode(input))
    }

    /// Mean squared error between `input` and its reconstruction
    pub fn reconstruction_loss(&self, input: Tensor<B, 4>) -> Tensor<B, 1> {
        let reconstruction = self.forward(input.clone());
        MseLoss::new().forward(reconstruction, input, Reduction::Mean)
    }
}
