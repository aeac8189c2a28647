// SPDX-License-Identifier: MIT OR Apache-2.0

//! Desktop window for eyeballing autoencoder reconstructions

pub mod app;
pub mod image;

pub use app::{show_reconstructions, ReconstructionViewer};
pub use image::to_color_image;
