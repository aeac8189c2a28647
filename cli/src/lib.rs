// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argument handling and run logic behind the `sgf-load` and
//! `train-autoencoder` binaries

pub mod logging;
pub mod sgf_load;
pub mod train;

pub use logging::init_logging;
