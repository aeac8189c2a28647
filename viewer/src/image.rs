// SPDX-License-Identifier: MIT OR Apache-2.0

use egui::ColorImage;
use gotrain_trainer::GrayImage;

/// 8-bit grayscale copy of `image`. Values outside `[0, 1]` are clamped,
/// NaN renders black.
pub fn to_color_image(image: &GrayImage) -> ColorImage {
    let bytes: Vec<u8> = image
        .pixels
        .iter()
        .map(|&v| {
            let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
            (v * 255.0).round() as u8
        })
        .collect();
    ColorImage::from_gray([image.width, image.height], &bytes)
}
