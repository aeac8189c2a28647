// SPDX-License-Identifier: MIT OR Apache-2.0

//! Original/reconstruction pair browser

use crate::image::to_color_image;
use anyhow::{anyhow, Result};
use eframe::egui;
use gotrain_trainer::GrayImage;
use tracing::info;

/// On-screen size of one side of each image
const DISPLAY_SIDE: f32 = 280.0;

struct PairTextures {
    original: egui::TextureHandle,
    reconstruction: egui::TextureHandle,
}

/// Shows one `(original, reconstruction)` pair at a time
pub struct ReconstructionViewer {
    pairs: Vec<(GrayImage, GrayImage)>,
    index: usize,
    textures: Vec<Option<PairTextures>>,
}

impl ReconstructionViewer {
    pub fn new(pairs: Vec<(GrayImage, GrayImage)>) -> Self {
        let textures = pairs.iter().map(|_| None).collect();
        Self {
            pairs,
            index: 0,
            textures,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Index of the pair on screen
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move by `delta` pairs, stopping at either end
    pub fn step(&mut self, delta: isize) {
        let last = self.pairs.len().saturating_sub(1);
        self.index = self.index.saturating_add_signed(delta).min(last);
    }

    fn textures(&mut self, ctx: &egui::Context) -> Option<&PairTextures> {
        let index = self.index;
        let (original, reconstruction) = self.pairs.get(index)?;
        let slot = self.textures.get_mut(index)?;
        if slot.is_none() {
            *slot = Some(PairTextures {
                original: ctx.load_texture(
                    format!("original-{index}"),
                    to_color_image(original),
                    egui::TextureOptions::NEAREST,
                ),
                reconstruction: ctx.load_texture(
                    format!("reconstruction-{index}"),
                    to_color_image(reconstruction),
                    egui::TextureOptions::NEAREST,
                ),
            });
        }
        slot.as_ref()
    }
}

impl eframe::App for ReconstructionViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
            self.step(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
            self.step(-1);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.is_empty() {
                ui.label("No images to show");
                return;
            }

            ui.horizontal(|ui| {
                let last = self.len() - 1;
                ui.add(egui::Slider::new(&mut self.index, 0..=last).text("image"));
                ui.label("(Left/Right to step)");
            });
            ui.separator();

            let size = egui::vec2(DISPLAY_SIDE, DISPLAY_SIDE);
            if let Some(textures) = self.textures(ctx) {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.label("Original");
                        ui.image((textures.original.id(), size));
                    });
                    ui.vertical(|ui| {
                        ui.label("Reconstruction");
                        ui.image((textures.reconstruction.id(), size));
                    });
                });
            }
        });
    }
}

/// Open a window over `pairs` and block until it is closed
pub fn show_reconstructions(pairs: Vec<(GrayImage, GrayImage)>, title: &str) -> Result<()> {
    info!(pairs = pairs.len(), "opening reconstruction viewer");
    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(2.0 * DISPLAY_SIDE + 60.0, DISPLAY_SIDE + 110.0)),
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| Box::new(ReconstructionViewer::new(pairs))),
    )
    .map_err(|e| anyhow!("viewer window failed: {e}"))
}
