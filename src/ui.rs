// UI module for the acting game

use crate::emotion::Emotion;
use crate::image_manager::{ImageData, ImageManager};
use crate::models::Frame;
use crate::presentation::{Feedback, PresentationSink};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

/// Everything the game has pushed to the screen
#[derive(Default)]
struct UiState {
    prompt: String,
    feedback: String,
    display: Option<Arc<Frame>>,
    display_dirty: bool,
    reference: Option<Emotion>,
    results: Option<Vec<Arc<Frame>>>,
}

/// Presentation sink backed by shared UI state.
///
/// Setters only store values and request a repaint; textures are built on
/// the UI thread.
#[derive(Clone, Default)]
pub struct UiSink {
    state: Arc<Mutex<UiState>>,
    ctx: Arc<OnceLock<egui::Context>>,
}

impl UiSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects the sink to the running egui context
    pub fn attach(&self, ctx: egui::Context) {
        let _ = self.ctx.set(ctx);
    }

    fn update(&self, f: impl FnOnce(&mut UiState)) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
        if let Some(ctx) = self.ctx.get() {
            ctx.request_repaint();
        }
    }
}

impl PresentationSink for UiSink {
    fn set_prompt(&self, text: &str) {
        let text = text.to_string();
        self.update(|state| state.prompt = text);
    }

    fn set_feedback(&self, feedback: Feedback) {
        self.update(|state| state.feedback = feedback.text().to_string());
    }

    fn set_display(&self, frame: Arc<Frame>) {
        self.update(|state| {
            state.display = Some(frame);
            state.display_dirty = true;
        });
    }

    fn set_reference(&self, emotion: Emotion) {
        self.update(|state| state.reference = Some(emotion));
    }

    fn show_results(&self, images: Vec<Arc<Frame>>) {
        self.update(|state| state.results = Some(images));
    }
}

fn frame_texture(ctx: &egui::Context, name: &str, frame: &Frame) -> egui::TextureHandle {
    let color_image = egui::ColorImage::from_rgba_unmultiplied(
        [frame.width as usize, frame.height as usize],
        &frame.to_rgba(),
    );
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

fn image_texture(ctx: &egui::Context, name: &str, image: &ImageData) -> egui::TextureHandle {
    let color_image = egui::ColorImage::from_rgba_unmultiplied(
        [image.width as usize, image.height as usize],
        &image.rgba,
    );
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

/// Main application UI
pub struct ActingApp {
    sink: UiSink,
    image_manager: ImageManager,
    camera_texture: Option<egui::TextureHandle>,
    reference_texture: Option<(Emotion, egui::TextureHandle)>,
    result_textures: Option<Vec<egui::TextureHandle>>,
    prompt: String,
    feedback: String,
}

impl ActingApp {
    /// Creates a new ActingApp
    pub fn new(sink: UiSink, image_manager: ImageManager) -> Self {
        Self {
            sink,
            image_manager,
            camera_texture: None,
            reference_texture: None,
            result_textures: None,
            prompt: String::new(),
            feedback: String::new(),
        }
    }

    /// Copies pushed state into textures and labels
    fn sync_state(&mut self, ctx: &egui::Context) {
        let Ok(mut state) = self.sink.state.lock() else {
            return;
        };
        self.prompt.clone_from(&state.prompt);
        self.feedback.clone_from(&state.feedback);

        if state.display_dirty {
            state.display_dirty = false;
            if let Some(frame) = &state.display {
                self.camera_texture = Some(frame_texture(ctx, "camera", frame));
            }
        }

        if let Some(emotion) = state.reference {
            let current = self.reference_texture.as_ref().map(|(e, _)| *e);
            if current != Some(emotion) {
                let image = self.image_manager.image_for(emotion);
                self.reference_texture = Some((emotion, image_texture(ctx, "reference", image)));
            }
        }

        if self.result_textures.is_none() {
            if let Some(results) = &state.results {
                self.result_textures = Some(
                    results
                        .iter()
                        .enumerate()
                        .map(|(i, frame)| frame_texture(ctx, &format!("result-{i}"), frame))
                        .collect(),
                );
            }
        }
    }

    /// Renders the prompt and feedback labels
    fn render_header(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("prompt").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(&self.prompt);
                ui.label(egui::RichText::new(&self.feedback).size(20.0));
            });
        });
    }

    /// Renders the square camera view with the reference overlay
    fn render_camera_view(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let origin = ui.min_rect().min;

            if let Some(texture) = &self.camera_texture {
                let texture_size = texture.size_vec2();
                let scale = (available.x / texture_size.x).min(available.y / texture_size.y);
                let size = texture_size * scale;
                let offset = (available - size) / 2.0;

                ui.put(
                    egui::Rect::from_min_size(origin + offset, size),
                    egui::Image::new(texture).fit_to_exact_size(size),
                );
            }

            // Reference image overlay in top-right corner
            if let Some((_, texture)) = &self.reference_texture {
                let overlay = egui::vec2(160.0, 160.0);
                let padding = 20.0;
                let overlay_pos = origin + egui::vec2(available.x - overlay.x - padding, padding);
                ui.put(
                    egui::Rect::from_min_size(overlay_pos, overlay),
                    egui::Image::new(texture).fit_to_exact_size(overlay),
                );
            }
        });
    }

    /// Renders the captured faces once the game is over
    fn render_results(&self, ctx: &egui::Context, textures: &[egui::TextureHandle]) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("That's a wrap!");
            });
            ui.add_space(20.0);

            let count = textures.len().max(1) as f32;
            let side = ((ui.available_width() - 20.0 * count) / count)
                .min(ui.available_height() - 40.0)
                .max(16.0);
            ui.horizontal(|ui| {
                for (texture, emotion) in textures.iter().zip(Emotion::ALL) {
                    ui.vertical(|ui| {
                        ui.label(emotion.to_string());
                        ui.add(
                            egui::Image::new(texture).fit_to_exact_size(egui::vec2(side, side)),
                        );
                    });
                }
            });
        });
    }
}

impl eframe::App for ActingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_state(ctx);

        if let Some(textures) = &self.result_textures {
            self.render_results(ctx, textures);
            return;
        }

        self.render_header(ctx);
        self.render_camera_view(ctx);
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
