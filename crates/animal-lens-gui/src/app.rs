//! Single-screen application: camera button, preview and result label

use std::path::Path;

use animal_lens_app::config::Config;
use animal_lens_app::dispatch::Dispatcher;
use animal_lens_app::models::Classifiers;
use animal_lens_app::scanner::IMAGE_EXTENSIONS;
use animal_lens_app::screen::ClassificationScreen;
use animal_lens_app::source::{plan_picker, CaptureDevice, PendingCapture, PickerPlan, SourceAction};
use animal_lens_types::ImageSource;
use animal_lens_vision::PickedImage;
use eframe::egui::{self, Color32, RichText};

/// Main application state
pub struct AnimalLensApp {
    screen: ClassificationScreen,
    dispatcher: Dispatcher,
    camera: CaptureDevice,
    /// Camera command running in the background
    pending_capture: Option<PendingCapture>,
    /// Source-choice dialog, open while `Some`
    source_choice: Option<Vec<SourceAction>>,
    /// Preview texture for the current pick
    preview_texture: Option<egui::TextureHandle>,
}

impl AnimalLensApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config, classifiers: Classifiers) -> Self {
        let mut style = (*cc.egui_ctx.style()).clone();
        style.animation_time = 0.1;
        cc.egui_ctx.set_style(style);

        Self {
            screen: ClassificationScreen::new(config.format_rules()),
            dispatcher: Dispatcher::new(classifiers),
            camera: CaptureDevice::from_command(config.capture_command.clone()),
            pending_capture: None,
            source_choice: None,
            preview_texture: None,
        }
    }

    /// Camera button pressed
    fn request_picture(&mut self, ctx: &egui::Context) {
        match plan_picker(self.camera.is_available()) {
            PickerPlan::Direct(source) => self.present_picker(ctx, source),
            PickerPlan::Choice(actions) => self.source_choice = Some(actions),
        }
    }

    fn present_picker(&mut self, ctx: &egui::Context, source: ImageSource) {
        tracing::debug!(source = source.label(), "presenting picker");

        match source {
            ImageSource::Library => {
                // Cancelled pickers change nothing
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file()
                {
                    self.handle_pick(ctx, &path);
                }
            }
            ImageSource::Camera => {
                self.pending_capture = Some(self.camera.capture_in_background());
            }
        }
    }

    /// Check whether the camera command has finished
    fn poll_capture(&mut self, ctx: &egui::Context) {
        let Some(result) = self.pending_capture.as_ref().and_then(|c| c.poll()) else {
            return;
        };
        self.pending_capture = None;

        match result {
            Ok(Some(path)) => self.handle_pick(ctx, &path),
            Ok(None) => tracing::debug!("capture cancelled"),
            Err(e) => tracing::warn!(error = %e, "camera unavailable"),
        }
    }

    fn handle_pick(&mut self, ctx: &egui::Context, path: &Path) {
        if let Err(e) = self.screen.pick(path, &mut self.dispatcher) {
            if e.is_fatal() {
                tracing::error!(path = %path.display(), error = %e, "unrecoverable error, aborting");
                std::process::exit(2);
            }
            tracing::warn!(path = %path.display(), error = %e, "pick failed");
            return;
        }

        self.preview_texture = self
            .screen
            .preview()
            .map(|picked| load_preview_texture(ctx, picked));
    }

    fn render_source_choice(&mut self, ctx: &egui::Context) {
        let Some(actions) = self.source_choice.clone() else {
            return;
        };

        let mut chosen = None;
        egui::Window::new("Choose Image Source")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.vertical_centered_justified(|ui| {
                    for action in &actions {
                        if ui.button(RichText::new(action.title()).size(16.0)).clicked() {
                            chosen = Some(*action);
                        }
                    }
                });
            });

        if let Some(action) = chosen {
            self.source_choice = None;
            if let Some(source) = action.source() {
                self.present_picker(ctx, source);
            }
        }
    }

    fn render_preview(&self, ui: &mut egui::Ui) {
        let Some(ref texture) = self.preview_texture else {
            ui.add_space(40.0);
            ui.label(
                RichText::new("No photo yet")
                    .italics()
                    .color(Color32::GRAY),
            );
            return;
        };

        ui.add(
            egui::Image::new(texture)
                .max_size(ui.available_size() * egui::vec2(1.0, 0.7))
                .maintain_aspect_ratio(true),
        );
    }

    fn render_label(&self, ui: &mut egui::Ui) {
        egui::Frame::new()
            .fill(Color32::from_black_alpha(160))
            .inner_margin(12.0)
            .corner_radius(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(self.screen.label())
                        .size(18.0)
                        .color(Color32::WHITE),
                );
            });

        if self.screen.is_classifying() {
            return;
        }
        if let Some(report) = self.screen.last_report() {
            ui.label(
                RichText::new(format!("Classified in {} ms", report.elapsed_ms))
                    .small()
                    .color(Color32::GRAY),
            );
        }
    }
}

/// Upload the upright preview pixels as a texture
fn load_preview_texture(ctx: &egui::Context, picked: &PickedImage) -> egui::TextureHandle {
    let rgba = picked.upright().to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    ctx.load_texture(picked.file_name(), color_image, egui::TextureOptions::LINEAR)
}

impl eframe::App for AnimalLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_capture(ctx);
        self.screen.poll();
        if self.screen.is_classifying() || self.pending_capture.is_some() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                let enabled = self.source_choice.is_none() && self.pending_capture.is_none();
                let button = egui::Button::new(RichText::new("Take Photo").size(18.0));
                if ui.add_enabled(enabled, button).clicked() {
                    self.request_picture(ctx);
                }
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                self.render_preview(ui);
                ui.add_space(10.0);
                self.render_label(ui);
                if self.screen.is_classifying() || self.pending_capture.is_some() {
                    ui.add_space(6.0);
                    ui.spinner();
                }
            });
        });

        self.render_source_choice(ctx);
    }
}
