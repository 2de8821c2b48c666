//! egui front end: renders the current payload and pushes button presses and
//! caption edits into the session. Window resizes only re-run the layout math
//! against the cached texture; no file is touched until the user acts.

use crate::error::SessionError;
use crate::session::{CaptionSession, Direction, RenderPayload};
use egui::{Color32, RichText};
use image::GenericImageView;
use log::{debug, error};
use std::path::Path;

pub struct CaptionApp {
    session: CaptionSession,
    texture: Option<egui::TextureHandle>,
    display_name: String,
    resolution: String,
    page_label: String,
    status: Option<String>,
}

impl CaptionApp {
    pub fn new(session: CaptionSession) -> Self {
        Self {
            session,
            texture: None,
            display_name: String::new(),
            resolution: String::new(),
            page_label: String::new(),
            status: None,
        }
    }

    /// Re-renders whatever the session currently points at. Used at startup
    /// and after a folder load.
    pub fn reload_current(&mut self, ctx: &egui::Context) {
        match self.session.current_index() {
            Some(index) => match self.session.show(index) {
                Ok(payload) => self.apply_payload(ctx, payload),
                Err(err) => self.report_error(err),
            },
            None => self.clear_display(),
        }
    }

    fn apply_payload(&mut self, ctx: &egui::Context, payload: RenderPayload) {
        match load_texture(ctx, &payload.image_path) {
            Ok(texture) => self.texture = Some(texture),
            // keep the previous frame when the full decode fails
            Err(err) => self.report_error(err),
        }
        self.resolution = payload.resolution_label();
        self.display_name = payload.display_name;
        self.page_label = payload.page_label;
    }

    fn clear_display(&mut self) {
        self.texture = None;
        self.display_name.clear();
        self.resolution.clear();
        self.page_label.clear();
    }

    fn report_error(&mut self, err: SessionError) {
        error!("{err}");
        let message = err.to_string();
        match &mut self.status {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&message);
            }
            None => self.status = Some(message),
        }
    }

    fn open_folder_dialog(&mut self, ctx: &egui::Context) {
        // cancelling the dialog is a plain no-op
        let Some(dir) = rfd::FileDialog::new()
            .set_title("Select Image Folder")
            .pick_folder()
        else {
            return;
        };
        self.load_folder(ctx, &dir);
    }

    fn load_folder(&mut self, ctx: &egui::Context, dir: &Path) {
        self.status = None;
        match self.session.open_folder(dir) {
            Ok(count) => debug!("loaded {count} images from {}", dir.display()),
            Err(err) => self.report_error(err),
        }
        self.reload_current(ctx);
    }

    fn navigate(&mut self, ctx: &egui::Context, direction: Direction) {
        let Some(outcome) = self.session.advance(direction) else {
            return;
        };
        self.status = None;
        if let Some(err) = outcome.save_error {
            self.report_error(err);
        }
        match outcome.render {
            Ok(payload) => self.apply_payload(ctx, payload),
            Err(err) => self.report_error(err),
        }
    }

    fn save_caption(&mut self) {
        self.status = None;
        if let Err(err) = self.session.save() {
            self.report_error(err);
        }
    }
}

impl eframe::App for CaptionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let nav_enabled = self.session.nav_enabled();
        let save_enabled = self.session.save_enabled();

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let prev = ui.add_enabled(
                    nav_enabled,
                    egui::Button::new(RichText::new("Previous").color(Color32::WHITE).strong())
                        .fill(Color32::from_rgb(0xff, 0x00, 0x00))
                        .min_size(egui::vec2(120.0, 30.0)),
                );
                let load = ui.add(
                    egui::Button::new(RichText::new("Load Images").color(Color32::WHITE).strong())
                        .fill(Color32::from_rgb(0x00, 0x7a, 0xff))
                        .min_size(egui::vec2(120.0, 30.0)),
                );
                let next = ui.add_enabled(
                    nav_enabled,
                    egui::Button::new(RichText::new("Next").color(Color32::WHITE).strong())
                        .fill(Color32::from_rgb(0x4c, 0xaf, 0x50))
                        .min_size(egui::vec2(120.0, 30.0)),
                );
                let save = ui.add_enabled(
                    save_enabled,
                    egui::Button::new("Save").min_size(egui::vec2(120.0, 30.0)),
                );

                if prev.clicked() {
                    self.navigate(ctx, Direction::Previous);
                }
                if load.clicked() {
                    self.open_folder_dialog(ctx);
                }
                if next.clicked() {
                    self.navigate(ctx, Direction::Next);
                }
                if save.clicked() {
                    self.save_caption();
                }
            });
            ui.add_space(6.0);
        });

        egui::TopBottomPanel::bottom("caption_editor")
            .resizable(true)
            .default_height(140.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let mut caption = self.session.pending_text().to_owned();
                    let editor = egui::TextEdit::multiline(&mut caption)
                        .hint_text("Enter your text here...")
                        .desired_width(f32::INFINITY)
                        .desired_rows(6);
                    let response = ui.add_enabled(save_enabled, editor);
                    if response.changed() {
                        self.session.set_pending_text(caption);
                    }
                });
            });

        egui::TopBottomPanel::bottom("info_strip").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                info_group(ui, "Resolution", &self.resolution);
                ui.separator();
                info_group(ui, "Image Name", &self.display_name);
                ui.separator();
                info_group(ui, "Page", &self.page_label);
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(RichText::new(status).color(Color32::from_rgb(0xcc, 0x33, 0x33)));
                }
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                let available = ui.available_size();
                let tex_size = texture.size_vec2();
                let mut dw = available.x;
                let mut dh = (available.y - 10.0).max(1.0);
                let aspect = tex_size.x / tex_size.y;
                if dw / dh > aspect {
                    dw = dh * aspect;
                } else {
                    dh = dw / aspect;
                }
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(dw, dh)));
                });
            } else {
                ui.centered_and_justified(|ui| {
                    let hint = if self.session.is_empty() {
                        "Load a folder of images to begin."
                    } else {
                        "No image to display."
                    };
                    ui.label(hint);
                });
            }
        });
    }
}

fn info_group(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.vertical(|ui| {
        ui.label(RichText::new(label).strong());
        ui.label(value);
    });
}

fn load_texture(ctx: &egui::Context, path: &Path) -> Result<egui::TextureHandle, SessionError> {
    let dynimg = image::io::Reader::open(path)
        .map_err(|source| SessionError::ImageDecode {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(source),
        })?
        .decode()
        .map_err(|source| SessionError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;
    let (w, h) = dynimg.dimensions();
    let rgba = dynimg.to_rgba8();
    let pixels: Vec<u8> = rgba.into_vec();
    let color_image = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels);
    Ok(ctx.load_texture(path.to_string_lossy(), color_image, egui::TextureOptions::LINEAR))
}
