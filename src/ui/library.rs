//! Library side panel: stored croquis with previews, open and delete actions.

use super::rendering::paint_diagram;
use super::state::StagePlotApp;
use crate::thumbnail::{thumbnail_camera, thumbnail_size, Thumbnail};
use eframe::egui;
use uuid::Uuid;

/// Action picked in the library panel during one frame.
enum LibraryAction {
    Open(Uuid),
    Delete(Uuid),
}

impl StagePlotApp {
    /// Renders the library panel: save field, refresh button and the record list.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    pub fn draw_library_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Library");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.file.save_name).hint_text("Name"));
            let label = if self.file.current_record.is_some() {
                "Update"
            } else {
                "Save"
            };
            if ui.button(label).clicked() {
                self.save_to_library(ui.ctx());
            }
        });
        if self.file.current_record.is_some() && ui.small_button("Save as new").clicked() {
            self.file.current_record = None;
            self.save_to_library(ui.ctx());
        }
        ui.horizontal(|ui| {
            if ui.button("⟳ Refresh").clicked() {
                self.library.needs_refresh = true;
            }
            if self.library.loading {
                ui.spinner();
            }
        });
        ui.separator();

        let mut action = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            if self.library.entries.is_empty() && !self.library.loading {
                ui.label("No saved croquis yet.");
            }
            let current = self.file.current_record.as_ref().map(|r| r.id);
            for index in 0..self.library.entries.len() {
                let (summary, thumbnail) = &self.library.entries[index];
                let (id, name) = (summary.id, summary.name.clone());
                let created = summary.created_at.format("%Y-%m-%d %H:%M").to_string();
                let thumbnail = thumbnail.clone();

                ui.group(|ui| {
                    let title = if current == Some(id) {
                        egui::RichText::new(&name).strong()
                    } else {
                        egui::RichText::new(&name)
                    };
                    ui.label(title);
                    ui.small(created);
                    self.draw_thumbnail(ui, id, &thumbnail);
                    ui.horizontal(|ui| {
                        if ui.button("Open").clicked() {
                            action = Some(LibraryAction::Open(id));
                        }
                        if ui.button("Delete").clicked() {
                            action = Some(LibraryAction::Delete(id));
                        }
                    });
                });
            }
        });

        match action {
            Some(LibraryAction::Open(id)) => self.open_from_library(ui.ctx(), id),
            Some(LibraryAction::Delete(id)) => self.delete_from_library(ui.ctx(), id),
            None => {}
        }
    }

    /// Draws one preview box.
    ///
    /// Structured previews are painted live; snapshots are decoded once and cached as
    /// textures.
    fn draw_thumbnail(&mut self, ui: &mut egui::Ui, id: Uuid, thumbnail: &Thumbnail) {
        let width = self.settings.thumbnail_width.min(ui.available_width() as f64);
        let viewport = thumbnail_size(width, self.settings.thumbnail_max_height);
        let size = egui::vec2(viewport.width as f32, viewport.height as f32);

        match thumbnail {
            Thumbnail::Diagram(diagram) => {
                let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                let camera = thumbnail_camera(diagram, viewport);
                paint_diagram(ui.painter(), rect, diagram, &camera, None);
            }
            Thumbnail::Raster(png) => match self.snapshot_texture(ui.ctx(), id, png) {
                Some(texture) => {
                    ui.add(egui::Image::new((texture.id(), size)).maintain_aspect_ratio(true));
                }
                None => {
                    ui.allocate_exact_size(size, egui::Sense::hover());
                }
            },
            Thumbnail::Empty => {
                let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "No preview",
                    egui::FontId::proportional(12.0),
                    ui.visuals().weak_text_color(),
                );
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn snapshot_texture(&mut self, ctx: &egui::Context, id: Uuid, png: &[u8]) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.library.textures.get(&id) {
            return Some(texture.clone());
        }
        match crate::thumbnail::decode_png(png) {
            Ok((size, pixels)) => {
                let image = egui::ColorImage::from_rgba_premultiplied(size, &pixels);
                let texture = ctx.load_texture(format!("croquis-{}", id), image, egui::TextureOptions::LINEAR);
                self.library.textures.insert(id, texture.clone());
                Some(texture)
            }
            Err(e) => {
                log::warn!("Cannot decode snapshot of {}: {}", id, e);
                None
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn snapshot_texture(&mut self, _ctx: &egui::Context, _id: Uuid, _png: &[u8]) -> Option<egui::TextureHandle> {
        None
    }
}
