//! User interface components and rendering logic for the croquis editor.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main StagePlotApp
//! - `file_ops` - JSON save/load, PNG export and library calls for native and WASM
//! - `canvas` - Pointer gestures and wheel zoom on the canvas
//! - `rendering` - Drawing symbols, labels and the selection outline
//! - `library` - The stored croquis panel with previews

mod canvas;
mod file_ops;
mod library;
mod rendering;
mod state;

#[cfg(test)]
mod tests;

pub use state::StagePlotApp;

use self::state::{DialogMode, StatusMessage, SymbolDialog, SymbolForm, DIAGRAM_KEY};
use crate::settings::SETTINGS_KEY;
use crate::types::*;
use eframe::egui;

impl eframe::App for StagePlotApp {
    /// Persist the settings and the open diagram between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.settings.to_json() {
            Ok(json) => storage.set_string(SETTINGS_KEY, json),
            Err(err) => log::error!("Failed to serialize settings: {err}"),
        }
        match self.canvas.diagram.to_json() {
            Ok(json) => storage.set_string(DIAGRAM_KEY, json),
            Err(err) => log::error!("Failed to serialize diagram: {err}"),
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// Lays out the toolbar, the status line, the library panel and the canvas,
    /// and processes finished background operations.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `_frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = match self.canvas.diagram.mode {
            DisplayMode::Dark => egui::Visuals::dark(),
            DisplayMode::Light => egui::Visuals::light(),
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);
        self.handle_delete_key(ctx);
        self.handle_file_shortcuts(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_line").show(ctx, |ui| {
            self.draw_status_line(ui);
        });

        if self.settings.show_library {
            egui::SidePanel::right("library_panel")
                .resizable(true)
                .default_width(self.settings.thumbnail_width as f32 + 24.0)
                .show(ctx, |ui| {
                    self.draw_library_panel(ui);
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });

        self.draw_symbol_dialog(ctx);
    }
}

impl StagePlotApp {
    /// Removes the selected symbol when Delete or Backspace is pressed outside text fields.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for checking input
    fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || self.dialog.is_some() {
            return;
        }
        let pressed = ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace));
        if !pressed {
            return;
        }
        if let Some(id) = self.canvas.selected().cloned() {
            self.canvas.delete_symbol(&id);
            self.file.has_unsaved_changes = true;
        }
    }

    /// Handles Cmd/Ctrl shortcuts: S saves to the library, O opens a document and
    /// N starts a new one.
    fn handle_file_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (save, open, new) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            (
                cmd && i.key_pressed(egui::Key::S),
                cmd && i.key_pressed(egui::Key::O),
                cmd && i.key_pressed(egui::Key::N),
            )
        });
        if save {
            self.save_to_library(ctx);
        }
        if open {
            self.open_document();
        }
        if new {
            self.new_document();
        }
    }

    /// Renders the toolbar: symbol buttons, view controls and file actions.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("🎤 Mic").clicked() {
                self.open_create_dialog(SymbolKind::Mic);
            }
            if ui.button("🎸 Instrument").clicked() {
                self.open_create_dialog(SymbolKind::Instrument);
            }
            if ui.button("🔊 Monitor").clicked() {
                self.open_create_dialog(SymbolKind::Monitor);
            }

            ui.separator();

            if ui.button("Center").clicked() {
                self.canvas.fit_to_content();
            }
            let theme_label = match self.canvas.diagram.mode {
                DisplayMode::Dark => "☀ Light",
                DisplayMode::Light => "🌙 Dark",
            };
            if ui.button(theme_label).clicked() {
                self.toggle_mode();
            }
            if ui.button("Export PNG").clicked() {
                self.export_png();
            }

            ui.separator();

            if ui.button("New").clicked() {
                self.new_document();
            }
            if ui.button("Open").clicked() {
                self.open_document();
            }
            if ui.button("Save").clicked() {
                self.save_document();
            }
            if ui.button("Save As").clicked() {
                self.save_as_document();
            }

            ui.separator();
            ui.checkbox(&mut self.settings.show_library, "Library");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let title = match (&self.file.current_record, &self.file.current_path) {
                    (Some(record), _) => record.name.clone(),
                    (None, Some(path)) => path.clone(),
                    (None, None) => "Untitled".to_string(),
                };
                let marker = if self.file.has_unsaved_changes { "*" } else { "" };
                ui.label(format!("{}{}", title, marker));
                ui.label(format!("Zoom: {:.0}%", self.canvas.camera().scale * 100.0));
            });
        });
    }

    fn draw_status_line(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("{} symbols", self.canvas.diagram.nodes.len()));
            if let Some(status) = &self.status {
                ui.separator();
                let text = egui::RichText::new(&status.text);
                let text = if status.is_error {
                    text.color(ui.visuals().error_fg_color)
                } else {
                    text
                };
                ui.label(text);
            }
        });
    }

    /// Switches between light and dark display mode.
    pub fn toggle_mode(&mut self) {
        self.canvas.diagram.mode = self.canvas.diagram.mode.toggled();
        self.file.has_unsaved_changes = true;
    }

    /// Opens the creation dialog for a symbol kind.
    pub fn open_create_dialog(&mut self, kind: SymbolKind) {
        self.dialog = Some(SymbolDialog {
            mode: DialogMode::Create,
            form: SymbolForm::new(kind),
            error: None,
        });
    }

    /// Validates the dialog form and applies it: adds a new symbol or edits the
    /// target symbol. On a validation error the dialog stays open with the message.
    pub fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let props = match dialog.form.to_props() {
            Ok(props) => props,
            Err(message) => {
                dialog.error = Some(message);
                return;
            }
        };
        match dialog.mode.clone() {
            DialogMode::Create => {
                let symbol = self.canvas.add_symbol(props);
                log::debug!("Added {:?} {}", symbol.kind(), symbol.id);
            }
            DialogMode::Edit(id) => {
                self.canvas.edit_symbol(&id, props);
            }
        }
        self.file.has_unsaved_changes = true;
        self.dialog = None;
    }

    /// Deletes the symbol the edit dialog is open for.
    pub fn delete_dialog_symbol(&mut self) {
        if let Some(SymbolDialog {
            mode: DialogMode::Edit(id),
            ..
        }) = self.dialog.take()
        {
            if self.canvas.delete_symbol(&id).is_some() {
                self.file.has_unsaved_changes = true;
                self.set_status(StatusMessage::info("Symbol deleted"));
            }
        }
    }

    /// Renders the create/edit dialog when one is open.
    fn draw_symbol_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let editing = matches!(dialog.mode, DialogMode::Edit(_));
        let title = match (dialog.form.kind(), editing) {
            (SymbolKind::Mic, false) => "New microphone",
            (SymbolKind::Instrument, false) => "New instrument",
            (SymbolKind::Monitor, false) => "New monitor",
            (SymbolKind::Mic, true) => "Edit microphone",
            (SymbolKind::Instrument, true) => "Edit instrument",
            (SymbolKind::Monitor, true) => "Edit monitor",
        };

        let mut submit = false;
        let mut delete = false;
        let mut cancel = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                draw_form_fields(ui, &mut dialog.form);
                if let Some(error) = &dialog.error {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        submit = true;
                    }
                    if editing && ui.button("Delete").clicked() {
                        delete = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
                if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
            });

        if submit {
            self.submit_dialog();
        } else if delete {
            self.delete_dialog_symbol();
        } else if cancel || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.dialog = None;
        }
    }
}

/// Draws the kind-specific fields of the symbol dialog.
fn draw_form_fields(ui: &mut egui::Ui, form: &mut SymbolForm) {
    egui::Grid::new("symbol_form").num_columns(2).show(ui, |ui| match form {
        SymbolForm::Mic {
            color,
            name,
            channel,
        } => {
            ui.label("Color");
            egui::ComboBox::from_id_salt("mic_color")
                .selected_text(color.name())
                .show_ui(ui, |ui| {
                    for option in MicColor::ALL {
                        ui.selectable_value(color, option, option.name());
                    }
                });
            ui.end_row();
            ui.label("Name");
            ui.text_edit_singleline(name);
            ui.end_row();
            ui.label("Channel");
            ui.text_edit_singleline(channel);
            ui.end_row();
        }
        SymbolForm::Instrument {
            instrument,
            channel,
        } => {
            ui.label("Instrument");
            egui::ComboBox::from_id_salt("instrument_type")
                .selected_text(format!("{} {}", instrument.emoji(), instrument.label()))
                .show_ui(ui, |ui| {
                    for option in InstrumentType::ALL {
                        ui.selectable_value(
                            instrument,
                            option,
                            format!("{} {}", option.emoji(), option.label()),
                        );
                    }
                });
            ui.end_row();
            ui.label("Channel");
            ui.text_edit_singleline(channel);
            ui.end_row();
        }
        SymbolForm::Monitor {
            number,
            group,
            channel,
        } => {
            ui.label("Number");
            ui.text_edit_singleline(number);
            ui.end_row();
            ui.label("Group");
            egui::ComboBox::from_id_salt("monitor_group")
                .selected_text(group.name())
                .show_ui(ui, |ui| {
                    for option in MonitorGroup::ALL {
                        ui.selectable_value(group, option, option.name());
                    }
                });
            ui.end_row();
            ui.label("Channel");
            ui.text_edit_singleline(channel);
            ui.end_row();
        }
    });
}
