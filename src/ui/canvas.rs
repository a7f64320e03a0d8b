//! Canvas interaction: feeds egui pointer and wheel input into the diagram model.
//!
//! The model works in viewport pixels with the origin at the canvas' top-left
//! corner, so every screen position is made relative to the canvas rect first.

use super::rendering::paint_diagram;
use super::state::{DialogMode, StagePlotApp, SymbolDialog, SymbolForm};
use crate::camera::{Point, Viewport};
use crate::canvas::Gesture;
use crate::constants;
use eframe::egui;

/// Converts an egui screen position into viewport pixels of `rect`.
fn to_viewport(rect: egui::Rect, pos: egui::Pos2) -> Point {
    let local = pos - rect.min;
    Point::new(local.x as f64, local.y as f64)
}

impl StagePlotApp {
    /// Allocates the canvas, handles its input and paints the diagram.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI to draw into; the canvas takes all remaining space
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        self.canvas
            .set_viewport(Viewport::new(rect.width() as f64, rect.height() as f64));

        // While a dialog is open the canvas ignores the pointer.
        if self.dialog.is_none() {
            self.handle_canvas_zoom(ui, rect);
            self.handle_canvas_gestures(ui, rect);
        }

        let selected = self.canvas.selected().cloned();
        paint_diagram(
            &painter,
            rect,
            &self.canvas.diagram,
            self.canvas.camera(),
            selected.as_deref(),
        );

        if self.canvas.take_redraw() {
            ui.ctx().request_repaint();
        }
    }

    /// Zooms one step per wheel event about the cursor, if it is over the canvas.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `rect` - Screen rectangle of the canvas
    pub fn handle_canvas_zoom(&mut self, ui: &egui::Ui, rect: egui::Rect) {
        let (scroll, hover) = ui.input(|i| (i.raw_scroll_delta.y, i.pointer.hover_pos()));
        if scroll == 0.0 {
            return;
        }
        let Some(pos) = hover.filter(|p| rect.contains(*p)) else {
            return;
        };
        // egui reports wheel-away-from-user as positive; the model expects the opposite.
        self.canvas.zoom_wheel(to_viewport(rect, pos), -scroll as f64);
    }

    /// Drives the press / move / release gesture cycle with the primary button.
    ///
    /// A press on a symbol drags it and a press on empty canvas pans. A release
    /// that barely moved counts as a click: on a symbol it opens the edit dialog,
    /// on empty canvas it clears the selection.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `rect` - Screen rectangle of the canvas
    pub fn handle_canvas_gestures(&mut self, ui: &egui::Ui, rect: egui::Rect) {
        let (pressed, down, released, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });

        if pressed {
            if let Some(pos) = pos.filter(|p| rect.contains(*p)) {
                self.press_origin = Some(pos);
                self.canvas.begin_gesture(to_viewport(rect, pos));
            }
        }

        if down && *self.canvas.gesture() != Gesture::Idle {
            if let Some(pos) = pos {
                if matches!(self.canvas.gesture(), Gesture::Dragging { .. }) {
                    self.file.has_unsaved_changes = true;
                }
                self.canvas.gesture_move(to_viewport(rect, pos));
            }
        }

        if released {
            let was_click = match (self.press_origin.take(), pos) {
                (Some(origin), Some(pos)) => origin.distance(pos) < constants::CLICK_THRESHOLD,
                _ => false,
            };
            match self.canvas.end_gesture() {
                Some(id) if was_click => self.open_edit_dialog(&id),
                None if was_click => self.canvas.clear_selection(),
                _ => {}
            }
        }
    }

    /// Opens the edit dialog for an existing symbol.
    pub fn open_edit_dialog(&mut self, id: &str) {
        if let Some(symbol) = self.canvas.diagram.symbol(id) {
            self.dialog = Some(SymbolDialog {
                mode: DialogMode::Edit(symbol.id.clone()),
                form: SymbolForm::from_props(&symbol.props),
                error: None,
            });
        }
    }
}
