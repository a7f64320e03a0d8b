//! Canvas rendering for symbols, labels and the selection outline.
//!
//! Drawing works from a [`Camera`] and a screen rectangle, so the same code paints
//! the editor canvas and the structured previews in the library panel.

use crate::camera::{Camera, Point};
use crate::canvas::symbol_bounds;
use crate::constants;
use crate::theme::{Palette, Rgba};
use crate::types::*;
use eframe::egui;
use eframe::epaint::StrokeKind;

/// Labels smaller than this (in points) are skipped.
const MIN_TEXT_SIZE: f32 = 2.0;

/// Maps a world point into `rect` through `camera`.
fn to_screen(camera: &Camera, rect: egui::Rect, world: Point) -> egui::Pos2 {
    let p = camera.world_to_screen(world);
    rect.min + egui::vec2(p.x as f32, p.y as f32)
}

/// Paints the whole diagram (background, symbols, labels) into `rect`.
///
/// # Arguments
///
/// * `painter` - The egui painter for drawing operations
/// * `rect` - The screen-space rectangle standing in for the viewport
/// * `diagram` - The diagram to draw
/// * `camera` - Camera mapping world coordinates into `rect`
/// * `selected` - Symbol to outline, if any
pub fn paint_diagram(
    painter: &egui::Painter,
    rect: egui::Rect,
    diagram: &Diagram,
    camera: &Camera,
    selected: Option<&str>,
) {
    let palette = Palette::for_mode(diagram.mode);
    let painter = painter.with_clip_rect(rect);
    painter.rect_filled(rect, 0.0, palette.canvas.to_color32());

    for symbol in &diagram.nodes {
        paint_symbol(&painter, rect, camera, symbol, palette);
    }

    if let Some(symbol) = selected.and_then(|id| diagram.symbol(id)) {
        let bounds = symbol_bounds(symbol).expanded(constants::SELECTION_MARGIN);
        let outline = egui::Rect::from_min_max(
            to_screen(camera, rect, bounds.min),
            to_screen(camera, rect, bounds.max),
        );
        let (r, g, b) = constants::SELECTION_COLOR;
        painter.rect_stroke(
            outline,
            4.0,
            egui::Stroke::new(1.5, egui::Color32::from_rgb(r, g, b)),
            StrokeKind::Outside,
        );
    }
}

/// Draws one symbol body and its labels.
fn paint_symbol(
    painter: &egui::Painter,
    rect: egui::Rect,
    camera: &Camera,
    symbol: &Symbol,
    palette: &Palette,
) {
    let scale = camera.scale as f32;
    let center = to_screen(camera, rect, Point::new(symbol.x, symbol.y));
    let stroke_width = constants::SYMBOL_STROKE_WIDTH as f32 * scale;

    match &symbol.props {
        SymbolProps::Mic(mic) => {
            let (r, g, b) = mic.color.rgb();
            let radius = constants::MIC_RADIUS as f32 * scale;
            painter.circle(
                center,
                radius,
                Rgba::rgb(r, g, b).to_color32(),
                egui::Stroke::new(stroke_width, palette.mic_stroke.to_color32()),
            );
        }
        SymbolProps::Instrument(instrument) => {
            paint_box(
                painter,
                center,
                constants::INSTRUMENT_BOX,
                constants::INSTRUMENT_CORNER_RADIUS,
                scale,
                palette,
            );
            paint_text(
                painter,
                center,
                egui::Align2::CENTER_CENTER,
                &instrument.emoji,
                constants::EMOJI_FONT_SIZE as f32 * scale,
                palette.text,
            );
        }
        SymbolProps::Monitor(_) => {
            paint_box(
                painter,
                center,
                constants::MONITOR_BOX,
                constants::MONITOR_CORNER_RADIUS,
                scale,
                palette,
            );
        }
    }

    // Label offsets are baselines; egui anchors text by its box, so shift up by the size.
    let label_size = constants::LABEL_FONT_SIZE as f32 * scale;
    let label_pos = center + egui::vec2(0.0, constants::LABEL_OFFSET as f32 * scale - label_size);
    paint_text(
        painter,
        label_pos,
        egui::Align2::CENTER_TOP,
        &symbol.props.caption(),
        label_size,
        palette.text,
    );

    let channel = symbol.props.channel();
    if !channel.is_empty() {
        let channel_size = constants::CHANNEL_FONT_SIZE as f32 * scale;
        let channel_pos =
            center + egui::vec2(0.0, constants::CHANNEL_LABEL_OFFSET as f32 * scale - channel_size);
        paint_text(
            painter,
            channel_pos,
            egui::Align2::CENTER_TOP,
            channel,
            channel_size,
            palette.sub,
        );
    }
}

fn paint_box(
    painter: &egui::Painter,
    center: egui::Pos2,
    (w, h): (f64, f64),
    corner_radius: f64,
    scale: f32,
    palette: &Palette,
) {
    let size = egui::vec2(w as f32 * scale, h as f32 * scale);
    let body = egui::Rect::from_center_size(center, size);
    let radius = corner_radius as f32 * scale;
    painter.rect_filled(body, radius, palette.box_fill.to_color32());
    painter.rect_stroke(
        body,
        radius,
        egui::Stroke::new(constants::SYMBOL_STROKE_WIDTH as f32 * scale, palette.box_stroke.to_color32()),
        StrokeKind::Inside,
    );
}

fn paint_text(
    painter: &egui::Painter,
    pos: egui::Pos2,
    anchor: egui::Align2,
    text: &str,
    size: f32,
    color: Rgba,
) {
    if size < MIN_TEXT_SIZE || text.is_empty() {
        return;
    }
    painter.text(
        pos,
        anchor,
        text,
        egui::FontId::proportional(size),
        color.to_color32(),
    );
}
