//! Export utilities: render a diagram to SVG and rasterize it to PNG.
//!
//! Notes:
//! - SVG generation is supported on all targets (native + wasm).
//! - PNG rasterization is supported on native targets only.

use crate::camera::{Camera, Viewport};
use crate::constants;
use crate::theme::{Palette, Rgba};
use crate::types::*;
use std::fmt::Write as _;

/// Errors raised while producing a raster export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The generated SVG could not be parsed by the rasterizer.
    #[error("failed to parse SVG: {0}")]
    Svg(String),
    /// A pixmap of the requested size could not be allocated.
    #[error("failed to create a {width}x{height} pixmap")]
    Pixmap {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    Encode(String),
    /// Raster export is not available on this target.
    #[error("PNG export is not supported on this platform")]
    Unsupported,
}

/// Builds an SVG document of `diagram` as seen through `camera` in `viewport`.
///
/// Coordinates are viewport pixels; the camera is applied as a group transform so
/// strokes and text scale with the zoom like they do on screen.
pub fn build_svg(diagram: &Diagram, camera: &Camera, viewport: Viewport) -> String {
    let palette = Palette::for_mode(diagram.mode);
    let width = viewport.width;
    let height = viewport.height;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = width,
        h = height
    );
    let _ = writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" {} />",
        width,
        height,
        fill_attr(palette.canvas)
    );
    let _ = writeln!(
        out,
        "<g transform=\"matrix({s} 0 0 {s} {tx} {ty})\" font-family=\"sans-serif\">",
        s = camera.scale,
        tx = camera.offset.x,
        ty = camera.offset.y
    );
    for symbol in &diagram.nodes {
        write_symbol(&mut out, symbol, palette);
    }
    let _ = writeln!(out, "</g>");
    let _ = writeln!(out, "</svg>");
    out
}

fn write_symbol(out: &mut String, symbol: &Symbol, palette: &Palette) {
    let (x, y) = (symbol.x, symbol.y);
    let stroke_width = constants::SYMBOL_STROKE_WIDTH;
    let _ = writeln!(out, "<g transform=\"translate({} {})\">", x, y);
    match &symbol.props {
        SymbolProps::Mic(mic) => {
            let (r, g, b) = mic.color.rgb();
            let _ = writeln!(
                out,
                "  <circle cx=\"0\" cy=\"0\" r=\"{}\" {} {} stroke-width=\"{}\" />",
                constants::MIC_RADIUS,
                fill_attr(Rgba::rgb(r, g, b)),
                stroke_attr(palette.mic_stroke),
                stroke_width
            );
        }
        SymbolProps::Instrument(instrument) => {
            let (w, h) = constants::INSTRUMENT_BOX;
            write_box(out, w, h, constants::INSTRUMENT_CORNER_RADIUS, palette);
            let _ = writeln!(
                out,
                "  <text x=\"0\" y=\"0\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" {}>{}</text>",
                constants::EMOJI_FONT_SIZE,
                fill_attr(palette.text),
                escape_xml(&instrument.emoji)
            );
        }
        SymbolProps::Monitor(_) => {
            let (w, h) = constants::MONITOR_BOX;
            write_box(out, w, h, constants::MONITOR_CORNER_RADIUS, palette);
        }
    }
    let _ = writeln!(
        out,
        "  <text x=\"0\" y=\"{}\" font-size=\"{}\" text-anchor=\"middle\" {}>{}</text>",
        constants::LABEL_OFFSET,
        constants::LABEL_FONT_SIZE,
        fill_attr(palette.text),
        escape_xml(&symbol.props.caption())
    );
    let channel = symbol.props.channel();
    if !channel.is_empty() {
        let _ = writeln!(
            out,
            "  <text x=\"0\" y=\"{}\" font-size=\"{}\" text-anchor=\"middle\" {}>{}</text>",
            constants::CHANNEL_LABEL_OFFSET,
            constants::CHANNEL_FONT_SIZE,
            fill_attr(palette.sub),
            escape_xml(channel)
        );
    }
    let _ = writeln!(out, "</g>");
}

fn write_box(out: &mut String, w: f64, h: f64, radius: f64, palette: &Palette) {
    let _ = writeln!(
        out,
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{r}\" ry=\"{r}\" {} {} stroke-width=\"{}\" />",
        -w / 2.0,
        -h / 2.0,
        w,
        h,
        fill_attr(palette.box_fill),
        stroke_attr(palette.box_stroke),
        constants::SYMBOL_STROKE_WIDTH,
        r = radius
    );
}

fn fill_attr(c: Rgba) -> String {
    format!("fill=\"{}\" fill-opacity=\"{:.3}\"", c.hex(), c.opacity())
}

fn stroke_attr(c: Rgba) -> String {
    format!("stroke=\"{}\" stroke-opacity=\"{:.3}\"", c.hex(), c.opacity())
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

/// Output size in pixels for a viewport exported at `density`.
pub fn raster_size(viewport: Viewport, density: f64) -> (u32, u32) {
    let density = clamp_density(density);
    let w = (viewport.width * density).round().max(1.0) as u32;
    let h = (viewport.height * density).round().max(1.0) as u32;
    (w, h)
}

fn clamp_density(density: f64) -> f64 {
    let (lo, hi) = constants::DENSITY_RANGE;
    if density.is_finite() {
        density.clamp(lo, hi)
    } else {
        1.0
    }
}

/// Renders `diagram` through `camera` into PNG bytes at `density` × the viewport size.
#[cfg(not(target_arch = "wasm32"))]
pub fn render_png(
    diagram: &Diagram,
    camera: &Camera,
    viewport: Viewport,
    density: f64,
) -> Result<Vec<u8>, ExportError> {
    use std::sync::Arc;
    use tiny_skia::Pixmap;

    let svg = build_svg(diagram, camera, viewport);

    let mut opt = usvg::Options::default();
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    opt.fontdb = Arc::new(db);

    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
        .map_err(|e| ExportError::Svg(e.to_string()))?;

    let (out_w, out_h) = raster_size(viewport, density);
    let mut pixmap = Pixmap::new(out_w, out_h).ok_or(ExportError::Pixmap {
        width: out_w,
        height: out_h,
    })?;

    let sx = out_w as f32 / viewport.width as f32;
    let sy = out_h as f32 / viewport.height as f32;
    let transform = tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    log::debug!("rendered {}x{} PNG for {} symbols", out_w, out_h, diagram.nodes.len());
    pixmap
        .encode_png()
        .map_err(|e| ExportError::Encode(e.to_string()))
}

/// Raster export is unavailable in the browser build.
#[cfg(target_arch = "wasm32")]
pub fn render_png(
    _diagram: &Diagram,
    _camera: &Camera,
    _viewport: Viewport,
    _density: f64,
) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::Unsupported)
}
