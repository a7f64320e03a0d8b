//! Light and dark palettes shared by the on-screen canvas, thumbnails and export.

use crate::types::DisplayMode;

/// An sRGB color with straight (unpremultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb` form, without alpha.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a 0..=1 opacity.
    pub fn opacity(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Conversion for egui painters.
    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

/// Colors for one display mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Canvas background
    pub canvas: Rgba,
    /// Symbol box fill
    pub box_fill: Rgba,
    /// Symbol box outline
    pub box_stroke: Rgba,
    /// Primary label text
    pub text: Rgba,
    /// Secondary (channel) label text
    pub sub: Rgba,
    /// Microphone disc outline
    pub mic_stroke: Rgba,
}

const LIGHT: Palette = Palette {
    canvas: Rgba::rgb(0xf8, 0xfa, 0xfc),
    box_fill: Rgba::rgb(0xff, 0xff, 0xff),
    box_stroke: Rgba::rgb(0xcb, 0xd5, 0xe1),
    text: Rgba::rgb(0x11, 0x18, 0x27),
    sub: Rgba::rgb(0x6b, 0x72, 0x80),
    mic_stroke: Rgba::rgb(0x0f, 0x17, 0x2a),
};

const DARK: Palette = Palette {
    canvas: Rgba::rgb(0x0b, 0x0f, 0x1a),
    box_fill: Rgba::rgba(0xff, 0xff, 0xff, 15),
    box_stroke: Rgba::rgba(0xff, 0xff, 0xff, 51),
    text: Rgba::rgb(0xe5, 0xe7, 0xeb),
    sub: Rgba::rgb(0x9c, 0xa3, 0xaf),
    mic_stroke: Rgba::rgb(0xe5, 0xe7, 0xeb),
};

impl Palette {
    /// Palette for the given mode.
    pub fn for_mode(mode: DisplayMode) -> &'static Palette {
        match mode {
            DisplayMode::Light => &LIGHT,
            DisplayMode::Dark => &DARK,
        }
    }
}
