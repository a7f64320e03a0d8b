//! Shared application-wide constants.
//! Centralizes tweakable values used across the canvas model, rendering and export.

// Camera
/// Multiplicative zoom factor applied per wheel tick.
pub const ZOOM_STEP: f64 = 1.05;
/// Default lower bound for the camera scale.
pub const MIN_SCALE: f64 = 0.02;
/// Default upper bound for the camera scale.
pub const MAX_SCALE: f64 = 50.0;

// Fitting
/// Padding (in world units) added on every side of the symbol bounds by "center view".
pub const FIT_PADDING: f64 = 60.0;
/// Padding (in world units) used when fitting a stored diagram into a thumbnail.
pub const THUMBNAIL_PADDING: f64 = 40.0;
/// Reference thumbnail width; height follows at `THUMBNAIL_ASPECT_H / THUMBNAIL_ASPECT_W`.
pub const THUMBNAIL_ASPECT_W: f64 = 900.0;
/// Reference thumbnail height.
pub const THUMBNAIL_ASPECT_H: f64 = 520.0;
/// Default cap on thumbnail height in pixels.
pub const THUMBNAIL_MAX_HEIGHT: f64 = 420.0;

// Viewport
/// Viewport width used before the first layout pass reports a real size.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 800.0;
/// Viewport height used before the first layout pass reports a real size.
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 600.0;

// Symbol geometry (world units, centered on the symbol position)
/// Radius of the microphone disc.
pub const MIC_RADIUS: f64 = 17.0;
/// Width and height of the instrument box.
pub const INSTRUMENT_BOX: (f64, f64) = (49.0, 39.0);
/// Corner radius of the instrument box.
pub const INSTRUMENT_CORNER_RADIUS: f64 = 7.0;
/// Width and height of the monitor wedge box.
pub const MONITOR_BOX: (f64, f64) = (57.0, 39.0);
/// Corner radius of the monitor wedge box.
pub const MONITOR_CORNER_RADIUS: f64 = 8.0;
/// Stroke width of symbol outlines.
pub const SYMBOL_STROKE_WIDTH: f64 = 2.0;
/// Vertical offset of the primary label baseline below the symbol center.
pub const LABEL_OFFSET: f64 = 28.0;
/// Vertical offset of the channel label below the symbol center.
pub const CHANNEL_LABEL_OFFSET: f64 = 41.0;
/// Font size for primary labels.
pub const LABEL_FONT_SIZE: f64 = 11.0;
/// Font size for channel labels.
pub const CHANNEL_FONT_SIZE: f64 = 9.0;
/// Font size for instrument emoji.
pub const EMOJI_FONT_SIZE: f64 = 16.0;

// Export
/// Pixel density used for snapshots persisted with a saved croquis.
pub const SNAPSHOT_DENSITY: f64 = 2.0;
/// Accepted range for the export density multiplier.
pub const DENSITY_RANGE: (f64, f64) = (0.25, 8.0);

// Selection
/// Color of the selection outline.
pub const SELECTION_COLOR: (u8, u8, u8) = (0x63, 0x66, 0xf1);
/// Extra margin (world units) between a symbol body and its selection outline.
pub const SELECTION_MARGIN: f64 = 6.0;

// Interaction
/// Maximum pointer travel (pixels) for a press and release to count as a click.
pub const CLICK_THRESHOLD: f32 = 4.0;
/// Default file name for PNG exports.
pub const EXPORT_FILE_NAME: &str = "croquis.png";
/// Default file name for JSON documents.
pub const DOCUMENT_FILE_NAME: &str = "croquis.json";
