//! Previews of stored croquis for the library list.
//!
//! A preview prefers the structured document, which stays sharp at any size, and
//! falls back to the stored PNG snapshot when a record has no usable document.

use crate::camera::{Bounds, Camera, Point, Viewport};
use crate::constants;
use crate::export::{self, ExportError};
use crate::store::CroquisRecord;
use crate::types::Diagram;

/// What a stored record can be previewed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Thumbnail {
    /// A non-empty structured document
    Diagram(Diagram),
    /// The stored PNG snapshot
    Raster(Vec<u8>),
    /// Nothing to show
    Empty,
}

impl Thumbnail {
    /// Chooses the preview source for a record: document first, then snapshot.
    pub fn from_record(record: &CroquisRecord) -> Self {
        match (&record.data, &record.snapshot) {
            (Some(diagram), _) if !diagram.nodes.is_empty() => Thumbnail::Diagram(diagram.clone()),
            (_, Some(png)) if !png.is_empty() => Thumbnail::Raster(png.clone()),
            _ => Thumbnail::Empty,
        }
    }

    /// Renders the preview into PNG bytes for a box `width` pixels wide.
    ///
    /// Returns `Ok(None)` for [`Thumbnail::Empty`]. Snapshots are returned unchanged.
    pub fn to_png(&self, width: f64, max_height: f64, density: f64) -> Result<Option<Vec<u8>>, ExportError> {
        match self {
            Thumbnail::Diagram(diagram) => {
                let viewport = thumbnail_size(width, max_height);
                let camera = thumbnail_camera(diagram, viewport);
                export::render_png(diagram, &camera, viewport, density).map(Some)
            }
            Thumbnail::Raster(png) => Ok(Some(png.clone())),
            Thumbnail::Empty => Ok(None),
        }
    }
}

/// Preview box for a given width: 900:520 aspect ratio, capped at `max_height`.
pub fn thumbnail_size(width: f64, max_height: f64) -> Viewport {
    let height = width * constants::THUMBNAIL_ASPECT_H / constants::THUMBNAIL_ASPECT_W;
    Viewport::new(width, height.min(max_height))
}

/// Camera that scales the padded content to fill the preview box.
///
/// Unlike the editor's fit this may enlarge small content. An empty diagram gets
/// the identity camera.
pub fn thumbnail_camera(diagram: &Diagram, viewport: Viewport) -> Camera {
    let points = diagram.nodes.iter().map(|s| Point::new(s.x, s.y));
    match Bounds::of_points(points) {
        Some(bounds) => Camera::thumbnail(bounds.expanded(constants::THUMBNAIL_PADDING), viewport),
        None => Camera::default(),
    }
}

/// Decodes PNG bytes into premultiplied RGBA pixels.
#[cfg(not(target_arch = "wasm32"))]
pub fn decode_png(png: &[u8]) -> Result<([usize; 2], Vec<u8>), ExportError> {
    let pixmap = tiny_skia::Pixmap::decode_png(png).map_err(|e| ExportError::Encode(e.to_string()))?;
    let size = [pixmap.width() as usize, pixmap.height() as usize];
    Ok((size, pixmap.take()))
}
