//! # Croquis Editor
//!
//! An interactive stage plot ("croquis") editor. Technicians place three kinds of
//! symbols on an infinite canvas:
//! - **Microphones**: colored discs labelled with the person using them
//! - **Instruments**: boxes showing the instrument emoji and name
//! - **Monitors**: wedge boxes labelled with number and output group
//!
//! ## Features
//! - Pan, zoom about the cursor and fit-to-content navigation
//! - Symbol creation, editing, dragging and deletion
//! - Light and dark display modes
//! - PNG export of the current view
//! - A croquis library storing each diagram with a PNG snapshot and preview

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod camera;
pub mod canvas;
mod constants;
pub mod export;
pub mod settings;
pub mod store;
pub mod theme;
pub mod thumbnail;
mod types;
mod ui;

// Re-export public types and functions
pub use camera::{Bounds, Camera, Point, ScaleLimits, Viewport, ZoomDirection};
pub use canvas::{CanvasConfig, DiagramCanvas, Gesture};
pub use export::ExportError;
pub use settings::EditorSettings;
pub use store::{CroquisRecord, CroquisStore, CroquisSummary, CroquisUpdate, DirStore, MemoryStore, StoreError};
pub use thumbnail::Thumbnail;
pub use types::*;
pub use ui::StagePlotApp;

use std::sync::Arc;

/// Builds the croquis store described by `settings`.
///
/// A directory store is used when `store_dir` is set and can be opened; otherwise
/// the library lives in memory for this session.
pub fn build_store(settings: &EditorSettings) -> Arc<dyn CroquisStore> {
    #[cfg(not(target_arch = "wasm32"))]
    if let Some(dir) = &settings.store_dir {
        match DirStore::open(dir) {
            Ok(store) => return Arc::new(store),
            Err(e) => log::error!("Cannot open croquis store at {}: {}", dir.display(), e),
        }
    }
    #[cfg(target_arch = "wasm32")]
    let _ = settings;
    log::info!("Using in-memory croquis store");
    Arc::new(MemoryStore::new())
}

/// Runs the croquis editor with settings restored from the previous session.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use croquis_editor::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Croquis Editor",
        options,
        Box::new(|cc| Ok(Box::new(StagePlotApp::new(cc)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagram_default() {
        let diagram = Diagram::default();
        assert!(diagram.nodes.is_empty());
        assert_eq!(diagram.mode, DisplayMode::Dark);
    }

    #[test]
    fn test_build_store_falls_back_to_memory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = EditorSettings {
            // A regular file cannot host the store directory.
            store_dir: Some(file.path().join("nested")),
            ..Default::default()
        };
        let store = build_store(&settings);
        let created = store.create("Session", None, None).unwrap();
        assert_eq!(store.get(created.id).unwrap().name, "Session");
    }

    #[test]
    fn test_build_store_uses_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EditorSettings {
            store_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        build_store(&settings).create("On disk", None, None).unwrap();
        let reopened = DirStore::open(dir.path()).unwrap();
        assert_eq!(reopened.list().unwrap()[0].name, "On disk");
    }
}
