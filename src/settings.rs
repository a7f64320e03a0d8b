//! Editor configuration persisted between sessions.

use crate::canvas::CanvasConfig;
use crate::constants;
use crate::types::DisplayMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage key under which settings are persisted.
pub const SETTINGS_KEY: &str = "croquis_settings";

/// Environment variable overriding [`EditorSettings::store_dir`].
pub const STORE_DIR_ENV: &str = "CROQUIS_STORE_DIR";

/// User-adjustable editor settings.
///
/// Every field has a default, so settings saved by older versions keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Camera tunables (zoom step, fit padding, scale limits)
    pub canvas: CanvasConfig,
    /// Pixel density multiplier for PNG export and library snapshots
    pub export_density: f64,
    /// Display mode for new diagrams
    pub default_mode: DisplayMode,
    /// Directory of the croquis library; `None` keeps the library in memory
    pub store_dir: Option<PathBuf>,
    /// Width of library previews in points
    pub thumbnail_width: f64,
    /// Maximum height of library previews in points
    pub thumbnail_max_height: f64,
    /// Whether the library panel is shown
    pub show_library: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            export_density: constants::SNAPSHOT_DENSITY,
            default_mode: DisplayMode::default(),
            store_dir: default_store_dir(),
            thumbnail_width: 180.0,
            thumbnail_max_height: constants::THUMBNAIL_MAX_HEIGHT,
            show_library: true,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_store_dir() -> Option<PathBuf> {
    Some(PathBuf::from("croquis"))
}

#[cfg(target_arch = "wasm32")]
fn default_store_dir() -> Option<PathBuf> {
    None
}

impl EditorSettings {
    /// Serialize the settings to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads persisted settings, falling back to defaults when absent or unreadable,
    /// then applies environment overrides.
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        let mut settings = storage
            .and_then(|s| s.get_string(SETTINGS_KEY))
            .and_then(|json| match Self::from_json(&json) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("Ignoring unreadable settings: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        settings.apply_env();
        settings
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(STORE_DIR_ENV) {
            self.store_dir = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
    }
}
