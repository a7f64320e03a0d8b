//! Application state management structures.
//!
//! This module contains the state that tracks the editor's current UI: the symbol
//! dialog, the library panel, async file/store operations and the status line.

use crate::canvas::DiagramCanvas;
use crate::camera::Viewport;
use crate::settings::EditorSettings;
use crate::store::{CroquisRecord, CroquisStore, CroquisSummary, MemoryStore};
use crate::thumbnail::Thumbnail;
use crate::types::*;
use eframe::egui;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use uuid::Uuid;

/// Storage key under which the open diagram is persisted.
pub const DIAGRAM_KEY: &str = "croquis_diagram";

/// Whether the symbol dialog creates a new symbol or edits an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogMode {
    /// Add a new symbol at the viewport center
    Create,
    /// Edit (or delete) the symbol with this id
    Edit(SymbolId),
}

/// Editable fields of the symbol dialog, one variant per symbol kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolForm {
    /// Microphone fields
    Mic {
        /// Marker color
        color: MicColor,
        /// Person name
        name: String,
        /// Channel label
        channel: String,
    },
    /// Instrument fields
    Instrument {
        /// Instrument type
        instrument: InstrumentType,
        /// Channel label
        channel: String,
    },
    /// Monitor fields
    Monitor {
        /// Monitor number as typed
        number: String,
        /// Output group
        group: MonitorGroup,
        /// Channel label
        channel: String,
    },
}

impl SymbolForm {
    /// Empty form for a new symbol of `kind`, pre-filled with the usual defaults.
    pub fn new(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Mic => SymbolForm::Mic {
                color: MicColor::Negro,
                name: String::new(),
                channel: String::new(),
            },
            SymbolKind::Instrument => SymbolForm::Instrument {
                instrument: InstrumentType::Bateria,
                channel: String::new(),
            },
            SymbolKind::Monitor => SymbolForm::Monitor {
                number: "1".to_string(),
                group: MonitorGroup::G12,
                channel: String::new(),
            },
        }
    }

    /// Form pre-filled from an existing symbol's metadata.
    pub fn from_props(props: &SymbolProps) -> Self {
        match props {
            SymbolProps::Mic(m) => SymbolForm::Mic {
                color: m.color,
                name: m.name.clone(),
                channel: m.channel.clone(),
            },
            SymbolProps::Instrument(i) => SymbolForm::Instrument {
                instrument: i.instrument,
                channel: i.channel.clone(),
            },
            SymbolProps::Monitor(m) => SymbolForm::Monitor {
                number: m.number.to_string(),
                group: m.group,
                channel: m.channel.clone(),
            },
        }
    }

    /// Kind the form describes.
    pub fn kind(&self) -> SymbolKind {
        match self {
            SymbolForm::Mic { .. } => SymbolKind::Mic,
            SymbolForm::Instrument { .. } => SymbolKind::Instrument,
            SymbolForm::Monitor { .. } => SymbolKind::Monitor,
        }
    }

    /// Converts the form into validated symbol metadata.
    ///
    /// Text fields are trimmed. A monitor number that is missing, not a number or 0
    /// becomes 1. Fails when the channel is blank.
    pub fn to_props(&self) -> Result<SymbolProps, String> {
        let props = match self {
            SymbolForm::Mic {
                color,
                name,
                channel,
            } => SymbolProps::Mic(MicProps {
                color: *color,
                name: name.trim().to_string(),
                channel: channel.trim().to_string(),
            }),
            SymbolForm::Instrument {
                instrument,
                channel,
            } => SymbolProps::Instrument(InstrumentProps::new(*instrument, channel.trim())),
            SymbolForm::Monitor {
                number,
                group,
                channel,
            } => SymbolProps::Monitor(MonitorProps {
                number: number.trim().parse::<u32>().ok().filter(|n| *n >= 1).unwrap_or(1),
                group: *group,
                channel: channel.trim().to_string(),
            }),
        };
        props.validate()?;
        Ok(props)
    }
}

/// The open symbol dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDialog {
    /// Create or edit
    pub mode: DialogMode,
    /// Current field values
    pub form: SymbolForm,
    /// Validation message shown under the fields
    pub error: Option<String>,
}

/// A message for the status line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    /// Text shown to the user
    pub text: String,
    /// Whether the message reports a failure
    pub is_error: bool,
}

impl StatusMessage {
    /// Informational message.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Error message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// State related to file operations and persistence.
///
/// Manages the current document path and async file/store operations.
pub struct FileState {
    /// Current file path for JSON save operations
    pub current_path: Option<String>,
    /// Library record the open diagram was loaded from or last saved to
    pub current_record: Option<CroquisSummary>,
    /// Name typed into the "save to library" field
    pub save_name: String,
    /// Flag indicating if the diagram has changes not yet saved anywhere
    pub has_unsaved_changes: bool,
    /// Pending file operations, started on the next frame
    pub pending_save_operation: Option<PendingSaveOperation>,
    /// Pending open operation, started on the next frame
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Channel for receiving operation results from async contexts
    pub file_operation_sender: Sender<FileOperationResult>,
    /// Receiving end, drained once per frame
    pub file_operation_receiver: Receiver<FileOperationResult>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            current_record: None,
            save_name: String::new(),
            has_unsaved_changes: false,
            pending_save_operation: None,
            pending_load_operation: None,
            file_operation_sender: sender,
            file_operation_receiver: receiver,
        }
    }
}

/// Represents a pending save operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingSaveOperation {
    /// Save the JSON document with a new file path (show file picker)
    SaveAs,
    /// Save the JSON document to the existing file path
    Save,
    /// Export the current view as PNG
    ExportPng,
}

/// Represents a pending load operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingLoadOperation {
    /// Load a JSON document from a file (show file picker)
    Load,
}

/// Messages sent from async file and store operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// JSON save completed successfully with the given path
    SaveCompleted(String),
    /// JSON load completed successfully with path and content
    LoadCompleted(String, String),
    /// PNG export written to the given path
    ExportCompleted(String),
    /// A library record was created or updated
    StoreSaved(CroquisSummary),
    /// A library record was loaded for editing
    StoreLoaded(CroquisRecord),
    /// Library listing with a preview per record
    StoreListed(Vec<(CroquisSummary, Thumbnail)>),
    /// A library record was deleted
    StoreDeleted(Uuid),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// State of the library side panel.
#[derive(Default)]
pub struct LibraryState {
    /// Records with their previews, newest first
    pub entries: Vec<(CroquisSummary, Thumbnail)>,
    /// Whether a listing has been requested and not yet received
    pub loading: bool,
    /// Whether the listing should be refreshed on the next frame
    pub needs_refresh: bool,
    /// Uploaded snapshot textures, keyed by record id
    pub textures: HashMap<Uuid, egui::TextureHandle>,
}

/// The main application structure containing UI state and the diagram canvas.
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic.
pub struct StagePlotApp {
    /// The diagram being edited, with its camera and selection
    pub canvas: DiagramCanvas,
    /// Editor settings
    pub settings: EditorSettings,
    /// Open symbol dialog, if any
    pub dialog: Option<SymbolDialog>,
    /// File and store operation state
    pub file: FileState,
    /// Library panel state
    pub library: LibraryState,
    /// Last message for the status line
    pub status: Option<StatusMessage>,
    /// Pointer position where the current primary press started
    pub press_origin: Option<egui::Pos2>,
    /// Croquis library backend
    pub store: Arc<dyn CroquisStore>,
}

impl Default for StagePlotApp {
    fn default() -> Self {
        let settings = EditorSettings {
            store_dir: None,
            ..Default::default()
        };
        Self::with_store(settings, None, Arc::new(MemoryStore::new()))
    }
}

impl StagePlotApp {
    /// Creates the app from persisted storage, building the store from the settings.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = EditorSettings::load(cc.storage);
        let diagram = cc
            .storage
            .and_then(|s| s.get_string(DIAGRAM_KEY))
            .and_then(|json| match Diagram::from_json(&json) {
                Ok(diagram) => Some(diagram),
                Err(e) => {
                    log::warn!("Discarding unreadable saved diagram: {}", e);
                    None
                }
            });
        let store = crate::build_store(&settings);
        Self::with_store(settings, diagram, store)
    }

    /// Creates the app around an explicit store. Without a diagram an empty one in
    /// the configured default mode is opened.
    pub fn with_store(
        settings: EditorSettings,
        diagram: Option<Diagram>,
        store: Arc<dyn CroquisStore>,
    ) -> Self {
        let diagram = diagram.unwrap_or_else(|| Diagram {
            nodes: Vec::new(),
            mode: settings.default_mode,
        });
        let canvas = DiagramCanvas::new(diagram, Viewport::default(), settings.canvas);
        Self {
            canvas,
            settings,
            dialog: None,
            file: FileState::default(),
            library: LibraryState {
                needs_refresh: true,
                ..Default::default()
            },
            status: None,
            press_origin: None,
            store,
        }
    }

    /// Sets the status line, logging errors.
    pub fn set_status(&mut self, status: StatusMessage) {
        if status.is_error {
            log::error!("{}", status.text);
        } else {
            log::info!("{}", status.text);
        }
        self.status = Some(status);
    }
}
