//! File and library operations for the editor.
//!
//! JSON documents and PNG exports go through native file dialogs or browser
//! downloads. Library (store) calls run as background tasks. Every operation reports
//! back over the [`FileOperationResult`] channel, which is drained once per frame.

use super::state::{
    FileOperationResult, PendingLoadOperation, PendingSaveOperation, StagePlotApp, StatusMessage,
};
use crate::constants;
use crate::store::CroquisUpdate;
use crate::thumbnail::Thumbnail;
use crate::types::Diagram;
use eframe::egui;
use std::future::Future;
use std::sync::mpsc::Sender;
use uuid::Uuid;

/// Runs `task` in the background.
///
/// Native builds use the ambient tokio runtime; without one (headless tests) the
/// task runs to completion before returning. Browser builds use the local executor.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => futures::executor::block_on(task),
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn spawn_task<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}

fn send(sender: &Sender<FileOperationResult>, result: FileOperationResult) {
    // The receiver only disappears when the app shuts down.
    let _ = sender.send(result);
}

impl StagePlotApp {
    /// Handles pending file operations for both native and WASM platforms.
    ///
    /// This method processes completed async operations and initiates new ones.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.file.file_operation_receiver.try_recv() {
            self.apply_operation_result(ctx, result);
        }

        if self.library.needs_refresh && !self.library.loading {
            self.refresh_library(ctx);
        }

        if let Some(save_op) = self.file.pending_save_operation.take() {
            match save_op {
                PendingSaveOperation::ExportPng => self.start_png_export(ctx),
                PendingSaveOperation::Save | PendingSaveOperation::SaveAs => {
                    self.start_json_save(ctx, save_op)
                }
            }
        }

        if let Some(PendingLoadOperation::Load) = self.file.pending_load_operation.take() {
            self.start_json_load(ctx);
        }
    }

    /// Applies one completed operation to the app state.
    pub fn apply_operation_result(&mut self, ctx: &egui::Context, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path) => {
                self.file.has_unsaved_changes = false;
                self.set_status(StatusMessage::info(format!("Saved {}", path)));
                self.file.current_path = Some(path);
            }
            FileOperationResult::LoadCompleted(path, content) => match Diagram::from_json(&content) {
                Ok(diagram) => {
                    self.open_diagram(diagram);
                    self.file.current_path = Some(path.clone());
                    self.file.current_record = None;
                    self.set_status(StatusMessage::info(format!("Opened {}", path)));
                }
                Err(e) => {
                    self.set_status(StatusMessage::error(format!("Failed to parse croquis: {}", e)));
                }
            },
            FileOperationResult::ExportCompleted(path) => {
                self.set_status(StatusMessage::info(format!("Exported {}", path)));
            }
            FileOperationResult::StoreSaved(summary) => {
                self.file.has_unsaved_changes = false;
                self.file.save_name = summary.name.clone();
                self.set_status(StatusMessage::info(format!("Saved \"{}\" to library", summary.name)));
                self.file.current_record = Some(summary);
                self.library.needs_refresh = true;
            }
            FileOperationResult::StoreLoaded(record) => {
                let name = record.name.clone();
                self.open_diagram(record.data.clone().unwrap_or_default());
                self.file.save_name = name.clone();
                self.file.current_record = Some(record.summary());
                self.file.current_path = None;
                self.set_status(StatusMessage::info(format!("Opened \"{}\"", name)));
            }
            FileOperationResult::StoreListed(entries) => {
                self.library.loading = false;
                self.library.textures.clear();
                self.library.entries = entries;
            }
            FileOperationResult::StoreDeleted(id) => {
                if self.file.current_record.as_ref().map(|r| r.id) == Some(id) {
                    self.file.current_record = None;
                }
                self.library.needs_refresh = true;
                self.set_status(StatusMessage::info("Deleted croquis"));
            }
            FileOperationResult::OperationFailed(error) => {
                self.library.loading = false;
                self.set_status(StatusMessage::error(error));
            }
        }
        ctx.request_repaint();
    }

    /// Replaces the open diagram. The camera starts at identity; "Center" fits it.
    fn open_diagram(&mut self, diagram: Diagram) {
        self.canvas.open(diagram);
        self.dialog = None;
        self.file.has_unsaved_changes = false;
    }

    fn start_json_save(&mut self, ctx: &egui::Context, op: PendingSaveOperation) {
        let json = match self.canvas.diagram.to_json() {
            Ok(json) => json,
            Err(e) => {
                self.set_status(StatusMessage::error(format!("Failed to serialize croquis: {}", e)));
                return;
            }
        };
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();

        #[cfg(target_arch = "wasm32")]
        {
            let _ = op;
            let result = match Self::trigger_download(constants::DOCUMENT_FILE_NAME, &json, "application/json") {
                Ok(()) => FileOperationResult::SaveCompleted(constants::DOCUMENT_FILE_NAME.to_string()),
                Err(e) => FileOperationResult::OperationFailed(e),
            };
            send(&sender, result);
            ctx.request_repaint();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let existing = match op {
                PendingSaveOperation::Save => self.file.current_path.clone(),
                _ => None,
            };
            spawn_task(async move {
                let path = match existing {
                    Some(path) => Some(std::path::PathBuf::from(path)),
                    None => rfd::AsyncFileDialog::new()
                        .add_filter("JSON", &["json"])
                        .set_file_name(constants::DOCUMENT_FILE_NAME)
                        .save_file()
                        .await
                        .map(|handle| handle.path().to_path_buf()),
                };
                if let Some(path) = path {
                    let result = match std::fs::write(&path, json) {
                        Ok(()) => FileOperationResult::SaveCompleted(path.display().to_string()),
                        Err(e) => FileOperationResult::OperationFailed(format!("Failed to save file: {}", e)),
                    };
                    send(&sender, result);
                }
                ctx.request_repaint();
            });
        }
    }

    fn start_json_load(&mut self, ctx: &egui::Context) {
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();

        #[cfg(target_arch = "wasm32")]
        spawn_task(async move {
            match Self::show_open_file_picker().await {
                Some(file) => {
                    let filename = file.name();
                    let result = match Self::read_file(file).await {
                        Ok(content) => FileOperationResult::LoadCompleted(filename, content),
                        Err(e) => FileOperationResult::OperationFailed(e),
                    };
                    send(&sender, result);
                }
                None => log::debug!("Open dialog cancelled"),
            }
            ctx.request_repaint();
        });

        #[cfg(not(target_arch = "wasm32"))]
        spawn_task(async move {
            if let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
                .await
            {
                let path = handle.path();
                let result = match std::fs::read_to_string(path) {
                    Ok(json) => FileOperationResult::LoadCompleted(path.display().to_string(), json),
                    Err(e) => FileOperationResult::OperationFailed(format!("Failed to read file: {}", e)),
                };
                send(&sender, result);
            }
            ctx.request_repaint();
        });
    }

    fn start_png_export(&mut self, ctx: &egui::Context) {
        let png = match self.canvas.export_raster(self.settings.export_density) {
            Ok(png) => png,
            Err(e) => {
                self.set_status(StatusMessage::error(format!("Export failed: {}", e)));
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let sender = self.file.file_operation_sender.clone();
            let ctx = ctx.clone();
            spawn_task(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("PNG", &["png"])
                    .set_file_name(constants::EXPORT_FILE_NAME)
                    .save_file()
                    .await
                {
                    let path = handle.path();
                    let result = match std::fs::write(path, &png) {
                        Ok(()) => FileOperationResult::ExportCompleted(path.display().to_string()),
                        Err(e) => FileOperationResult::OperationFailed(format!("Failed to save PNG: {}", e)),
                    };
                    send(&sender, result);
                }
                ctx.request_repaint();
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = (png, ctx);
        }
    }

    /// Saves the open diagram to the library with a fresh PNG snapshot.
    ///
    /// Updates the current record when there is one, otherwise creates a record
    /// named after the save field. A snapshot that cannot be rendered is left out.
    pub fn save_to_library(&mut self, ctx: &egui::Context) {
        let name = self.file.save_name.trim().to_string();
        if name.is_empty() {
            self.set_status(StatusMessage::error("Enter a name before saving"));
            return;
        }
        let snapshot = match self.canvas.export_raster(self.settings.export_density) {
            Ok(png) => Some(png),
            Err(e) => {
                log::warn!("Saving without snapshot: {}", e);
                None
            }
        };
        let data = self.canvas.diagram.clone();
        let current = self.file.current_record.as_ref().map(|r| r.id);
        let store = self.store.clone();
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();

        spawn_task(async move {
            let outcome = match current {
                Some(id) => store.update(
                    id,
                    CroquisUpdate {
                        name: Some(name),
                        data: Some(data),
                        snapshot,
                    },
                ),
                None => store.create(&name, Some(data), snapshot),
            };
            let result = match outcome {
                Ok(summary) => FileOperationResult::StoreSaved(summary),
                Err(e) => FileOperationResult::OperationFailed(e.to_string()),
            };
            send(&sender, result);
            ctx.request_repaint();
        });
    }

    /// Loads a library record into the editor.
    pub fn open_from_library(&mut self, ctx: &egui::Context, id: Uuid) {
        let store = self.store.clone();
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let result = match store.get(id) {
                Ok(record) => FileOperationResult::StoreLoaded(record),
                Err(e) => FileOperationResult::OperationFailed(e.to_string()),
            };
            send(&sender, result);
            ctx.request_repaint();
        });
    }

    /// Deletes a library record.
    pub fn delete_from_library(&mut self, ctx: &egui::Context, id: Uuid) {
        let store = self.store.clone();
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let result = match store.delete(id) {
                Ok(()) => FileOperationResult::StoreDeleted(id),
                Err(e) => FileOperationResult::OperationFailed(e.to_string()),
            };
            send(&sender, result);
            ctx.request_repaint();
        });
    }

    /// Requests a fresh library listing with previews.
    pub fn refresh_library(&mut self, ctx: &egui::Context) {
        self.library.needs_refresh = false;
        self.library.loading = true;
        let store = self.store.clone();
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();
        spawn_task(async move {
            let listing = store.list().and_then(|summaries| {
                summaries
                    .into_iter()
                    .map(|summary| {
                        let record = store.get(summary.id)?;
                        Ok((summary, Thumbnail::from_record(&record)))
                    })
                    .collect::<Result<Vec<_>, _>>()
            });
            let result = match listing {
                Ok(entries) => FileOperationResult::StoreListed(entries),
                Err(e) => FileOperationResult::OperationFailed(e.to_string()),
            };
            send(&sender, result);
            ctx.request_repaint();
        });
    }

    /// Triggers a file download in the browser (WASM only, Firefox-compatible).
    ///
    /// Creates a temporary anchor element with a blob URL and triggers a download.
    ///
    /// # Arguments
    ///
    /// * `filename` - The name to give the downloaded file
    /// * `content` - The content to write to the file
    /// * `mime` - MIME type of the content
    ///
    /// # Returns
    ///
    /// `Ok(())` if successful, or an error message if the operation fails.
    #[cfg(target_arch = "wasm32")]
    fn trigger_download(filename: &str, content: &str, mime: &str) -> Result<(), String> {
        use eframe::wasm_bindgen::JsCast;

        let window = web_sys::window().ok_or("No window found")?;
        let document = window.document().ok_or("No document found")?;

        let blob_parts = js_sys::Array::new();
        blob_parts.push(&eframe::wasm_bindgen::JsValue::from_str(content));

        let blob_options = web_sys::BlobPropertyBag::new();
        blob_options.set_type(mime);

        let blob = web_sys::Blob::new_with_str_sequence_and_options(&blob_parts, &blob_options)
            .map_err(|_| "Failed to create blob")?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Failed to create object URL")?;

        let anchor = document
            .create_element("a")
            .map_err(|_| "Failed to create anchor element")?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| "Failed to cast to anchor element")?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        let body = document.body().ok_or("No body found")?;
        body.append_child(&anchor).map_err(|_| "Failed to append anchor")?;
        anchor.click();
        body.remove_child(&anchor).map_err(|_| "Failed to remove anchor")?;

        web_sys::Url::revoke_object_url(&url).map_err(|_| "Failed to revoke object URL")?;
        Ok(())
    }

    /// Opens a file picker in the browser and waits for the user's choice (WASM only).
    #[cfg(target_arch = "wasm32")]
    async fn show_open_file_picker() -> Option<web_sys::File> {
        use eframe::wasm_bindgen::closure::Closure;
        use eframe::wasm_bindgen::JsCast;

        let document = web_sys::window()?.document()?;
        let input = document
            .create_element("input")
            .ok()?
            .dyn_into::<web_sys::HtmlInputElement>()
            .ok()?;
        input.set_type("file");
        input.set_accept(".json,application/json");
        input.style().set_property("display", "none").ok()?;

        let (sender, receiver) = futures::channel::oneshot::channel::<Option<web_sys::File>>();
        let sender = std::rc::Rc::new(std::cell::RefCell::new(Some(sender)));

        let onchange = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let file = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(file);
            }
        }) as Box<dyn FnMut(_)>);
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        document.body()?.append_child(&input).ok()?;
        input.click();
        let file = receiver.await.ok()??;
        document.body()?.remove_child(&input).ok()?;
        Some(file)
    }

    /// Reads a browser `File` as text (WASM only).
    #[cfg(target_arch = "wasm32")]
    async fn read_file(file: web_sys::File) -> Result<String, String> {
        use eframe::wasm_bindgen::closure::Closure;
        use eframe::wasm_bindgen::{JsCast, JsValue};

        let reader = web_sys::FileReader::new().map_err(|_| "Failed to create FileReader".to_string())?;
        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            let source = reader.clone();
            let onload = Closure::wrap(Box::new(move |_event: web_sys::ProgressEvent| {
                if let Ok(result) = source.result() {
                    let _ = resolve.call1(&JsValue::NULL, &result);
                }
            }) as Box<dyn FnMut(_)>);
            reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();

            let onerror = Closure::wrap(Box::new(move |_event: web_sys::ProgressEvent| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("Failed to read file"));
            }) as Box<dyn FnMut(_)>);
            reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onerror.forget();
        });
        reader
            .read_as_text(&file)
            .map_err(|_| "Failed to start reading file".to_string())?;
        let result = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(|e| format!("Failed to read file: {:?}", e))?;
        result.as_string().ok_or_else(|| "File content is not a string".to_string())
    }

    /// Opens a file dialog to save the diagram as JSON under a new name.
    pub fn save_as_document(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
    }

    /// Saves the JSON document to the current path, or asks for one.
    pub fn save_document(&mut self) {
        self.file.pending_save_operation = Some(if self.file.current_path.is_some() {
            PendingSaveOperation::Save
        } else {
            PendingSaveOperation::SaveAs
        });
    }

    /// Opens a file dialog to load a JSON document.
    pub fn open_document(&mut self) {
        self.file.pending_load_operation = Some(PendingLoadOperation::Load);
    }

    /// Asks where to write a PNG export of the current view.
    pub fn export_png(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::ExportPng);
    }

    /// Starts a new empty diagram, keeping the current display mode.
    pub fn new_document(&mut self) {
        let mode = self.canvas.diagram.mode;
        self.canvas.open(Diagram {
            nodes: Vec::new(),
            mode,
        });
        self.dialog = None;
        self.file.current_path = None;
        self.file.current_record = None;
        self.file.save_name.clear();
        self.file.has_unsaved_changes = false;
    }
}
