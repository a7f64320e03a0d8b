use super::state::{DialogMode, FileOperationResult, SymbolForm};
use super::*;
use crate::camera::{Camera, Point};
use crate::settings::EditorSettings;
use crate::store::{CroquisStore, MemoryStore};
use crate::thumbnail::Thumbnail;
use eframe::egui;
use std::sync::Arc;

const SCREEN: egui::Vec2 = egui::vec2(1200.0, 800.0);

fn raw_input(events: Vec<egui::Event>) -> egui::RawInput {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(egui::Rect::from_min_size(egui::Pos2::ZERO, SCREEN));
    raw.events = events;
    raw
}

/// Run one headless frame that draws only the canvas, filling the whole screen.
fn canvas_frame(ctx: &egui::Context, app: &mut StagePlotApp, events: Vec<egui::Event>) -> egui::FullOutput {
    ctx.run(raw_input(events), |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                app.draw_canvas(ui);
            });
    })
}

fn button(pos: egui::Pos2, pressed: bool) -> Vec<egui::Event> {
    vec![
        egui::Event::PointerMoved(pos),
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        },
    ]
}

fn mic(channel: &str) -> SymbolProps {
    SymbolProps::Mic(MicProps {
        color: MicColor::Verde,
        name: "Ana".into(),
        channel: channel.into(),
    })
}

/// App with one microphone at a known world position and an identity camera.
fn app_with_mic_at(x: f64, y: f64) -> (StagePlotApp, SymbolId) {
    let mut app = StagePlotApp::default();
    let symbol = Symbol::new(mic("1"), x, y);
    let id = symbol.id.clone();
    app.canvas.diagram.nodes.push(symbol);
    (app, id)
}

fn position_of(app: &StagePlotApp, id: &str) -> (f64, f64) {
    let symbol = app.canvas.diagram.symbol(id).expect("symbol should exist");
    (symbol.x, symbol.y)
}

#[test]
fn create_dialog_rejects_blank_channel() {
    let mut app = StagePlotApp::default();
    app.open_create_dialog(SymbolKind::Mic);
    app.submit_dialog();

    let dialog = app.dialog.as_ref().expect("dialog stays open");
    assert!(dialog.error.is_some());
    assert!(app.canvas.diagram.nodes.is_empty());
}

#[test]
fn create_dialog_adds_symbol_at_viewport_center() {
    let mut app = StagePlotApp::default();
    app.open_create_dialog(SymbolKind::Instrument);
    if let Some(dialog) = app.dialog.as_mut() {
        dialog.form = SymbolForm::Instrument {
            instrument: InstrumentType::Piano,
            channel: " 12 ".into(),
        };
    }
    app.submit_dialog();

    assert!(app.dialog.is_none());
    assert_eq!(app.canvas.diagram.nodes.len(), 1);
    let symbol = &app.canvas.diagram.nodes[0];
    assert_eq!((symbol.x, symbol.y), (400.0, 300.0));
    match &symbol.props {
        SymbolProps::Instrument(props) => {
            assert_eq!(props.channel, "12");
            assert_eq!(props.label, "Piano");
            assert_eq!(props.emoji, "🎹");
        }
        other => panic!("Expected instrument, got {:?}", other),
    }
    assert_eq!(app.canvas.selected(), Some(&symbol.id));
    assert!(app.file.has_unsaved_changes);
}

#[test]
fn creation_forms_start_with_defaults() {
    assert_eq!(
        SymbolForm::new(SymbolKind::Mic),
        SymbolForm::Mic {
            color: MicColor::Negro,
            name: String::new(),
            channel: String::new()
        }
    );
    assert_eq!(
        SymbolForm::new(SymbolKind::Monitor),
        SymbolForm::Monitor {
            number: "1".into(),
            group: MonitorGroup::G12,
            channel: String::new()
        }
    );
}

#[test]
fn monitor_number_zero_becomes_one() {
    let form = SymbolForm::Monitor {
        number: "0".into(),
        group: MonitorGroup::G34,
        channel: "Aux 1".into(),
    };
    match form.to_props().unwrap() {
        SymbolProps::Monitor(m) => assert_eq!(m.number, 1),
        other => panic!("Expected monitor, got {:?}", other),
    }
}

#[test]
fn edit_dialog_updates_and_deletes() {
    let (mut app, id) = app_with_mic_at(10.0, 20.0);
    app.open_edit_dialog(&id);
    if let Some(dialog) = app.dialog.as_mut() {
        assert_eq!(dialog.mode, DialogMode::Edit(id.clone()));
        if let SymbolForm::Mic { name, .. } = &mut dialog.form {
            *name = "Luis".into();
        }
    }
    app.submit_dialog();
    assert_eq!(app.canvas.diagram.symbol(&id).unwrap().props.caption(), "mic Luis");
    assert_eq!(position_of(&app, &id), (10.0, 20.0));

    app.open_edit_dialog(&id);
    app.delete_dialog_symbol();
    assert!(app.dialog.is_none());
    assert!(app.canvas.diagram.nodes.is_empty());
}

#[test]
fn pressing_on_symbol_drags_it() {
    let (mut app, id) = app_with_mic_at(200.0, 150.0);
    let ctx = egui::Context::default();

    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(egui::pos2(200.0, 150.0))]);
    canvas_frame(&ctx, &mut app, button(egui::pos2(205.0, 150.0), true));
    assert_eq!(app.canvas.selected(), Some(&id));

    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(egui::pos2(265.0, 190.0))]);
    canvas_frame(&ctx, &mut app, button(egui::pos2(265.0, 190.0), false));

    let (x, y) = position_of(&app, &id);
    assert!((x - 260.0).abs() < 1e-3 && (y - 190.0).abs() < 1e-3, "got ({x}, {y})");
    assert_eq!(*app.canvas.camera(), Camera::default());
    assert!(app.dialog.is_none());
    assert!(app.file.has_unsaved_changes);
}

#[test]
fn dragging_empty_canvas_pans() {
    let (mut app, id) = app_with_mic_at(200.0, 150.0);
    let ctx = egui::Context::default();

    canvas_frame(&ctx, &mut app, button(egui::pos2(600.0, 500.0), true));
    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(egui::pos2(610.0, 495.0))]);
    // Passing over the symbol mid-gesture must not turn the pan into a drag.
    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(egui::pos2(200.0, 150.0))]);
    canvas_frame(&ctx, &mut app, button(egui::pos2(200.0, 150.0), false));

    assert_eq!(app.canvas.camera().offset, Point::new(-400.0, -350.0));
    assert_eq!(position_of(&app, &id), (200.0, 150.0));
}

#[test]
fn clicking_symbol_opens_edit_dialog() {
    let (mut app, id) = app_with_mic_at(300.0, 300.0);
    let ctx = egui::Context::default();

    canvas_frame(&ctx, &mut app, button(egui::pos2(300.0, 300.0), true));
    canvas_frame(&ctx, &mut app, button(egui::pos2(301.0, 300.0), false));

    let dialog = app.dialog.as_ref().expect("edit dialog should open");
    assert_eq!(dialog.mode, DialogMode::Edit(id));
}

#[test]
fn clicking_empty_canvas_clears_selection() {
    let (mut app, id) = app_with_mic_at(300.0, 300.0);
    app.canvas.select(&id);
    let ctx = egui::Context::default();

    canvas_frame(&ctx, &mut app, button(egui::pos2(900.0, 100.0), true));
    canvas_frame(&ctx, &mut app, button(egui::pos2(900.0, 100.0), false));

    assert!(app.canvas.selected().is_none());
    assert!(app.dialog.is_none());
}

fn wheel(pos: egui::Pos2, delta_y: f32) -> Vec<egui::Event> {
    vec![
        egui::Event::PointerMoved(pos),
        egui::Event::MouseWheel {
            unit: egui::MouseWheelUnit::Line,
            delta: egui::vec2(0.0, delta_y),
            modifiers: egui::Modifiers::NONE,
        },
    ]
}

#[test]
fn wheel_toward_user_zooms_out_and_away_zooms_in() {
    let mut app = StagePlotApp::default();
    let ctx = egui::Context::default();
    let pointer = egui::pos2(300.0, 200.0);
    let anchor = app.canvas.screen_to_world(Point::new(300.0, 200.0));

    canvas_frame(&ctx, &mut app, wheel(pointer, -1.0));
    let zoomed_out = app.canvas.camera().scale;
    assert!(zoomed_out < 1.0, "scale {zoomed_out}");
    let back = app.canvas.world_to_screen(anchor);
    assert!((back.x - 300.0).abs() < 1e-6 && (back.y - 200.0).abs() < 1e-6);

    canvas_frame(&ctx, &mut app, wheel(pointer, 1.0));
    canvas_frame(&ctx, &mut app, wheel(pointer, 1.0));
    assert!(app.canvas.camera().scale > 1.0);
}

#[test]
fn wheel_is_ignored_while_dialog_open() {
    let mut app = StagePlotApp::default();
    app.open_create_dialog(SymbolKind::Mic);
    let ctx = egui::Context::default();
    canvas_frame(&ctx, &mut app, wheel(egui::pos2(300.0, 200.0), -1.0));
    assert_eq!(*app.canvas.camera(), Camera::default());
}

#[test]
fn delete_key_removes_selected_symbol() {
    let (mut app, id) = app_with_mic_at(0.0, 0.0);
    app.canvas.select(&id);
    let ctx = egui::Context::default();
    let _ = ctx.run(
        raw_input(vec![egui::Event::Key {
            key: egui::Key::Delete,
            physical_key: Some(egui::Key::Delete),
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }]),
        |ctx| app.handle_delete_key(ctx),
    );
    assert!(app.canvas.diagram.nodes.is_empty());
    assert!(app.canvas.selected().is_none());
}

#[test]
fn drawing_canvas_with_symbols_produces_shapes() {
    let mut app = StagePlotApp::default();
    app.canvas.add_symbol(mic("1"));
    app.canvas.add_symbol(SymbolProps::Instrument(InstrumentProps::new(InstrumentType::Bajo, "4")));
    app.canvas.add_symbol(SymbolProps::Monitor(MonitorProps {
        number: 2,
        group: MonitorGroup::G56,
        channel: "Aux".into(),
    }));
    let ctx = egui::Context::default();
    let output = canvas_frame(&ctx, &mut app, Vec::new());
    // Background, three bodies, labels and the selection outline.
    assert!(output.shapes.len() > 5);
}

#[test]
fn loading_document_accepts_legacy_theme_key() {
    let mut app = StagePlotApp::default();
    app.canvas.pan(120.0, -40.0);
    let ctx = egui::Context::default();
    let json = r#"{
        "nodes": [{"id": "m1", "kind": "mic", "x": 5, "y": 6, "color": "Rojo", "name": "", "channel": "2"}],
        "theme": "light"
    }"#;
    app.apply_operation_result(
        &ctx,
        FileOperationResult::LoadCompleted("plot.json".into(), json.into()),
    );

    assert_eq!(app.canvas.diagram.mode, DisplayMode::Light);
    assert_eq!(app.canvas.diagram.nodes.len(), 1);
    assert_eq!(app.file.current_path.as_deref(), Some("plot.json"));
    assert!(!app.status.as_ref().unwrap().is_error);
    // Opened documents start from the identity camera, without fitting.
    assert_eq!(*app.canvas.camera(), Camera::default());
}

#[test]
fn loading_invalid_document_reports_error() {
    let (mut app, _) = app_with_mic_at(1.0, 1.0);
    let ctx = egui::Context::default();
    app.apply_operation_result(
        &ctx,
        FileOperationResult::LoadCompleted("bad.json".into(), "{ nope".into()),
    );
    assert!(app.status.as_ref().unwrap().is_error);
    assert_eq!(app.canvas.diagram.nodes.len(), 1);
}

#[test]
fn save_to_library_requires_name() {
    let mut app = StagePlotApp::default();
    let ctx = egui::Context::default();
    app.save_to_library(&ctx);
    assert!(app.status.as_ref().unwrap().is_error);
    assert!(app.store.list().unwrap().is_empty());
}

#[test]
fn save_to_library_creates_then_updates_record() {
    let store = Arc::new(MemoryStore::new());
    let mut app = StagePlotApp::with_store(EditorSettings::default(), None, store.clone());
    let ctx = egui::Context::default();
    app.canvas.add_symbol(mic("1"));
    app.file.save_name = "Domingo".into();

    app.save_to_library(&ctx);
    app.handle_pending_operations(&ctx);
    let record = app.file.current_record.clone().expect("record should be current");
    assert_eq!(record.name, "Domingo");

    let stored = store.get(record.id).unwrap();
    assert_eq!(stored.data.as_ref().unwrap().nodes.len(), 1);
    #[cfg(not(target_arch = "wasm32"))]
    assert!(stored.snapshot.is_some());

    // The listing requested after saving arrives on the next drain.
    app.handle_pending_operations(&ctx);
    assert_eq!(app.library.entries.len(), 1);
    assert!(matches!(app.library.entries[0].1, Thumbnail::Diagram(_)));

    app.canvas.add_symbol(mic("2"));
    app.file.save_name = "Domingo v2".into();
    app.save_to_library(&ctx);
    app.handle_pending_operations(&ctx);

    let summaries = store.list().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "Domingo v2");
    assert_eq!(store.get(record.id).unwrap().data.unwrap().nodes.len(), 2);
    assert!(!app.file.has_unsaved_changes);
}

#[test]
fn open_and_delete_library_records() {
    let store = Arc::new(MemoryStore::new());
    let mut diagram = Diagram::new();
    diagram.mode = DisplayMode::Light;
    diagram.nodes.push(Symbol::new(mic("7"), -50.0, 80.0));
    let summary = store.create("Ensayo", Some(diagram.clone()), None).unwrap();

    let mut app = StagePlotApp::with_store(EditorSettings::default(), None, store.clone());
    let ctx = egui::Context::default();
    app.open_from_library(&ctx, summary.id);
    app.handle_pending_operations(&ctx);

    assert_eq!(app.canvas.diagram, diagram);
    assert_eq!(app.file.current_record.as_ref().map(|r| r.id), Some(summary.id));
    assert_eq!(app.file.save_name, "Ensayo");

    app.delete_from_library(&ctx, summary.id);
    app.handle_pending_operations(&ctx);
    assert!(app.file.current_record.is_none());
    assert!(store.list().unwrap().is_empty());

    app.open_from_library(&ctx, summary.id);
    app.handle_pending_operations(&ctx);
    assert!(app.status.as_ref().unwrap().is_error);
}

#[test]
fn library_panel_renders_every_preview_kind() {
    let mut app = StagePlotApp::default();
    let mut diagram = Diagram::new();
    diagram.nodes.push(Symbol::new(mic("1"), 0.0, 0.0));
    let a = app.store.create("Structured", Some(diagram.clone()), None).unwrap();
    let b = app.store.create("Snapshot", None, Some(vec![0, 1, 2])).unwrap();
    let c = app.store.create("Blank", None, None).unwrap();
    app.library.entries = vec![
        (a, Thumbnail::Diagram(diagram)),
        (b, Thumbnail::Raster(vec![0, 1, 2])),
        (c, Thumbnail::Empty),
    ];
    app.library.needs_refresh = false;

    let ctx = egui::Context::default();
    let output = ctx.run(raw_input(Vec::new()), |ctx| {
        egui::SidePanel::right("library_panel").show(ctx, |ui| {
            app.draw_library_panel(ui);
        });
    });
    assert!(!output.shapes.is_empty());
    // Corrupt snapshots are not cached.
    assert!(app.library.textures.is_empty());
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn snapshot_previews_are_uploaded_once() {
    let mut app = StagePlotApp::default();
    app.canvas.add_symbol(mic("1"));
    let png = app.canvas.export_raster(1.0).unwrap();
    let summary = app.store.create("With snapshot", None, Some(png.clone())).unwrap();
    let id = summary.id;
    app.library.entries = vec![(summary, Thumbnail::Raster(png))];
    app.library.needs_refresh = false;

    let ctx = egui::Context::default();
    for _ in 0..2 {
        let _ = ctx.run(raw_input(Vec::new()), |ctx| {
            egui::SidePanel::right("library_panel").show(ctx, |ui| {
                app.draw_library_panel(ui);
            });
        });
    }
    assert_eq!(app.library.textures.len(), 1);
    assert!(app.library.textures.contains_key(&id));
}

#[test]
fn new_document_keeps_mode_and_clears_record() {
    let (mut app, _) = app_with_mic_at(0.0, 0.0);
    app.toggle_mode();
    app.file.save_name = "Old".into();
    app.new_document();

    assert!(app.canvas.diagram.nodes.is_empty());
    assert_eq!(app.canvas.diagram.mode, DisplayMode::Light);
    assert!(app.file.current_record.is_none());
    assert!(app.file.save_name.is_empty());
    assert!(!app.file.has_unsaved_changes);
}

#[test]
fn app_starts_with_configured_mode() {
    let settings = EditorSettings {
        default_mode: DisplayMode::Light,
        store_dir: None,
        ..Default::default()
    };
    let app = StagePlotApp::with_store(settings, None, Arc::new(MemoryStore::new()));
    assert_eq!(app.canvas.diagram.mode, DisplayMode::Light);
}
