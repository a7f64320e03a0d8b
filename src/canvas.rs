//! The diagram canvas model: symbols, camera, selection and pointer gestures.
//!
//! Every operation is a synchronous in-memory state transition. Operations that
//! target a symbol id which no longer exists are no-ops, since drag events can race
//! with deletion.

use crate::camera::{Bounds, Camera, Point, ScaleLimits, Viewport, ZoomDirection};
use crate::constants;
use crate::export::{self, ExportError};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Tunables for camera behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Multiplicative factor per zoom step
    pub zoom_step: f64,
    /// Padding around the content when fitting
    pub fit_padding: f64,
    /// Scale bounds enforced while zooming
    pub scale_limits: ScaleLimits,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom_step: constants::ZOOM_STEP,
            fit_padding: constants::FIT_PADDING,
            scale_limits: ScaleLimits::default(),
        }
    }
}

/// What a pointer gesture does; chosen once when the gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// No pointer button held
    Idle,
    /// Dragging on empty canvas moves the camera
    Panning {
        /// Last pointer position in pixels
        last: Point,
    },
    /// Dragging a symbol moves it in world space
    Dragging {
        /// Symbol being dragged
        id: SymbolId,
        /// Symbol position minus the world point that was grabbed
        grab_offset: Point,
    },
}

/// World-space body bounds of a symbol, used for hit testing and selection outlines.
pub fn symbol_bounds(symbol: &Symbol) -> Bounds {
    let (half_w, half_h) = match symbol.kind() {
        SymbolKind::Mic => (constants::MIC_RADIUS, constants::MIC_RADIUS),
        SymbolKind::Instrument => (constants::INSTRUMENT_BOX.0 / 2.0, constants::INSTRUMENT_BOX.1 / 2.0),
        SymbolKind::Monitor => (constants::MONITOR_BOX.0 / 2.0, constants::MONITOR_BOX.1 / 2.0),
    };
    Bounds {
        min: Point::new(symbol.x - half_w, symbol.y - half_h),
        max: Point::new(symbol.x + half_w, symbol.y + half_h),
    }
}

/// A diagram being viewed and edited through a camera.
#[derive(Debug, Clone)]
pub struct DiagramCanvas {
    /// The document being edited
    pub diagram: Diagram,
    camera: Camera,
    viewport: Viewport,
    config: CanvasConfig,
    selected: Option<SymbolId>,
    gesture: Gesture,
    needs_redraw: bool,
}

impl Default for DiagramCanvas {
    fn default() -> Self {
        Self::new(Diagram::default(), Viewport::default(), CanvasConfig::default())
    }
}

impl DiagramCanvas {
    /// Opens `diagram` with an identity camera.
    pub fn new(diagram: Diagram, viewport: Viewport, config: CanvasConfig) -> Self {
        Self {
            diagram,
            camera: Camera::default(),
            viewport,
            config,
            selected: None,
            gesture: Gesture::Idle,
            needs_redraw: true,
        }
    }

    /// Replaces the document and resets camera, selection and gesture state.
    pub fn open(&mut self, diagram: Diagram) {
        self.diagram = diagram;
        self.camera = Camera::default();
        self.selected = None;
        self.gesture = Gesture::Idle;
        self.needs_redraw = true;
    }

    /// Current camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current viewport size.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Updates the viewport size after a layout change. The camera is left untouched.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.needs_redraw = true;
        }
    }

    /// Replaces the camera tunables.
    pub fn set_config(&mut self, config: CanvasConfig) {
        self.config = config;
    }

    /// Currently selected symbol id.
    pub fn selected(&self) -> Option<&SymbolId> {
        self.selected.as_ref()
    }

    /// Currently selected symbol.
    pub fn selected_symbol(&self) -> Option<&Symbol> {
        self.selected.as_deref().and_then(|id| self.diagram.symbol(id))
    }

    /// Selects an existing symbol; unknown ids are ignored.
    pub fn select(&mut self, id: &str) {
        if self.diagram.symbol(id).is_some() {
            self.selected = Some(id.to_string());
            self.needs_redraw = true;
        }
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.needs_redraw = true;
        }
    }

    /// Current gesture.
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Returns whether a redraw was requested since the last call, and resets the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Converts viewport pixels to world coordinates.
    pub fn screen_to_world(&self, p: Point) -> Point {
        self.camera.screen_to_world(p)
    }

    /// Converts world coordinates to viewport pixels.
    pub fn world_to_screen(&self, w: Point) -> Point {
        self.camera.world_to_screen(w)
    }

    /// World point currently at the center of the viewport.
    pub fn viewport_center_world(&self) -> Point {
        self.camera.screen_to_world(self.viewport.center())
    }

    /// Adds a symbol at the viewport center and selects it.
    ///
    /// Metadata is expected to have been validated by the caller.
    pub fn add_symbol(&mut self, props: SymbolProps) -> Symbol {
        let center = self.viewport_center_world();
        let symbol = Symbol::new(props, center.x, center.y);
        log::debug!("added {:?} symbol {} at ({}, {})", symbol.kind(), symbol.id, center.x, center.y);
        self.selected = Some(symbol.id.clone());
        self.diagram.nodes.push(symbol.clone());
        self.needs_redraw = true;
        symbol
    }

    /// Moves a symbol to a new world position. Unknown ids are ignored.
    pub fn update_symbol_position(&mut self, id: &str, x: f64, y: f64) {
        if let Some(symbol) = self.diagram.symbol_mut(id) {
            symbol.x = x;
            symbol.y = y;
            self.needs_redraw = true;
        }
    }

    /// Replaces a symbol's metadata. The kind never changes: a payload of another kind,
    /// or an unknown id, leaves the diagram untouched. Returns whether anything changed.
    pub fn edit_symbol(&mut self, id: &str, props: SymbolProps) -> bool {
        match self.diagram.symbol_mut(id) {
            Some(symbol) if symbol.kind() == props.kind() => {
                symbol.props = props;
                self.needs_redraw = true;
                true
            }
            Some(symbol) => {
                log::warn!(
                    "ignored edit of {} from {:?} to {:?}",
                    id,
                    symbol.kind(),
                    props.kind()
                );
                false
            }
            None => false,
        }
    }

    /// Removes a symbol, clearing the selection if it pointed at it. Unknown ids are ignored.
    pub fn delete_symbol(&mut self, id: &str) -> Option<Symbol> {
        let removed = self.diagram.remove(id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if matches!(&self.gesture, Gesture::Dragging { id: dragged, .. } if dragged == id) {
            self.gesture = Gesture::Idle;
        }
        self.needs_redraw = true;
        Some(removed)
    }

    /// Moves the camera by a pixel delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
        self.needs_redraw = true;
    }

    /// Zooms one step about the pointer, keeping the world point under it in place.
    pub fn zoom(&mut self, pointer_x: f64, pointer_y: f64, direction: ZoomDirection) {
        self.camera.zoom_at(
            Point::new(pointer_x, pointer_y),
            direction,
            self.config.zoom_step,
            self.config.scale_limits,
        );
        self.needs_redraw = true;
    }

    /// Zooms one step in the direction given by a wheel delta (positive zooms out).
    pub fn zoom_wheel(&mut self, pointer: Point, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        self.zoom(pointer.x, pointer.y, ZoomDirection::from_wheel_delta(delta_y));
    }

    /// Centers the content in the viewport, zooming out if needed but never past 1:1.
    /// Does nothing when the diagram is empty.
    pub fn fit_to_content(&mut self) {
        let points = self.diagram.nodes.iter().map(|s| Point::new(s.x, s.y));
        if let Some(bounds) = Bounds::of_points(points) {
            self.camera = Camera::fitting(bounds.expanded(self.config.fit_padding), self.viewport);
            self.needs_redraw = true;
        }
    }

    /// Topmost symbol whose body contains the world point.
    pub fn hit_test(&self, world: Point) -> Option<&Symbol> {
        self.diagram
            .nodes
            .iter()
            .rev()
            .find(|s| symbol_bounds(s).contains(world))
    }

    /// Starts a pointer gesture at a pixel position.
    ///
    /// Pressing on a symbol selects it and begins dragging it; pressing on empty canvas
    /// begins panning. The mode stays fixed until [`end_gesture`](Self::end_gesture).
    pub fn begin_gesture(&mut self, pointer: Point) -> &Gesture {
        let world = self.screen_to_world(pointer);
        self.gesture = match self.hit_test(world) {
            Some(symbol) => {
                let id = symbol.id.clone();
                let grab_offset = Point::new(symbol.x, symbol.y) - world;
                self.selected = Some(id.clone());
                Gesture::Dragging { id, grab_offset }
            }
            None => Gesture::Panning { last: pointer },
        };
        self.needs_redraw = true;
        &self.gesture
    }

    /// Feeds a pointer move into the active gesture.
    pub fn gesture_move(&mut self, pointer: Point) {
        match self.gesture.clone() {
            Gesture::Idle => {}
            Gesture::Panning { last } => {
                let delta = pointer - last;
                self.pan(delta.x, delta.y);
                self.gesture = Gesture::Panning { last: pointer };
            }
            Gesture::Dragging { id, grab_offset } => {
                let target = self.screen_to_world(pointer) + grab_offset;
                self.update_symbol_position(&id, target.x, target.y);
            }
        }
    }

    /// Ends the active gesture. Returns the id of the symbol that was being dragged, if any.
    pub fn end_gesture(&mut self) -> Option<SymbolId> {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Dragging { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Renders the current view to PNG bytes at `density` × the viewport size.
    pub fn export_raster(&self, density: f64) -> Result<Vec<u8>, ExportError> {
        export::render_png(&self.diagram, &self.camera, self.viewport, density)
    }

    /// SVG of the current view.
    pub fn export_svg(&self) -> String {
        export::build_svg(&self.diagram, &self.camera, self.viewport)
    }
}
