//! Camera and coordinate transforms between viewport pixels and world space.
//!
//! A viewport pixel `p` maps to world `w = (p - offset) / scale`; the inverse is
//! `p = w * scale + offset`. Pan, zoom and fit all keep to this single pair.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// A 2D point or vector with `f64` components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// Size of the pixel rectangle the camera renders into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Viewport {
    /// Creates a viewport. Non-positive dimensions are raised to one pixel.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Pixel coordinates of the viewport center.
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            constants::DEFAULT_VIEWPORT_WIDTH,
            constants::DEFAULT_VIEWPORT_HEIGHT,
        )
    }
}

/// Axis-aligned bounding box in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Point,
    /// Maximum corner
    pub max: Point,
}

impl Bounds {
    /// Bounding box of a set of points, or `None` if the set is empty.
    pub fn of_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    /// Returns the box grown by `padding` on every side.
    pub fn expanded(self, padding: f64) -> Self {
        Bounds {
            min: Point::new(self.min.x - padding, self.min.y - padding),
            max: Point::new(self.max.x + padding, self.max.y + padding),
        }
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Whether the point lies inside or on the edge of the box.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Wheel direction for a single zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Multiply the scale by the zoom step
    In,
    /// Divide the scale by the zoom step
    Out,
}

impl ZoomDirection {
    /// Maps a wheel delta to a direction: positive deltas zoom out, everything else zooms in.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y > 0.0 {
            ZoomDirection::Out
        } else {
            ZoomDirection::In
        }
    }
}

/// Inclusive scale bounds applied by [`Camera::zoom_at`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleLimits {
    /// Smallest allowed scale, strictly positive
    pub min: f64,
    /// Largest allowed scale
    pub max: f64,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self {
            min: constants::MIN_SCALE,
            max: constants::MAX_SCALE,
        }
    }
}

impl ScaleLimits {
    fn clamp(&self, scale: f64) -> f64 {
        let min = self.min.max(f64::MIN_POSITIVE);
        scale.clamp(min, self.max.max(min))
    }
}

/// The pan/zoom transform of one viewing session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Pan offset in pixels
    pub offset: Point,
    /// Zoom scale, always greater than zero
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            scale: 1.0,
        }
    }
}

impl Camera {
    /// Converts viewport pixel coordinates to world coordinates.
    pub fn screen_to_world(&self, p: Point) -> Point {
        (p - self.offset) / self.scale
    }

    /// Converts world coordinates to viewport pixel coordinates.
    pub fn world_to_screen(&self, w: Point) -> Point {
        w * self.scale + self.offset
    }

    /// Moves the camera by a pixel-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset += Point::new(dx, dy);
    }

    /// Zooms one step about `pointer`, keeping the world point under it fixed on screen.
    ///
    /// The resulting scale is clamped to `limits`, but a step never moves the scale
    /// against `direction`: a camera already outside the limits (after a fit, say)
    /// stays where it is instead of jumping to the nearest bound. The offset is always
    /// solved for the scale that was actually applied.
    pub fn zoom_at(&mut self, pointer: Point, direction: ZoomDirection, step: f64, limits: ScaleLimits) {
        let anchor = self.screen_to_world(pointer);
        let current = self.scale;
        self.scale = match direction {
            ZoomDirection::In => limits.clamp(current * step).max(current),
            ZoomDirection::Out => limits.clamp(current / step).min(current),
        };
        self.offset = pointer - anchor * self.scale;
    }

    /// Camera that centers `content` (already padded) in `viewport`, never zooming past 1:1.
    pub fn fitting(content: Bounds, viewport: Viewport) -> Self {
        let width = content.width().max(f64::EPSILON);
        let height = content.height().max(f64::EPSILON);
        let scale = (viewport.width / width)
            .min(viewport.height / height)
            .min(1.0);
        let offset = Point::new(
            (viewport.width - width * scale) / 2.0 - content.min.x * scale,
            (viewport.height - height * scale) / 2.0 - content.min.y * scale,
        );
        Self { offset, scale }
    }

    /// Camera used for stored-diagram previews: content scaled to fill `viewport`
    /// (up or down) and anchored at the top-left corner.
    pub fn thumbnail(content: Bounds, viewport: Viewport) -> Self {
        let width = content.width().max(1.0);
        let height = content.height().max(1.0);
        let scale = (viewport.width / width).min(viewport.height / height);
        Self {
            offset: Point::new(-content.min.x * scale, -content.min.y * scale),
            scale,
        }
    }
}
