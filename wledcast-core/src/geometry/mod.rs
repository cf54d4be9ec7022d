//! LED-space geometry.
//!
//! Coordinates live in an abstract "LED space", independent of the
//! pixel grid of any source image. Shapes produce ordered coordinate
//! lists; transforms move them around without touching their order or
//! the destination they may already be bound to.

pub mod shape;
pub mod transform;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use shape::{Corner, matrix, ring};
pub use transform::{rotate, scale, translate};

// ── DestinationId ────────────────────────────────────────────────

/// Opaque name of an output sink.
///
/// Points never bound to a destination end up on [`DestinationId::NULL`],
/// which is never transmitted unless a caller binds a sink to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    /// Identifier of the null sink.
    pub const NULL: &'static str = "none";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null sink identifier.
    pub fn null() -> Self {
        Self(Self::NULL.to_string())
    }

    pub fn is_null(&self) -> bool {
        self.0 == Self::NULL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DestinationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DestinationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Point ────────────────────────────────────────────────────────

/// A position in LED space. May be fractional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

// ── LedPoint ─────────────────────────────────────────────────────

/// A point on its way through topology resolution.
///
/// `destination` is set exactly once, by the innermost node that binds
/// a controller. Outer bindings never overwrite it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedPoint {
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<DestinationId>,
}

impl LedPoint {
    /// An untagged point.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            destination: None,
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Bind to `id` unless already bound.
    pub fn tag(&mut self, id: &DestinationId) {
        if self.destination.is_none() {
            self.destination = Some(id.clone());
        }
    }
}

impl From<Point> for LedPoint {
    fn from(position: Point) -> Self {
        Self {
            position,
            destination: None,
        }
    }
}

/// Bind every untagged point in `points` to `id`.
pub fn tag_untagged(points: &mut [LedPoint], id: &DestinationId) {
    for p in points {
        p.tag(id);
    }
}
