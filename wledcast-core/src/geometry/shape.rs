//! Primitive LED layouts.
//!
//! Both generators return untagged points in wire order: the first
//! element is the first LED on the strip.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CastError;
use crate::geometry::LedPoint;

// ── Corner ───────────────────────────────────────────────────────

/// Where the first LED of a matrix sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    fn starts_right(self) -> bool {
        matches!(self, Corner::TopRight | Corner::BottomRight)
    }

    fn starts_bottom(self) -> bool {
        matches!(self, Corner::BottomLeft | Corner::BottomRight)
    }
}

impl FromStr for Corner {
    type Err = CastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topleft" => Ok(Corner::TopLeft),
            "topright" => Ok(Corner::TopRight),
            "bottomleft" => Ok(Corner::BottomLeft),
            "bottomright" => Ok(Corner::BottomRight),
            other => Err(CastError::invalid_argument(
                "matrix",
                format!(
                    "first corner {other:?}, expected one of topleft, topright, bottomleft, bottomright"
                ),
            )),
        }
    }
}

// ── Generators ───────────────────────────────────────────────────

/// A `width × height` grid scanned row by row from `first`.
///
/// Rows are never serpentine: every row runs in the same direction.
pub fn matrix(width: u32, height: u32, first: Corner) -> Vec<LedPoint> {
    let mut points = Vec::with_capacity(width as usize * height as usize);

    for row in 0..height {
        let y = if first.starts_bottom() {
            height - 1 - row
        } else {
            row
        };
        for col in 0..width {
            let x = if first.starts_right() {
                width - 1 - col
            } else {
                col
            };
            points.push(LedPoint::new(x as f64, y as f64));
        }
    }

    points
}

/// `count` LEDs evenly spaced on a circle of `diameter` centred on the
/// origin, starting at `start_angle` degrees.
///
/// The first `count - crop` LEDs are kept (an arc), then the order is
/// flipped when `reverse` is set. Cropping more than `count` yields an
/// empty list.
pub fn ring(count: u32, diameter: f64, start_angle: f64, reverse: bool, crop: u32) -> Vec<LedPoint> {
    if count == 0 {
        return Vec::new();
    }

    let radius = diameter / 2.0;
    let step = 360.0 / count as f64;
    let kept = count.saturating_sub(crop);

    let mut points: Vec<LedPoint> = (0..kept)
        .map(|i| {
            let theta = (start_angle + i as f64 * step).to_radians();
            LedPoint::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect();

    if reverse {
        points.reverse();
    }
    points
}

// ── Tests ────────────────────────────────────────────────────────
