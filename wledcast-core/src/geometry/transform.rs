//! Coordinate-wise transforms.
//!
//! Order and destination binding pass through untouched.

use crate::geometry::LedPoint;

/// Offset every point by `(dx, dy)`.
pub fn translate(points: Vec<LedPoint>, dx: f64, dy: f64) -> Vec<LedPoint> {
    map_positions(points, |x, y| (x + dx, y + dy))
}

/// Multiply every coordinate by `factor` around the origin.
pub fn scale(points: Vec<LedPoint>, factor: f64) -> Vec<LedPoint> {
    map_positions(points, |x, y| (x * factor, y * factor))
}

/// Rotate counter-clockwise (in y-up terms) by `angle` degrees around the origin.
///
/// With the y axis pointing down, as in screen space, this reads as clockwise.
pub fn rotate(points: Vec<LedPoint>, angle: f64) -> Vec<LedPoint> {
    let (sin, cos) = angle.to_radians().sin_cos();
    map_positions(points, |x, y| (x * cos - y * sin, x * sin + y * cos))
}

fn map_positions(mut points: Vec<LedPoint>, f: impl Fn(f64, f64) -> (f64, f64)) -> Vec<LedPoint> {
    for p in &mut points {
        let (x, y) = f(p.position.x, p.position.y);
        p.position.x = x;
        p.position.y = y;
    }
    points
}
