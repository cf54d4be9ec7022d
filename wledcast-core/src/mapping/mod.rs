//! Flattened LED mapping and per-frame sampling.
//!
//! A [`Mapping`] is built once from a topology and never mutated, so a
//! single `Arc<Mapping>` can be read by every frame of a session.
//!
//! ```text
//! Frame ──► sample(points of destination A) ──► [Rgb] ──► sink A
//!       └─► sample(points of destination B) ──► [Rgb] ──► sink B
//! ```

pub mod render;

use std::collections::HashMap;

use futures::future::join_all;
use serde::Serialize;

use crate::error::CastError;
use crate::frame::{Frame, Rgb};
use crate::geometry::{DestinationId, LedPoint, Point};
use crate::sink::SinkSet;

pub use render::{AsciiOptions, render_ascii, render_svg};

// ── Sampling ─────────────────────────────────────────────────────

/// Colours of `frame` at `points`, in the same order.
///
/// Fractional coordinates truncate to the pixel they fall in. Anything
/// outside the frame (including NaN) reads as black.
pub fn sample(frame: &Frame, points: &[Point]) -> Vec<Rgb> {
    let width = frame.width() as f64;
    let height = frame.height() as f64;

    points
        .iter()
        .map(|p| {
            if p.x >= 0.0 && p.x < width && p.y >= 0.0 && p.y < height {
                frame.pixel(p.x as u32, p.y as u32)
            } else {
                Rgb::BLACK
            }
        })
        .collect()
}

// ── Geometry queries ─────────────────────────────────────────────

/// Axis-aligned bounds of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Horizontal extent, counting both edge LEDs.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x + 1.0
    }

    /// Vertical extent, counting both edge LEDs.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y + 1.0
    }
}

/// Width and height of a mapping in LED space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

// ── Destination ──────────────────────────────────────────────────

/// The ordered slice of the mapping that one sink receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    pub id: DestinationId,
    pub points: Vec<Point>,
}

/// Outcome of one destination's share of a [`Mapping::write`].
#[derive(Debug)]
pub struct DestinationReport {
    pub id: DestinationId,
    pub pixels: usize,
    pub result: Result<(), CastError>,
}

// ── Mapping ──────────────────────────────────────────────────────

/// One mapped LED.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedPoint {
    pub position: Point,
    pub destination: DestinationId,
}

/// Finalized, ordered LED layout.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Mapping {
    points: Vec<MappedPoint>,
    destinations: Vec<Destination>,
}

impl Mapping {
    /// Finalize resolved points. Anything still untagged goes to the
    /// null sink.
    pub fn new(points: Vec<LedPoint>) -> Self {
        let points: Vec<MappedPoint> = points
            .into_iter()
            .map(|p| MappedPoint {
                position: p.position,
                destination: p.destination.unwrap_or_else(DestinationId::null),
            })
            .collect();

        let mut index: HashMap<&DestinationId, usize> = HashMap::new();
        let mut destinations: Vec<Destination> = Vec::new();
        for p in &points {
            let slot = *index.entry(&p.destination).or_insert_with(|| {
                destinations.push(Destination {
                    id: p.destination.clone(),
                    points: Vec::new(),
                });
                destinations.len() - 1
            });
            destinations[slot].points.push(p.position);
        }

        Self {
            points,
            destinations,
        }
    }

    /// A mapping whose points all go to one destination.
    pub fn single(id: impl Into<DestinationId>, points: Vec<LedPoint>) -> Self {
        let id = id.into();
        let points = points
            .into_iter()
            .map(|mut p| {
                p.tag(&id);
                p
            })
            .collect();
        Self::new(points)
    }

    /// Every point, in declaration order.
    pub fn points(&self) -> &[MappedPoint] {
        &self.points
    }

    /// Positions only, in declaration order.
    pub fn positions(&self) -> Vec<Point> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Destinations in order of first appearance.
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn destination(&self, id: &DestinationId) -> Option<&Destination> {
        self.destinations.iter().find(|d| &d.id == id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest box containing every point.
    pub fn bounding_box(&self) -> Result<BoundingBox, CastError> {
        let first = self.points.first().ok_or(CastError::EmptyMapping)?.position;
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(min, max), p| {
                (
                    Point::new(min.x.min(p.position.x), min.y.min(p.position.y)),
                    Point::new(max.x.max(p.position.x), max.y.max(p.position.y)),
                )
            });
        Ok(BoundingBox { min, max })
    }

    /// Extent of the bounding box; both sides are at least 1.
    pub fn size(&self) -> Result<Size, CastError> {
        let bbox = self.bounding_box()?;
        Ok(Size {
            width: bbox.width(),
            height: bbox.height(),
        })
    }

    /// Sample every point of the mapping, in declaration order.
    pub fn sample_all(&self, frame: &Frame) -> Vec<Rgb> {
        sample(frame, &self.positions())
    }

    /// Sample `frame` for every destination and hand the colours to its sink.
    ///
    /// Destinations are written concurrently. A failure on one does not
    /// stop the others; each outcome is reported separately. A
    /// destination with no bound sink is skipped.
    pub async fn write(&self, frame: &Frame, sinks: &SinkSet) -> Vec<DestinationReport> {
        let sends = self.destinations.iter().map(|dest| async move {
            let colors = sample(frame, &dest.points);
            let result = sinks.transmit(&dest.id, &colors).await;
            DestinationReport {
                id: dest.id.clone(),
                pixels: colors.len(),
                result,
            }
        });
        join_all(sends).await
    }

    /// JSON dump of the mapping for diagnostics.
    pub fn to_json(&self) -> Result<String, CastError> {
        Ok(serde_json::to_string_pretty(&self.points)?)
    }
}

impl std::fmt::Display for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mapping: {} pixels", self.len())?;
        if let (Ok(size), Ok(bbox)) = (self.size(), self.bounding_box()) {
            write!(
                f,
                ", size={}x{}, bbox=(({}, {}), ({}, {}))",
                size.width, size.height, bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y
            )?;
        }
        write!(f, ", {} destinations", self.destinations.len())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::geometry::{Corner, matrix, ring, translate};
    use crate::sink::FnSink;

    fn quad() -> Frame {
        // [[R, G], [B, W]]
        Frame::from_fn(2, 2, |x, y| match (x, y) {
            (0, 0) => Rgb::new(255, 0, 0),
            (1, 0) => Rgb::new(0, 255, 0),
            (0, 1) => Rgb::new(0, 0, 255),
            _ => Rgb::WHITE,
        })
    }

    #[test]
    fn sample_in_bounds_uses_floor() {
        let frame = quad();
        let pts = [Point::new(1.9, 0.2), Point::new(0.0, 1.99)];
        assert_eq!(
            sample(&frame, &pts),
            vec![Rgb::new(0, 255, 0), Rgb::new(0, 0, 255)]
        );
    }

    #[test]
    fn sample_out_of_bounds_is_black() {
        let frame = Frame::filled(4, 4, Rgb::WHITE);
        let pts = [
            Point::new(5.0, 5.0),
            Point::new(-0.5, 1.0),
            Point::new(4.0, 0.0),
            Point::new(f64::NAN, 0.0),
        ];
        assert_eq!(sample(&frame, &pts), vec![Rgb::BLACK; 4]);
    }

    #[test]
    fn sample_keeps_length_on_empty_frame() {
        let frame = Frame::filled(0, 0, Rgb::WHITE);
        let pts = ring(7, 3.0, 0.0, false, 0)
            .into_iter()
            .map(|p| p.position)
            .collect::<Vec<_>>();
        assert_eq!(sample(&frame, &pts).len(), 7);
    }

    #[test]
    fn bounding_box_and_size() {
        let mapping = Mapping::new(translate(matrix(4, 3, Corner::TopLeft), 2.0, 1.0));
        let bbox = mapping.bounding_box().unwrap();
        assert_eq!(bbox.min, Point::new(2.0, 1.0));
        assert_eq!(bbox.max, Point::new(5.0, 3.0));
        assert_eq!(
            mapping.size().unwrap(),
            Size {
                width: 4.0,
                height: 3.0
            }
        );
    }

    #[test]
    fn empty_mapping_geometry_fails() {
        let mapping = Mapping::new(Vec::new());
        assert!(matches!(mapping.bounding_box(), Err(CastError::EmptyMapping)));
        assert!(matches!(mapping.size(), Err(CastError::EmptyMapping)));
    }

    #[test]
    fn destinations_keep_relative_order() {
        let mut pts = matrix(3, 1, Corner::TopLeft);
        pts[1].destination = Some("b".into());
        let mapping = Mapping::new(pts);

        let ids: Vec<_> = mapping.destinations().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["none", "b"]);
        assert_eq!(
            mapping.destination(&DestinationId::null()).unwrap().points,
            vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0)]
        );
    }

    #[tokio::test]
    async fn write_hands_each_destination_its_colors() {
        let mut pts = matrix(2, 2, Corner::TopLeft);
        for p in &mut pts[2..] {
            p.destination = Some("bottom".into());
        }
        let mapping = Mapping::single("top", pts);

        let seen: Arc<Mutex<Vec<(String, Vec<Rgb>)>>> = Arc::default();
        let mut sinks = SinkSet::new();
        for id in ["top", "bottom"] {
            let seen = Arc::clone(&seen);
            sinks.insert(
                id,
                FnSink::new(move |colors: &[Rgb]| {
                    seen.lock().unwrap().push((id.to_string(), colors.to_vec()));
                    Ok(())
                }),
            );
        }

        let reports = mapping.write(&quad(), &sinks).await;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.result.is_ok() && r.pixels == 2));

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("bottom".into(), vec![Rgb::new(0, 0, 255), Rgb::WHITE]),
                ("top".into(), vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]),
            ]
        );
    }

    #[tokio::test]
    async fn write_isolates_failing_destination() {
        let mut pts = matrix(2, 1, Corner::TopLeft);
        pts[0].destination = Some("broken".into());
        pts[1].destination = Some("fine".into());
        let mapping = Mapping::new(pts);

        let mut sinks = SinkSet::new();
        sinks.insert(
            "broken",
            FnSink::new(|_: &[Rgb]| Err(CastError::Other("unplugged".into()))),
        );
        sinks.insert("fine", FnSink::new(|_: &[Rgb]| Ok(())));

        let reports = mapping.write(&quad(), &sinks).await;
        let broken = reports.iter().find(|r| r.id.as_str() == "broken").unwrap();
        let fine = reports.iter().find(|r| r.id.as_str() == "fine").unwrap();
        assert!(broken.result.is_err());
        assert!(fine.result.is_ok());
    }

    #[test]
    fn json_export_lists_points() {
        let mapping = Mapping::single("m", matrix(1, 1, Corner::TopLeft));
        let json = mapping.to_json().unwrap();
        assert!(json.contains("\"destination\": \"m\""));
    }
}
