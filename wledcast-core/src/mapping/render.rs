//! Text and SVG previews of a mapping.
//!
//! Diagnostic only: nothing on the streaming path calls into here.

use crate::error::CastError;
use crate::frame::Rgb;
use crate::mapping::Mapping;

/// Canvas scaling for [`render_ascii`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsciiOptions {
    /// Characters per LED-space unit, horizontally.
    pub scale_x: f64,
    /// Lines per LED-space unit, vertically.
    pub scale_y: f64,
}

impl Default for AsciiOptions {
    fn default() -> Self {
        // Terminal cells are roughly twice as tall as wide.
        Self {
            scale_x: 6.0,
            scale_y: 3.0,
        }
    }
}

/// Draw each LED as its index on a character grid.
///
/// When `colors` is given (in mapping order), LEDs whose colour is
/// black are drawn as `.` so lit areas stand out.
pub fn render_ascii(
    mapping: &Mapping,
    opts: AsciiOptions,
    colors: Option<&[Rgb]>,
) -> Result<String, CastError> {
    let bbox = mapping.bounding_box()?;
    let width = (bbox.width() * opts.scale_x).max(1.0) as usize;
    let height = (bbox.height() * opts.scale_y).max(1.0) as usize;

    let mut canvas = vec![vec![' '; width]; height];

    for (index, p) in mapping.points().iter().enumerate() {
        let cx = ((p.position.x - bbox.min.x) * opts.scale_x) as usize;
        let cy = ((p.position.y - bbox.min.y) * opts.scale_y) as usize;
        let Some(row) = canvas.get_mut(cy) else {
            continue;
        };

        let lit = colors
            .and_then(|c| c.get(index))
            .is_none_or(|c| !c.is_black());
        let label = index.to_string();
        for (i, ch) in label.chars().enumerate() {
            if let Some(cell) = row.get_mut(cx + i) {
                *cell = if lit { ch } else { '.' };
            }
        }
    }

    Ok(canvas
        .into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n"))
}

const CIRCLE_RADIUS: f64 = 15.0;
const FONT_SIZE: f64 = 10.0;
const LABELS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// An SVG document with one labelled circle per LED.
///
/// Labels are `<destination letter><index within destination>`, so the
/// wiring order of every sink can be read off the picture. With
/// `colors` (mapping order) each circle is filled with its sampled colour.
pub fn render_svg(
    mapping: &Mapping,
    scale: f64,
    colors: Option<&[Rgb]>,
) -> Result<String, CastError> {
    let bbox = mapping.bounding_box()?;
    let spacing = 2.0 * CIRCLE_RADIUS * scale;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{}" height="{}">"#,
        bbox.width() * spacing,
        bbox.height() * spacing,
    );
    svg.push('\n');

    let mut counters = vec![0usize; mapping.destinations().len()];
    for (index, p) in mapping.points().iter().enumerate() {
        let slot = mapping
            .destinations()
            .iter()
            .position(|d| d.id == p.destination)
            .unwrap_or(0);
        let prefix = LABELS[slot % LABELS.len()] as char;
        let nth = counters[slot];
        counters[slot] += 1;

        let fill = match colors.and_then(|c| c.get(index)) {
            Some(c) => format!("rgb({},{},{})", c.r, c.g, c.b),
            None => "lightblue".to_string(),
        };
        let cx = (p.position.x - bbox.min.x) * spacing + CIRCLE_RADIUS;
        let cy = (p.position.y - bbox.min.y) * spacing + CIRCLE_RADIUS;
        svg.push_str(&format!(
            r#"<circle cx="{cx}" cy="{cy}" r="{CIRCLE_RADIUS}" fill="{fill}" stroke="black" stroke-width="1" />"#,
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{cx}" y="{cy}" font-size="{FONT_SIZE}" text-anchor="middle" alignment-baseline="middle" fill="black">{prefix}{nth}</text>"#,
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>");
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Corner, matrix, ring};

    #[test]
    fn ascii_matrix_labels() {
        let mapping = Mapping::new(matrix(2, 2, Corner::TopLeft));
        let opts = AsciiOptions {
            scale_x: 2.0,
            scale_y: 1.0,
        };
        let text = render_ascii(&mapping, opts, None).unwrap();
        assert_eq!(text, "0 1 \n2 3 ");
    }

    #[test]
    fn ascii_marks_dark_leds() {
        let mapping = Mapping::new(matrix(2, 1, Corner::TopLeft));
        let colors = [Rgb::WHITE, Rgb::BLACK];
        let opts = AsciiOptions {
            scale_x: 2.0,
            scale_y: 1.0,
        };
        let text = render_ascii(&mapping, opts, Some(&colors)).unwrap();
        assert_eq!(text, "0 . ");
    }

    #[test]
    fn ascii_ring_renders() {
        let mapping = Mapping::new(ring(60, 16.6, -90.0, false, 0));
        let text = render_ascii(&mapping, AsciiOptions::default(), None).unwrap();
        assert!(text.contains("59"));
    }

    #[test]
    fn svg_labels_per_destination() {
        let mut pts = matrix(3, 1, Corner::TopLeft);
        pts[2].destination = Some("second".into());
        let mapping = Mapping::new(pts);

        let svg = render_svg(&mapping, 1.0, None).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">A0<") && svg.contains(">A1<") && svg.contains(">B0<"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.lines().count(), 1 + 2 * 3 + 1);
    }

    #[test]
    fn svg_fills_sampled_colours() {
        let mapping = Mapping::new(matrix(2, 1, Corner::TopLeft));
        let colors = [Rgb::new(255, 0, 0), Rgb::BLACK];
        let svg = render_svg(&mapping, 1.0, Some(&colors)).unwrap();
        assert!(svg.contains(r#"fill="rgb(255,0,0)""#));
        assert!(svg.contains(r#"fill="rgb(0,0,0)""#));
        assert!(!svg.contains("lightblue"));
    }

    #[test]
    fn empty_mapping_cannot_render() {
        let mapping = Mapping::new(Vec::new());
        assert!(render_ascii(&mapping, AsciiOptions::default(), None).is_err());
        assert!(render_svg(&mapping, 1.0, None).is_err());
    }
}
