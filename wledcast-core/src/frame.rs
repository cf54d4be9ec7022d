//! Raw frames handed to the mapping engine.
//!
//! Capture backends produce whatever layout the OS gives them (usually
//! padded BGRA); the engine only ever reads single pixels back out as
//! [`Rgb`], so no conversion pass over the whole image is needed.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::CastError;

// ── Rgb ──────────────────────────────────────────────────────────

/// One 8-bit-per-channel colour, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(self) -> bool {
        self == Self::BLACK
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 3 bytes per pixel: Red, Green, Blue.
    #[default]
    Rgb8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha (DXGI / most capture APIs).
    Bgra8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }

    fn decode(self, px: &[u8]) -> Rgb {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => Rgb::new(px[0], px[1], px[2]),
            PixelFormat::Bgra8 => Rgb::new(px[2], px[1], px[0]),
        }
    }
}

// ── Frame ────────────────────────────────────────────────────────

/// One raster image from a frame source.
///
/// The `data` buffer holds `height` rows of `stride` bytes each.
/// `stride` may be larger than `width * bytes_per_pixel` when the
/// capture backend pads rows.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    stride: u32,
    format: PixelFormat,
    data: Vec<u8>,
    /// When the source produced this frame.
    pub timestamp: Instant,
}

impl Frame {
    /// A tightly packed RGB8 frame.
    pub fn rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CastError> {
        let stride = width
            .checked_mul(PixelFormat::Rgb8.bytes_per_pixel() as u32)
            .ok_or_else(|| {
                CastError::invalid_argument("frame", format!("a {width}-pixel row overflows"))
            })?;
        Self::with_layout(width, height, stride, PixelFormat::Rgb8, data)
    }

    /// A frame with an explicit row pitch and pixel layout.
    pub fn with_layout(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, CastError> {
        let row = width as usize * format.bytes_per_pixel();
        if (stride as usize) < row {
            return Err(CastError::invalid_argument(
                "frame",
                format!("stride {stride} is shorter than a {width}-pixel row"),
            ));
        }
        let expected = stride as usize * height as usize;
        if data.len() < expected {
            return Err(CastError::invalid_argument(
                "frame",
                format!("buffer holds {} bytes, {width}x{height} needs {expected}", data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
            timestamp: Instant::now(),
        })
    }

    /// Build an RGB8 frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgb) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y).to_array());
            }
        }
        Self {
            width,
            height,
            stride: width.saturating_mul(3),
            format: PixelFormat::Rgb8,
            data,
            timestamp: Instant::now(),
        }
    }

    /// A frame filled with one colour.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Colour at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        self.format.decode(&self.data[offset..offset + bpp])
    }

    /// Whether both frames show the same image, ignoring capture time.
    pub fn same_pixels(&self, other: &Frame) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        if self.format == other.format && self.stride == other.stride {
            return self.data[..self.byte_len()] == other.data[..other.byte_len()];
        }
        (0..self.height).all(|y| (0..self.width).all(|x| self.pixel(x, y) == other.pixel(x, y)))
    }

    fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_frame_pixels() {
        let frame = Frame::rgb(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.pixel(0, 0), Rgb::new(1, 2, 3));
        assert_eq!(frame.pixel(1, 0), Rgb::new(4, 5, 6));
    }

    #[test]
    fn bgra_with_padding_decodes_to_rgb() {
        // One pixel per row, rows padded to 8 bytes.
        let data = vec![
            30, 20, 10, 255, 0, 0, 0, 0, //
            60, 50, 40, 255, 0, 0, 0, 0,
        ];
        let frame = Frame::with_layout(1, 2, 8, PixelFormat::Bgra8, data).unwrap();
        assert_eq!(frame.pixel(0, 0), Rgb::new(10, 20, 30));
        assert_eq!(frame.pixel(0, 1), Rgb::new(40, 50, 60));
    }

    #[test]
    fn short_buffer_rejected() {
        let err = Frame::rgb(2, 2, vec![0; 5]).unwrap_err();
        assert!(matches!(err, CastError::InvalidArgument { .. }));

        let err = Frame::with_layout(4, 1, 8, PixelFormat::Rgba8, vec![0; 16]).unwrap_err();
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn oversized_row_is_rejected() {
        let err = Frame::rgb(u32::MAX, 1, Vec::new()).unwrap_err();
        assert!(matches!(err, CastError::InvalidArgument { .. }));
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn same_pixels_across_layouts() {
        let rgb = Frame::filled(2, 2, Rgb::new(9, 8, 7));
        let bgra = Frame::with_layout(2, 2, 8, PixelFormat::Bgra8, [7, 8, 9, 0].repeat(4)).unwrap();
        assert!(rgb.same_pixels(&bgra));
        assert!(!rgb.same_pixels(&Frame::filled(2, 2, Rgb::BLACK)));
        assert!(!rgb.same_pixels(&Frame::filled(3, 2, Rgb::new(9, 8, 7))));
    }
}
