//! Pull-based frame sources.
//!
//! A source is asked for one frame per cycle. It may hand out a frame,
//! report that nothing is available this cycle
//! (`Some(Err(CastError::FrameUnavailable(..)))`), or end the stream
//! with `None`. Live sources never end; looping sources wrap.

use std::time::Instant;

use crate::error::CastError;
use crate::frame::{Frame, Rgb};

/// Produces frames on demand.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<Result<Frame, CastError>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Option<Result<Frame, CastError>> {
        (**self).next_frame()
    }
}

// ── Iterator adapter ─────────────────────────────────────────────

/// Wraps any iterator of frames, e.g. a capture backend's frame stream.
pub struct IterSource<I>(I);

impl<I> IterSource<I>
where
    I: Iterator<Item = Result<Frame, CastError>> + Send,
{
    pub fn new(iter: I) -> Self {
        Self(iter)
    }
}

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = Result<Frame, CastError>> + Send,
{
    fn next_frame(&mut self) -> Option<Result<Frame, CastError>> {
        self.0.next()
    }
}

// ── Synthetic sources ────────────────────────────────────────────

/// A square that grows from nothing to `side` pixels and shrinks back,
/// cycling through cyan, magenta and yellow.
#[derive(Debug, Clone)]
pub struct GrowingSquare {
    side: u32,
    hue: usize,
    step: u32,
}

impl GrowingSquare {
    pub fn new(side: u32) -> Self {
        Self {
            side: side.max(1),
            hue: 0,
            step: 0,
        }
    }

    fn color(&self) -> Rgb {
        let mut c = [255u8; 3];
        c[self.hue] = 0;
        Rgb::from(c)
    }

    /// Square size at the current step: 0, 1, …, side-1, side-1, …, 0.
    fn size(&self) -> u32 {
        if self.step < self.side {
            self.step
        } else {
            2 * self.side - 1 - self.step
        }
    }
}

impl FrameSource for GrowingSquare {
    fn next_frame(&mut self) -> Option<Result<Frame, CastError>> {
        let size = self.size();
        let frame = Frame::filled(size, size, self.color());

        self.step += 1;
        if self.step >= 2 * self.side {
            self.step = 0;
            self.hue = (self.hue + 1) % 3;
        }
        Some(Ok(frame))
    }
}

/// The same single-colour frame, forever.
#[derive(Debug, Clone)]
pub struct SolidColor {
    frame: Frame,
}

impl SolidColor {
    pub fn new(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            frame: Frame::filled(width, height, color),
        }
    }
}

impl FrameSource for SolidColor {
    fn next_frame(&mut self) -> Option<Result<Frame, CastError>> {
        let mut frame = self.frame.clone();
        frame.timestamp = Instant::now();
        Some(Ok(frame))
    }
}

/// Alternating cells of two colours. With a non-zero `period` the
/// colours swap every `period` frames.
#[derive(Debug, Clone)]
pub struct Checkerboard {
    width: u32,
    height: u32,
    cell: u32,
    colors: [Rgb; 2],
    period: u32,
    count: u32,
}

impl Checkerboard {
    pub fn new(width: u32, height: u32, cell: u32) -> Self {
        Self {
            width,
            height,
            cell: cell.max(1),
            colors: [Rgb::WHITE, Rgb::BLACK],
            period: 0,
            count: 0,
        }
    }

    pub fn with_colors(mut self, a: Rgb, b: Rgb) -> Self {
        self.colors = [a, b];
        self
    }

    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }
}

impl FrameSource for Checkerboard {
    fn next_frame(&mut self) -> Option<Result<Frame, CastError>> {
        let [a, b] = self.colors;
        let cell = self.cell;
        let frame = Frame::from_fn(self.width, self.height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 { a } else { b }
        });

        if self.period > 0 {
            self.count += 1;
            if self.count >= self.period {
                self.count = 0;
                self.colors.swap(0, 1);
            }
        }
        Some(Ok(frame))
    }
}

/// Replays a fixed list of frames, wrapping at the end like a looping
/// video. An empty list ends immediately.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    frames: Vec<Frame>,
    pos: usize,
}

impl FrameLoop {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames, pos: 0 }
    }
}

impl FrameSource for FrameLoop {
    fn next_frame(&mut self) -> Option<Result<Frame, CastError>> {
        let mut frame = self.frames.get(self.pos)?.clone();
        self.pos = (self.pos + 1) % self.frames.len();
        frame.timestamp = Instant::now();
        Some(Ok(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(source: &mut impl FrameSource, n: usize) -> Vec<Frame> {
        (0..n)
            .map(|_| source.next_frame().unwrap().unwrap())
            .collect()
    }

    #[test]
    fn growing_square_grows_then_shrinks() {
        let mut src = GrowingSquare::new(3);
        let sizes: Vec<u32> = take(&mut src, 7).iter().map(Frame::width).collect();
        assert_eq!(sizes, vec![0, 1, 2, 2, 1, 0, 0]);
    }

    #[test]
    fn growing_square_cycles_hues() {
        let mut src = GrowingSquare::new(2);
        let frames = take(&mut src, 8);
        // Second frame of each 4-frame cycle is 1x1.
        assert_eq!(frames[1].pixel(0, 0), Rgb::new(0, 255, 255));
        assert_eq!(frames[5].pixel(0, 0), Rgb::new(255, 0, 255));
    }

    #[test]
    fn solid_is_constant() {
        let mut src = SolidColor::new(2, 2, Rgb::new(1, 2, 3));
        let frames = take(&mut src, 2);
        assert!(frames[0].same_pixels(&frames[1]));
        assert_eq!(frames[1].pixel(1, 1), Rgb::new(1, 2, 3));
    }

    #[test]
    fn checkerboard_cells_and_swap() {
        let mut src = Checkerboard::new(4, 2, 2).with_period(1);
        let frames = take(&mut src, 2);
        assert_eq!(frames[0].pixel(0, 0), Rgb::WHITE);
        assert_eq!(frames[0].pixel(2, 0), Rgb::BLACK);
        assert_eq!(frames[0].pixel(1, 1), Rgb::WHITE);
        assert_eq!(frames[1].pixel(0, 0), Rgb::BLACK);
    }

    #[test]
    fn frame_loop_wraps() {
        let red = Frame::filled(1, 1, Rgb::new(255, 0, 0));
        let blue = Frame::filled(1, 1, Rgb::new(0, 0, 255));
        let mut src = FrameLoop::new(vec![red, blue]);
        let colors: Vec<Rgb> = take(&mut src, 5).iter().map(|f| f.pixel(0, 0)).collect();
        assert_eq!(colors[0], colors[2]);
        assert_eq!(colors[1], colors[3]);
        assert_eq!(colors[4], Rgb::new(255, 0, 0));
    }

    #[test]
    fn empty_loop_ends() {
        assert!(FrameLoop::new(Vec::new()).next_frame().is_none());
    }

    #[test]
    fn iterator_adapter_passes_gaps_through() {
        let items = vec![
            Ok(Frame::filled(1, 1, Rgb::WHITE)),
            Err(CastError::FrameUnavailable("window hidden".into())),
        ];
        let mut src: Box<dyn FrameSource> = Box::new(IterSource::new(items.into_iter()));
        assert!(src.next_frame().unwrap().is_ok());
        assert!(src.next_frame().unwrap().is_err());
        assert!(src.next_frame().is_none());
    }
}
