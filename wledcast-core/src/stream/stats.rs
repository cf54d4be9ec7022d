//! Rolling throughput for the streaming loop.
//!
//! The loop records a completion timestamp per cycle into a bounded
//! window; observers get a copied [`StreamStats`] snapshot instead of
//! reading the window directly.

use std::collections::VecDeque;

use tokio::time::Instant;

use super::phase::StreamPhase;

/// Completion times of the last `capacity` cycles.
#[derive(Debug, Clone)]
pub struct FrameTimes {
    stamps: VecDeque<Instant>,
    capacity: usize,
}

impl FrameTimes {
    /// A window over the last `capacity` cycles (at least 2).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            stamps: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self) {
        self.record_at(Instant::now());
    }

    /// Record with an explicit timestamp (useful for testing).
    pub fn record_at(&mut self, when: Instant) {
        if self.stamps.len() == self.capacity {
            self.stamps.pop_front();
        }
        self.stamps.push_back(when);
    }

    /// Cycles per second across the window. Zero until two cycles exist.
    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.stamps.front(), self.stamps.back()) else {
            return 0.0;
        };
        let span = last.duration_since(*first);
        if span.is_zero() {
            return 0.0;
        }
        (self.stamps.len() - 1) as f64 / span.as_secs_f64()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

impl Default for FrameTimes {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Snapshot published after every cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub phase: StreamPhase,
    /// Frames handed to the sinks.
    pub frames_sent: u64,
    /// Cycles where the source had no frame.
    pub frames_dropped: u64,
    /// Frames not sent because they matched the previous one.
    pub duplicates_skipped: u64,
    /// Failed destination writes, counted per destination.
    pub transmit_errors: u64,
    /// Rolling frames per second.
    pub fps: f64,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn empty_window_reports_zero() {
        let times = FrameTimes::new(10);
        assert_eq!(times.fps(), 0.0);
    }

    #[test]
    fn steady_rate() {
        let mut times = FrameTimes::new(5);
        let t0 = Instant::now();
        for i in 0..5 {
            times.record_at(t0 + Duration::from_millis(100 * i));
        }
        assert!((times.fps() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn window_is_bounded() {
        let mut times = FrameTimes::new(3);
        let t0 = Instant::now();
        // A slow start followed by fast frames: only the fast ones count.
        times.record_at(t0);
        times.record_at(t0 + Duration::from_secs(10));
        for i in 1..=3 {
            times.record_at(t0 + Duration::from_secs(10) + Duration::from_millis(50 * i));
        }
        assert_eq!(times.len(), 3);
        assert!((times.fps() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn capacity_has_a_floor() {
        let mut times = FrameTimes::new(0);
        let t0 = Instant::now();
        times.record_at(t0);
        times.record_at(t0 + Duration::from_millis(250));
        assert!((times.fps() - 4.0).abs() < 1e-9);
    }
}
