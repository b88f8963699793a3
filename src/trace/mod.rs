pub mod file;
pub mod replay;

use std::path::{Path, PathBuf};

use crate::geometry::{Point, Resolution};
use crate::render::pixels::Rgba;

/// One color change, in the order the walker made it
#[derive(Clone, Copy, Debug)]
pub struct PlaybackEvent {
    pub position: Point,
    pub color: Rgba,
    /// Whole seconds into the song
    pub timestamp: f64,
    /// Seconds of audio one pixel represents
    pub duration: f64,
}

/// Events are identified by where they draw; a later event at the same
/// position supersedes an earlier one.
impl PartialEq for PlaybackEvent {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

/// Append-only log of the pixels a walk colored
#[derive(Clone, Debug)]
pub struct PlaybackTrace {
    source: PathBuf,
    resolution: Resolution,
    pixel_time: f64,
    events: Vec<PlaybackEvent>,
}

impl PlaybackTrace {
    pub fn new(source: impl Into<PathBuf>, resolution: Resolution, pixel_time: f64) -> Self {
        Self {
            source: source.into(),
            resolution,
            pixel_time,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: PlaybackEvent) {
        self.events.push(event);
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn pixel_time(&self) -> f64 {
        self.pixel_time
    }

    pub fn events(&self) -> &[PlaybackEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(x: i64, y: i64, timestamp: f64) -> PlaybackEvent {
        PlaybackEvent {
            position: Point::new(x, y),
            color: Rgba::opaque(1, 2, 3),
            timestamp,
            duration: 0.5,
        }
    }

    #[test]
    fn events_are_equal_by_position() {
        let a = event(1, 1, 0.0);
        let mut b = event(1, 1, 9.0);
        b.color = Rgba::TRANSPARENT;
        assert_eq!(a, b);
        assert_ne!(a, event(1, 2, 0.0));
    }

    #[test]
    fn trace_keeps_append_order() {
        let mut trace = PlaybackTrace::new("/music/a.mp3", Resolution::new(4, 4), 0.5);
        assert!(trace.is_empty());
        trace.push(event(3, 3, 0.0));
        trace.push(event(0, 0, 1.0));
        trace.push(event(3, 3, 2.0));
        assert_eq!(trace.len(), 3);
        let ts: Vec<f64> = trace.events().iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![0.0, 1.0, 2.0]);
        assert_eq!(trace.source(), Path::new("/music/a.mp3"));
    }
}
