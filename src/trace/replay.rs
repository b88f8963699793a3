use std::collections::VecDeque;
use std::time::Duration;

use super::{PlaybackEvent, PlaybackTrace};
use crate::render::pixels::PixelBuffer;

/// Hands out trace events front to back, each with the delay a player
/// should wait before drawing it.
pub struct ReplayCursor {
    pending: VecDeque<PlaybackEvent>,
    speed: f64,
}

impl ReplayCursor {
    /// `speed` scales every event's duration; 1.0 replays in song time.
    pub fn new(trace: &PlaybackTrace, speed: f64) -> Self {
        Self {
            pending: trace.events().iter().copied().collect(),
            speed: speed.max(0.0),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for ReplayCursor {
    type Item = (Duration, PlaybackEvent);

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.pending.pop_front()?;
        let delay = Duration::try_from_secs_f64(event.duration * self.speed).unwrap_or_default();
        Some((delay, event))
    }
}

/// Re-create the walker's image by drawing every event in order.
pub fn rebuild(trace: &PlaybackTrace) -> PixelBuffer {
    let mut pixels = PixelBuffer::new(trace.resolution());
    let mut skipped = 0usize;
    for event in trace.events() {
        if !pixels.set(event.position, event.color) {
            skipped += 1;
        }
    }
    if skipped > 0 {
        log::warn!("Skipped {} trace events outside {}", skipped, trace.resolution());
    }
    pixels
}
