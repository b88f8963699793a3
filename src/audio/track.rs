use std::path::Path;
use std::sync::Arc;

use super::cache::SongCache;
use super::DecodedSong;
use crate::error::{SongError, SongResult};
use crate::geometry::Resolution;

/// Audio features sampled at one pixel index
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelFeature {
    pub beat: bool,
    /// Signed mean of the pixel's sample window
    pub amplitude: f64,
    /// Whole seconds into the song
    pub timestamp: f64,
}

/// A decoded song mapped onto an image of a given resolution.
///
/// Each pixel index owns `samples_per_pixel` consecutive samples and
/// `pixel_time` seconds of audio. Immutable once built.
#[derive(Clone, Debug)]
pub struct SongTrack {
    song: Arc<DecodedSong>,
    resolution: Resolution,
    num_pixels: usize,
    pixel_time: f64,
    samples_per_pixel: usize,
    /// `ceil(bps)`, the modulus of the beat rule
    beat_modulus: u64,
}

impl SongTrack {
    /// Load (or reuse) the decoded song at `path` and map it onto `resolution`.
    pub fn load(path: &Path, resolution: Resolution, cache: &SongCache) -> SongResult<Self> {
        let song = cache.get_or_load(path)?;
        Self::new(song, resolution)
    }

    pub fn new(song: Arc<DecodedSong>, resolution: Resolution) -> SongResult<Self> {
        let num_pixels = resolution.num_pixels();
        let samples_per_pixel = if num_pixels == 0 {
            0
        } else {
            song.samples.len() / num_pixels
        };

        if samples_per_pixel == 0 {
            return Err(SongError::InsufficientAudio {
                width: resolution.width,
                height: resolution.height,
                samples: song.samples.len(),
            });
        }

        let pixel_time = song.duration / num_pixels as f64;
        let beat_modulus = song.bps().ceil().max(0.0) as u64;

        log::debug!(
            "Track {} @ {}: pixel_time={:.6}s, samples_per_pixel={}, bps={:.3}",
            song.path.display(),
            resolution,
            pixel_time,
            samples_per_pixel,
            song.bps()
        );

        Ok(Self {
            song,
            resolution,
            num_pixels,
            pixel_time,
            samples_per_pixel,
            beat_modulus,
        })
    }

    /// Beat flag, mean amplitude and truncated timestamp for `pixel_idx`.
    pub fn feature_at(&self, pixel_idx: usize) -> PixelFeature {
        let timestamp = self.timestamp_at(pixel_idx);

        // Deliberately coarse: a beat is any whole second that divides ceil(bps)
        let seconds = timestamp as u64;
        let beat = seconds != 0 && self.beat_modulus % seconds == 0;

        PixelFeature {
            beat,
            amplitude: self.amplitude_at(pixel_idx),
            timestamp,
        }
    }

    pub fn timestamp_at(&self, pixel_idx: usize) -> f64 {
        (pixel_idx as f64 * self.pixel_time).floor()
    }

    fn amplitude_at(&self, pixel_idx: usize) -> f64 {
        let samples = &self.song.samples;
        let start = pixel_idx.saturating_mul(self.samples_per_pixel).min(samples.len());
        let end = start.saturating_add(self.samples_per_pixel).min(samples.len());
        let window = &samples[start..end];
        if window.is_empty() {
            return 0.0;
        }
        window.iter().map(|&s| s as f64).sum::<f64>() / window.len() as f64
    }

    pub fn song(&self) -> &DecodedSong {
        &self.song
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn num_pixels(&self) -> usize {
        self.num_pixels
    }

    pub fn pixel_time(&self) -> f64 {
        self.pixel_time
    }

    pub fn avg_abs_amplitude(&self) -> f64 {
        self.song.avg_abs_amplitude
    }
}
