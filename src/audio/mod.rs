pub mod analysis;
pub mod cache;
pub mod decode;
pub mod track;

use std::path::{Path, PathBuf};

/// A decoded, tempo-analysed song. Independent of any output resolution.
#[derive(Clone, Debug)]
pub struct DecodedSong {
    pub path: PathBuf,
    /// Mono waveform
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Length in seconds
    pub duration: f64,
    pub tempo_bpm: f64,
    /// Mean of |sample| across the whole song
    pub avg_abs_amplitude: f64,
}

impl DecodedSong {
    /// Builds a song whose duration follows from the sample count.
    pub fn new(path: impl Into<PathBuf>, samples: Vec<f32>, sample_rate: u32, tempo_bpm: f64) -> Self {
        let duration = samples.len() as f64 / sample_rate.max(1) as f64;
        Self::with_duration(path, samples, sample_rate, duration, tempo_bpm)
    }

    pub fn with_duration(
        path: impl Into<PathBuf>,
        samples: Vec<f32>,
        sample_rate: u32,
        duration: f64,
        tempo_bpm: f64,
    ) -> Self {
        let avg_abs_amplitude = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.abs() as f64).sum::<f64>() / samples.len() as f64
        };
        Self {
            path: path.into(),
            samples,
            sample_rate,
            duration,
            tempo_bpm,
            avg_abs_amplitude,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Beats per second
    pub fn bps(&self) -> f64 {
        self.tempo_bpm / 60.0
    }
}
