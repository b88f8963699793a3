use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::analysis::estimate_tempo;
use super::decode::decode_audio;
use super::DecodedSong;
use crate::error::{SongError, SongResult};

/// Source of decoded songs. The cache calls this at most once per path.
pub trait SongLoader: Send + Sync {
    fn load(&self, path: &Path) -> SongResult<DecodedSong>;
}

/// Decodes with symphonia and estimates tempo from spectral-flux onsets.
pub struct SymphoniaLoader;

impl SongLoader for SymphoniaLoader {
    fn load(&self, path: &Path) -> SongResult<DecodedSong> {
        let audio = decode_audio(path).map_err(|e| SongError::AudioDecode {
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        })?;
        let tempo = estimate_tempo(&audio.samples, audio.sample_rate);
        let song = DecodedSong::new(path, audio.samples, audio.sample_rate, tempo as f64);
        log::info!(
            "Loaded {}: {:.1}s @ {}Hz, tempo={:.1} BPM",
            path.display(),
            song.duration,
            song.sample_rate,
            song.tempo_bpm
        );
        Ok(song)
    }
}

/// A per-path slot; `None` until the first load finishes.
type Slot = Arc<Mutex<Option<SongResult<Arc<DecodedSong>>>>>;

/// Memoizes decoded songs by file path.
///
/// The map lock is only held to find or create a slot; lookups of known
/// paths share a read lock. Loading happens
/// under the slot's own lock, so concurrent requests for one path decode it
/// once while other paths load in parallel. Failures are memoized too.
pub struct SongCache {
    loader: Box<dyn SongLoader>,
    entries: RwLock<HashMap<PathBuf, Slot>>,
}

impl SongCache {
    pub fn new() -> Self {
        Self::with_loader(SymphoniaLoader)
    }

    pub fn with_loader(loader: impl SongLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_load(&self, path: &Path) -> SongResult<Arc<DecodedSong>> {
        let slot = self.slot(path);
        let mut slot = slot.lock();
        if let Some(result) = slot.as_ref() {
            log::debug!("Song cache hit: {}", path.display());
            return result.clone();
        }

        let result = self.loader.load(path).map(Arc::new);
        *slot = Some(result.clone());
        result
    }

    fn slot(&self, path: &Path) -> Slot {
        if let Some(slot) = self.entries.read().get(path) {
            return Arc::clone(slot);
        }
        // Another thread may have inserted between the two locks
        Arc::clone(self.entries.write().entry(path.to_path_buf()).or_default())
    }

    /// Number of distinct paths that have been requested
    pub fn requested(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for SongCache {
    fn default() -> Self {
        Self::new()
    }
}
