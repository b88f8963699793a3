//! Domain error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning a song into an image
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SongError {
    /// Fewer samples than pixels at the requested resolution
    #[error("Not enough song data to make an image with resolution {width}x{height} ({samples} samples)")]
    InsufficientAudio {
        width: u32,
        height: u32,
        samples: usize,
    },

    /// The audio file could not be read or decoded
    #[error("Failed to decode audio file {}: {message}", path.display())]
    AudioDecode { path: PathBuf, message: String },

    /// Conflicting or malformed settings, reported before any work starts
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A saved playback trace could not be parsed
    #[error("Malformed trace file at line {line}: {message}")]
    TraceFormat { line: usize, message: String },
}

impl SongError {
    pub fn config(message: impl Into<String>) -> Self {
        SongError::Configuration(message.into())
    }

    pub fn trace(line: usize, message: impl Into<String>) -> Self {
        SongError::TraceFormat {
            line,
            message: message.into(),
        }
    }
}

/// Result type for song operations
pub type SongResult<T> = Result<T, SongError>;
