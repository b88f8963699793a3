use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{SongError, SongResult};
use crate::walker::{Algorithm, CollisionPolicy, ColorPolicy};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub walker: WalkerSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    #[serde(default)]
    pub resolutions: Vec<String>,
    #[serde(default)]
    pub trace: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColorConfig {
    pub beat: Option<String>,
    pub off_beat: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WalkerSection {
    pub algorithm: Option<Algorithm>,
    #[serde(default)]
    pub four_directions: bool,
    #[serde(default)]
    pub start_middle: bool,
    pub collision: Option<CollisionPolicy>,
    pub color_policy: Option<ColorPolicy>,
}

/// Find and parse the config file. No file at all is fine; a file that
/// cannot be read or parsed is a configuration error.
pub fn load_config(explicit: Option<&Path>) -> SongResult<Option<Config>> {
    let Some(path) = find_config(explicit) else {
        return Ok(None);
    };
    let config = read_config(&path)?;
    log::info!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn read_config(path: &Path) -> SongResult<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SongError::config(format!("cannot read config {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| SongError::config(format!("invalid config {}: {}", path.display(), e)))
}

/// Explicit path, then `./songpaint.toml`, then the per-user config file.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("songpaint.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("songpaint").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("songpaint").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
