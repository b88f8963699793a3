mod audio;
mod batch;
mod cli;
mod config;
mod error;
mod geometry;
mod render;
mod trace;
mod walker;

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use audio::cache::SongCache;
use batch::{discover_songs, run_batch, Settings};
use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Every configuration problem surfaces here, before any audio is touched
    let cfg = config::load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, cfg.as_ref())?;

    if let Some(ref trace_path) = cli.replay {
        return replay(trace_path, &settings);
    }

    let songs = discover_songs(&cli.inputs)?;

    log::info!("songpaint - audio walker images");
    log::info!("Songs: {}", songs.len());
    log::info!(
        "Resolutions: {}",
        settings
            .resolutions
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    log::info!(
        "Walker: {} / {:?} / {:?} / {:?}",
        settings.walker.algorithm.name(),
        settings.walker.compass,
        settings.walker.collision,
        settings.walker.color_policy
    );
    log::info!("Output: {}", settings.out_dir.display());

    let cache = SongCache::new();
    let report = run_batch(&songs, &settings, &cache)?;

    log::info!(
        "Done: {} written, {} skipped (song too short), {} failed; {} distinct songs loaded",
        report.written,
        report.skipped,
        report.failed,
        cache.requested()
    );

    if report.total() > 0 && report.written == 0 {
        anyhow::bail!("No images were produced");
    }
    Ok(())
}

fn replay(trace_path: &Path, settings: &Settings) -> Result<()> {
    let saved = trace::file::load(trace_path)?;
    log::info!(
        "Replaying {} events from {} ({} @ {:.3}s per pixel)",
        saved.len(),
        saved.source().display(),
        saved.resolution(),
        saved.pixel_time()
    );

    let cursor = trace::replay::ReplayCursor::new(&saved, 1.0);
    log::debug!("{} events queued for playback", cursor.remaining());
    let playback: f64 = cursor.map(|(delay, _)| delay.as_secs_f64()).sum();
    log::info!("Real-time playback would take {:.1}s", playback);

    let pixels = trace::replay::rebuild(&saved);
    log::info!("Rebuilt {} painted pixels", pixels.painted());
    let stem = trace_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trace".to_string());
    let out = settings.out_dir.join(format!("{}-replay.png", stem));
    render::png::save_png(&pixels, &out)?;

    log::info!("Done! Output: {}", out.display());
    Ok(())
}
