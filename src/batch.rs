use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::audio::cache::SongCache;
use crate::audio::decode::is_supported;
use crate::audio::track::SongTrack;
use crate::cli::{Cli, DEFAULT_BEAT_COLOR, DEFAULT_OFF_BEAT_COLOR, DEFAULT_RESOLUTION};
use crate::config::Config;
use crate::error::{SongError, SongResult};
use crate::geometry::Resolution;
use crate::render::pixels::Rgba;
use crate::render::png::save_png;
use crate::trace;
use crate::walker::engine::paint;
use crate::walker::{CollisionPolicy, Compass, Palette, WalkerConfig};

/// Validated settings shared by every job of a run
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub resolutions: Vec<Resolution>,
    pub walker: WalkerConfig,
    pub out_dir: PathBuf,
    pub trace: bool,
}

impl Settings {
    /// Merge the config file under the command line and validate the result.
    /// Config values apply only where the flag was not given.
    pub fn resolve(cli: &Cli, cfg: Option<&Config>) -> SongResult<Self> {
        let default_cfg = Config::default();
        let cfg = cfg.unwrap_or(&default_cfg);

        let raw_resolutions: Vec<&str> = if !cli.resolution.is_empty() {
            cli.resolution.iter().map(String::as_str).collect()
        } else if !cfg.output.resolutions.is_empty() {
            cfg.output.resolutions.iter().map(String::as_str).collect()
        } else {
            vec![DEFAULT_RESOLUTION]
        };
        let mut resolutions: Vec<Resolution> = Vec::with_capacity(raw_resolutions.len());
        for raw in raw_resolutions {
            let res: Resolution = raw.parse()?;
            if !resolutions.contains(&res) {
                resolutions.push(res);
            }
        }

        let beat = cli
            .beat_color
            .as_deref()
            .or(cfg.colors.beat.as_deref())
            .unwrap_or(DEFAULT_BEAT_COLOR);
        let off_beat = cli
            .off_beat_color
            .as_deref()
            .or(cfg.colors.off_beat.as_deref())
            .unwrap_or(DEFAULT_OFF_BEAT_COLOR);
        let palette = Palette {
            beat: beat.parse::<Rgba>()?,
            off_beat: off_beat.parse::<Rgba>()?,
        };

        let collision = match (cli.wrap_collisions, cli.collide_180) {
            (true, true) => {
                return Err(SongError::config(
                    "--wrap-collisions and --collide-180 are mutually exclusive",
                ))
            }
            (true, false) => CollisionPolicy::Wrap,
            (false, true) => CollisionPolicy::Flip180,
            (false, false) => cfg.walker.collision.unwrap_or_default(),
        };

        let algorithm = cli.alg.or(cfg.walker.algorithm).unwrap_or_default();
        let color_policy = cli.color_policy.or(cfg.walker.color_policy).unwrap_or_default();
        let compass = if cli.four_directions || cfg.walker.four_directions {
            Compass::FourWay
        } else {
            Compass::EightWay
        };

        let out_dir = cli
            .out_dir
            .clone()
            .or_else(|| cfg.output.out_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            resolutions,
            walker: WalkerConfig {
                algorithm,
                compass,
                collision,
                color_policy,
                palette,
                start_middle: cli.start_middle || cfg.walker.start_middle,
            },
            out_dir,
            trace: cli.trace || cfg.output.trace,
        })
    }
}

/// Expand inputs into absolute song paths. Directories contribute their
/// supported audio files in name order.
pub fn discover_songs(inputs: &[PathBuf]) -> SongResult<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(SongError::config("at least one song or directory is required"));
    }

    let mut songs = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = std::fs::read_dir(input).map_err(|e| {
                SongError::config(format!("cannot read directory {}: {}", input.display(), e))
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_supported(p))
                .collect();
            found.sort();
            if found.is_empty() {
                log::warn!("No songs found in {}", input.display());
            }
            songs.extend(found);
        } else if input.is_file() {
            if !is_supported(input) {
                return Err(SongError::config(format!(
                    "unsupported song file {} (expected one of mp3, m4a, wav, flac, ogg)",
                    input.display()
                )));
            }
            songs.push(input.clone());
        } else {
            return Err(SongError::config(format!("input not found: {}", input.display())));
        }
    }

    songs
        .into_iter()
        .map(|p| {
            p.canonicalize()
                .map_err(|e| SongError::config(format!("cannot resolve {}: {}", p.display(), e)))
        })
        .collect()
}

/// `<song-stem>-<W>x<H>-alg-<algorithm>.png`
pub fn output_path(out_dir: &Path, song: &Path, resolution: Resolution, walker: &WalkerConfig) -> PathBuf {
    let stem = song
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "song".to_string());
    out_dir.join(format!(
        "{}-{}-alg-{}.png",
        stem,
        resolution,
        walker.algorithm.name()
    ))
}

#[derive(Debug)]
pub enum JobOutcome {
    Written(PathBuf),
    /// The song is too short for this resolution
    Skipped(SongError),
    Failed(anyhow::Error),
}

pub fn run_job(song: &Path, resolution: Resolution, settings: &Settings, cache: &SongCache) -> JobOutcome {
    let track = match SongTrack::load(song, resolution, cache) {
        Ok(track) => track,
        Err(e @ SongError::InsufficientAudio { .. }) => return JobOutcome::Skipped(e),
        Err(e) => return JobOutcome::Failed(e.into()),
    };

    let painting = paint(&track, settings.walker, settings.trace);
    let png_path = output_path(&settings.out_dir, song, resolution, &settings.walker);
    log::debug!(
        "{} @ {}: {} of {} pixels painted, {} color changes",
        song.display(),
        resolution,
        painting.pixels.painted(),
        painting.summary.visited,
        painting.summary.changed
    );

    // The trace format carries pixel time on its events, so an empty trace
    // could not be read back faithfully.
    let written = save_png(&painting.pixels, &png_path).and_then(|_| match &painting.trace {
        Some(t) if t.is_empty() => {
            log::warn!("No color changes for {} @ {}; trace not written", song.display(), resolution);
            Ok(())
        }
        Some(t) => trace::file::save(t, &png_path.with_extension("trace")),
        None => Ok(()),
    });

    match written {
        Ok(()) => JobOutcome::Written(png_path),
        Err(e) => JobOutcome::Failed(e),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written + self.skipped + self.failed
    }
}

/// Render every song at every resolution. One job's failure never stops
/// the others.
pub fn run_batch(songs: &[PathBuf], settings: &Settings, cache: &SongCache) -> Result<BatchReport> {
    let jobs: Vec<(&PathBuf, Resolution)> = songs
        .iter()
        .flat_map(|song| settings.resolutions.iter().map(move |&res| (song, res)))
        .collect();

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} images ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let outcomes: Vec<JobOutcome> = jobs
        .par_iter()
        .map(|&(song, res)| {
            let outcome = run_job(song, res, settings, cache);
            match &outcome {
                JobOutcome::Written(path) => log::info!("Wrote {}", path.display()),
                JobOutcome::Skipped(e) => log::warn!("Skipping {} @ {}: {}", song.display(), res, e),
                JobOutcome::Failed(e) => log::error!("Failed {} @ {}: {:#}", song.display(), res, e),
            }
            pb.inc(1);
            outcome
        })
        .collect();

    pb.finish_with_message("Painting complete");

    let mut report = BatchReport::default();
    for outcome in &outcomes {
        match outcome {
            JobOutcome::Written(_) => report.written += 1,
            JobOutcome::Skipped(_) => report.skipped += 1,
            JobOutcome::Failed(_) => report.failed += 1,
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::cache::SongLoader;
    use crate::audio::DecodedSong;
    use crate::walker::{Algorithm, ColorPolicy};
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("songpaint").chain(args.iter().copied())).unwrap()
    }

    struct SyntheticLoader;

    impl SongLoader for SyntheticLoader {
        fn load(&self, path: &Path) -> SongResult<DecodedSong> {
            if path.to_string_lossy().contains("broken") {
                return Err(SongError::AudioDecode {
                    path: path.to_path_buf(),
                    message: "not audio".into(),
                });
            }
            let samples = (0..1024).map(|i| ((i as f32) * 0.3).sin()).collect();
            Ok(DecodedSong::new(path, samples, 256, 100.0))
        }
    }

    #[test]
    fn defaults_without_config() {
        let settings = Settings::resolve(&cli(&["a.mp3"]), None).unwrap();
        assert_eq!(settings.resolutions, vec![Resolution::new(512, 512)]);
        assert_eq!(settings.walker, WalkerConfig::default());
        assert_eq!(settings.out_dir, PathBuf::from("."));
        assert!(!settings.trace);
    }

    #[test]
    fn resolutions_are_deduplicated_in_order() {
        let settings =
            Settings::resolve(&cli(&["a.mp3", "-r", "8x8", "-r", "4x2", "-r", "8x8"]), None).unwrap();
        assert_eq!(settings.resolutions, vec![Resolution::new(8, 8), Resolution::new(4, 2)]);
    }

    #[test]
    fn config_fills_cli_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [output]
            out_dir = "renders"
            resolutions = ["16x16"]
            [colors]
            beat = "1,2,3"
            [walker]
            algorithm = "fib"
            collision = "wrap"
            color_policy = "overwrite"
            "#,
        )
        .unwrap();
        let settings = Settings::resolve(&cli(&["a.mp3", "--alg", "fib-tight"]), Some(&cfg)).unwrap();
        assert_eq!(settings.resolutions, vec![Resolution::new(16, 16)]);
        assert_eq!(settings.out_dir, PathBuf::from("renders"));
        assert_eq!(settings.walker.palette.beat, Rgba::opaque(1, 2, 3));
        assert_eq!(settings.walker.algorithm, Algorithm::FibTight);
        assert_eq!(settings.walker.collision, CollisionPolicy::Wrap);
        assert_eq!(settings.walker.color_policy, ColorPolicy::Overwrite);

        let settings = Settings::resolve(&cli(&["a.mp3", "--collide-180"]), Some(&cfg)).unwrap();
        assert_eq!(settings.walker.collision, CollisionPolicy::Flip180);
    }

    #[test]
    fn explicit_flags_win_even_at_default_values() {
        let cfg: Config = toml::from_str(
            r#"
            [output]
            out_dir = "renders"
            [colors]
            beat = "1,2,3"
            [walker]
            algorithm = "fib"
            color_policy = "overwrite"
            "#,
        )
        .unwrap();
        let args = [
            "a.mp3",
            "--alg",
            "basic",
            "--color-policy",
            "first-write-wins",
            "-b",
            DEFAULT_BEAT_COLOR,
            "--out-dir",
            ".",
        ];
        let settings = Settings::resolve(&cli(&args), Some(&cfg)).unwrap();
        assert_eq!(settings.walker.algorithm, Algorithm::Basic);
        assert_eq!(settings.walker.color_policy, ColorPolicy::FirstWriteWins);
        assert_eq!(settings.walker.palette, Palette::default());
        assert_eq!(settings.out_dir, PathBuf::from("."));
    }

    #[test]
    fn malformed_settings_are_configuration_errors() {
        for args in [
            vec!["a.mp3", "-r", "big"],
            vec!["a.mp3", "-b", "300,0,0"],
            vec!["a.mp3", "-o", "1,2"],
        ] {
            let err = Settings::resolve(&cli(&args), None).unwrap_err();
            assert!(matches!(err, SongError::Configuration(_)), "{args:?}");
        }
    }

    #[test]
    fn discovers_songs_in_directories() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp3", "a.wav", "cover.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let songs = discover_songs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = songs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.wav", "b.mp3"]);
        assert!(songs.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn rejects_missing_and_unsupported_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"x").unwrap();

        assert!(matches!(discover_songs(&[]), Err(SongError::Configuration(_))));
        assert!(matches!(discover_songs(&[txt]), Err(SongError::Configuration(_))));
        assert!(matches!(
            discover_songs(&[dir.path().join("missing.mp3")]),
            Err(SongError::Configuration(_))
        ));
    }

    #[test]
    fn output_names_follow_song_and_variant() {
        let config = WalkerConfig {
            algorithm: Algorithm::FibTight,
            ..Default::default()
        };
        let path = output_path(Path::new("/out"), Path::new("/music/My Song.mp3"), Resolution::new(64, 32), &config);
        assert_eq!(path, PathBuf::from("/out/My Song-64x32-alg-fib-tight.png"));
    }

    #[test]
    fn batch_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::resolve(&cli(&["a.mp3", "-r", "8x8", "-r", "64x64", "--trace"]), None).unwrap();
        settings.out_dir = dir.path().to_path_buf();

        let cache = SongCache::with_loader(SyntheticLoader);
        let songs = vec![PathBuf::from("/music/good.mp3"), PathBuf::from("/music/broken.mp3")];
        let report = run_batch(&songs, &settings, &cache).unwrap();

        // good@8x8 written; good@64x64 too short; broken fails at both sizes
        assert_eq!(report, BatchReport { written: 1, skipped: 1, failed: 2 });
        assert_eq!(report.total(), 4);
        assert_eq!(cache.requested(), 2);

        let png = dir.path().join("good-8x8-alg-basic.png");
        assert!(png.exists());
        let saved = trace::file::load(&png.with_extension("trace")).unwrap();
        assert_eq!(saved.source(), Path::new("/music/good.mp3"));
        assert_eq!(saved.resolution(), Resolution::new(8, 8));
    }
}
