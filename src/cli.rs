use clap::Parser;
use std::path::PathBuf;

use crate::walker::{Algorithm, ColorPolicy};

pub const DEFAULT_RESOLUTION: &str = "512x512";
pub const DEFAULT_BEAT_COLOR: &str = "255,221,74";
pub const DEFAULT_OFF_BEAT_COLOR: &str = "60,105,151";

#[derive(Parser, Debug)]
#[command(name = "songpaint", about = "Paint an image by walking across it in time with a song")]
pub struct Cli {
    /// Songs to paint (MP3, M4A, WAV, FLAC, OGG) or directories containing them
    pub inputs: Vec<PathBuf>,

    /// Image resolution as <num>x<num>; repeat for several images per song
    #[arg(short, long)]
    pub resolution: Vec<String>,

    /// Color used for beat pixels (<r>,<g>,<b>) [default: 255,221,74]
    #[arg(short, long)]
    pub beat_color: Option<String>,

    /// Color used for off-beat pixels (<r>,<g>,<b>) [default: 60,105,151]
    #[arg(short, long)]
    pub off_beat_color: Option<String>,

    /// Walker algorithm [default: basic]
    #[arg(long, value_enum)]
    pub alg: Option<Algorithm>,

    /// Start in the middle of the image instead of the top-left corner
    #[arg(long)]
    pub start_middle: bool,

    /// Use 4 directions (90 degree turns) instead of 8
    #[arg(long)]
    pub four_directions: bool,

    /// Wrap around to the opposite edge instead of turning away from it
    #[arg(long, conflicts_with = "collide_180")]
    pub wrap_collisions: bool,

    /// Mirror off the edge instead of turning to find a new direction
    #[arg(long = "collide-180")]
    pub collide_180: bool,

    /// Pixel color policy [default: first-write-wins]
    #[arg(long, value_enum)]
    pub color_policy: Option<ColorPolicy>,

    /// Output directory [default: .]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Also write a playback trace next to each image
    #[arg(long)]
    pub trace: bool,

    /// Rebuild an image from a saved trace instead of walking a song
    #[arg(long, value_name = "TRACE")]
    pub replay: Option<PathBuf>,

    /// Config file (defaults to ./songpaint.toml or ~/.config/songpaint/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "songpaint",
            "song.mp3",
            "-r",
            "64x64",
            "-r",
            "128x32",
            "--alg",
            "fib-tight",
            "--wrap-collisions",
            "--four-directions",
            "--color-policy",
            "overwrite",
            "--trace",
        ])
        .unwrap();
        assert_eq!(cli.inputs, vec![PathBuf::from("song.mp3")]);
        assert_eq!(cli.resolution, vec!["64x64", "128x32"]);
        assert_eq!(cli.alg, Some(Algorithm::FibTight));
        assert_eq!(cli.color_policy, Some(ColorPolicy::Overwrite));
        assert!(cli.wrap_collisions && cli.four_directions && cli.trace);
        assert_eq!(cli.beat_color, None);
        assert_eq!(cli.out_dir, None);
    }

    #[test]
    fn collision_flags_are_exclusive() {
        let err = Cli::try_parse_from(["songpaint", "a.mp3", "--wrap-collisions", "--collide-180"]);
        assert!(err.is_err());
    }
}
