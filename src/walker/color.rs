use serde::Deserialize;

use crate::geometry::Point;
use crate::render::pixels::{PixelBuffer, Rgba};

/// Rule for whether a visited pixel may be recolored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPolicy {
    /// Off-beat pixels may be promoted to beat pixels; nothing is downgraded
    #[default]
    FirstWriteWins,
    /// Every visit stamps the color of the current feature
    Overwrite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub beat: Rgba,
    pub off_beat: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            beat: Rgba::opaque(255, 221, 74),
            off_beat: Rgba::opaque(60, 105, 151),
        }
    }
}

impl ColorPolicy {
    /// The color `current` should become on a visit, if it changes at all.
    pub fn decide(self, palette: &Palette, current: Rgba, beat: bool) -> Option<Rgba> {
        let next = match self {
            ColorPolicy::Overwrite => {
                if beat {
                    palette.beat
                } else {
                    palette.off_beat
                }
            }
            ColorPolicy::FirstWriteWins => {
                if !beat && current.is_transparent() {
                    palette.off_beat
                } else if current.is_transparent() || current == palette.off_beat {
                    palette.beat
                } else {
                    return None;
                }
            }
        };
        (next != current).then_some(next)
    }

    /// Apply the policy at `at`; returns the new color when the pixel changed.
    pub fn paint(self, palette: &Palette, pixels: &mut PixelBuffer, at: Point, beat: bool) -> Option<Rgba> {
        let current = pixels.get(at)?;
        let next = self.decide(palette, current, beat)?;
        pixels.set(at, next);
        Some(next)
    }
}
