use std::fmt;
use std::str::FromStr;

use crate::error::SongError;
use crate::geometry::{Point, Resolution};

/// 8-bit RGBA color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn is_transparent(&self) -> bool {
        *self == Self::TRANSPARENT
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

/// Parses `r,g,b` into an opaque color
impl FromStr for Rgba {
    type Err = SongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            SongError::config(format!(
                "invalid color '{}', expected <num>,<num>,<num> with each channel 0-255",
                s
            ))
        };
        let channels = s
            .split(',')
            .map(|c| c.trim().parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match channels[..] {
            [r, g, b] => Ok(Rgba::opaque(r, g, b)),
            _ => Err(invalid()),
        }
    }
}

/// Row-major RGBA grid, initially fully transparent
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    resolution: Resolution,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            pixels: vec![Rgba::TRANSPARENT; resolution.num_pixels()],
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn index(&self, p: Point) -> Option<usize> {
        self.resolution
            .contains(p)
            .then(|| p.y as usize * self.resolution.width as usize + p.x as usize)
    }

    /// Color at `p`, or `None` outside the grid
    pub fn get(&self, p: Point) -> Option<Rgba> {
        self.index(p).map(|i| self.pixels[i])
    }

    /// Returns false when `p` is outside the grid.
    pub fn set(&mut self, p: Point, color: Rgba) -> bool {
        match self.index(p) {
            Some(i) => {
                self.pixels[i] = color;
                true
            }
            None => false,
        }
    }

    /// Count of pixels that are no longer transparent
    pub fn painted(&self) -> usize {
        self.pixels.iter().filter(|p| !p.is_transparent()).count()
    }

    /// Flatten to `width * height * 4` bytes
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect()
    }
}
