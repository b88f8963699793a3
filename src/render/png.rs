use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::pixels::PixelBuffer;

/// Encode `pixels` as an RGBA PNG at `path`.
///
/// The image is written next to its destination and renamed into place, so
/// an interrupted run never leaves a truncated file behind.
pub fn save_png(pixels: &PixelBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let res = pixels.resolution();
    let tmp = path.with_extension("png.partial");
    image::save_buffer_with_format(
        &tmp,
        &pixels.to_rgba8(),
        res.width,
        res.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", tmp.display()))?;

    fs::rename(&tmp, path).with_context(|| format!("move png into place '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Resolution};
    use crate::render::pixels::Rgba;

    #[test]
    fn writes_readable_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");

        let mut pixels = PixelBuffer::new(Resolution::new(3, 2));
        pixels.set(Point::new(1, 1), Rgba::opaque(10, 20, 30));
        save_png(&pixels, &path).unwrap();

        assert!(!path.with_extension("png.partial").exists());
        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 1).0, [10, 20, 30, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
