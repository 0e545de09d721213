//! PNG input and preview output.

use std::path::Path;

use anyhow::{Context, Result};
use blockpaint::canvas::Canvas;
use blockpaint::TargetImage;
use image::{Rgba, RgbaImage};

/// Decode a PNG (top-down rows) into a bottom-up target.
pub fn load_target(path: &Path) -> Result<TargetImage> {
    let img = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    TargetImage::from_rgba_top_down(w, h, img.as_raw())
        .with_context(|| format!("building target from {}", path.display()))
}

/// Write the rendered canvas as PNG.
pub fn save_preview(canvas: &Canvas, path: &Path) -> Result<()> {
    let pixels = canvas.render();
    let (w, h) = (canvas.width(), canvas.height());
    let img = RgbaImage::from_fn(w, h, |x, y| {
        // image rows run top-down
        let c = pixels[((h - 1 - y) * w + x) as usize];
        Rgba(c.channels())
    });
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    img.save(path)
        .with_context(|| format!("writing preview {}", path.display()))
}

/// Problem number from a file name such as `12.png`.
pub fn problem_id_from(path: &Path) -> Option<i64> {
    path.file_stem()?.to_str()?.parse().ok()
}
