//! Target image: the fixed picture every program is scored against.
//!
//! Purpose
//! - Random pixel access in canvas coordinates (bottom-left origin).
//! - Constant-time rectangle averages via per-channel summed-area tables; the
//!   tactics ask for averages of thousands of candidate strips per block.
//!
//! Decoding files is the caller's concern; `from_rgba_top_down` accepts the
//! row order image decoders produce.

use std::fmt;

use nalgebra::Vector4;

use crate::color::{Color, ColorMethod, Histogram};
use crate::geom::Shape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    Empty,
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "image has zero width or height"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "expected {expected} pixel bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for ImageError {}

/// Immutable RGBA target.
#[derive(Clone, Debug)]
pub struct TargetImage {
    width: u32,
    height: u32,
    /// Row-major, bottom row first.
    pixels: Vec<Color>,
    /// `(width+1) × (height+1)` inclusive prefix sums per channel.
    sums: Vec<[u64; 4]>,
}

impl TargetImage {
    /// Build from bottom-up, row-major pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected: expected * 4,
                actual: pixels.len() * 4,
            });
        }
        let sums = summed_area(width as usize, height as usize, &pixels);
        Ok(Self {
            width,
            height,
            pixels,
            sums,
        })
    }

    /// Build from raw RGBA bytes whose first row is the top of the picture.
    pub fn from_rgba_top_down(width: u32, height: u32, rgba: &[u8]) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        let row_bytes = width as usize * 4;
        let pixels = rgba
            .chunks_exact(row_bytes.max(1))
            .rev()
            .flat_map(|row| {
                row.chunks_exact(4)
                    .map(|c| Color::new(c[0], c[1], c[2], c[3]))
            })
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Single-color image, handy for tests and blank starts.
    pub fn uniform(width: u32, height: u32, color: Color) -> Result<Self, ImageError> {
        Self::from_pixels(width, height, vec![color; width as usize * height as usize])
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
    #[inline]
    pub fn shape(&self) -> Shape {
        Shape::canvas(self.width, self.height)
    }

    /// Pixel at `(x, y)`; callers stay inside the image.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Color {
        debug_assert!(x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height);
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Pixels of one row segment `[x0, x1)` at height `y`.
    #[inline]
    pub fn row(&self, y: i32, x0: i32, x1: i32) -> &[Color] {
        let base = y as usize * self.width as usize;
        &self.pixels[base + x0 as usize..base + x1 as usize]
    }

    /// Bottom-up, row-major pixel buffer.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Channel sums over a rectangle.
    pub fn channel_sums(&self, s: &Shape) -> [u64; 4] {
        let stride = self.width as usize + 1;
        let idx = |x: i32, y: i32| y as usize * stride + x as usize;
        let a = self.sums[idx(s.right(), s.top())];
        let b = self.sums[idx(s.left(), s.top())];
        let c = self.sums[idx(s.right(), s.bottom())];
        let d = self.sums[idx(s.left(), s.bottom())];
        [0, 1, 2, 3].map(|k| a[k] + d[k] - b[k] - c[k])
    }

    /// Rounded channel mean over a rectangle.
    pub fn average(&self, s: &Shape) -> Color {
        let sums = Vector4::from(self.channel_sums(s).map(|v| v as f64));
        Color::from_vector(sums / s.size() as f64)
    }

    pub fn histogram(&self, s: &Shape) -> Histogram {
        let mut h = Histogram::default();
        for y in s.bottom()..s.top() {
            for &c in self.row(y, s.left(), s.right()) {
                h.add(c);
            }
        }
        h
    }

    /// Representative color of a rectangle.
    pub fn representative(&self, s: &Shape, method: ColorMethod) -> Color {
        match method {
            ColorMethod::Average => self.average(s),
            ColorMethod::Median => self.histogram(s).median(),
            ColorMethod::Mode => self.histogram(s).mode(),
        }
    }

    /// Fraction of pixels in `s` within `tolerance` of `color`.
    pub fn match_fraction(&self, s: &Shape, color: Color, tolerance: u8) -> f64 {
        let mut hits = 0u64;
        for y in s.bottom()..s.top() {
            hits += self
                .row(y, s.left(), s.right())
                .iter()
                .filter(|c| c.approx_eq(color, tolerance))
                .count() as u64;
        }
        hits as f64 / s.size() as f64
    }

    /// Every pixel within `tolerance` of the rectangle's average.
    pub fn is_uniform(&self, s: &Shape, tolerance: u8) -> bool {
        let avg = self.average(s);
        (s.bottom()..s.top()).all(|y| {
            self.row(y, s.left(), s.right())
                .iter()
                .all(|c| c.approx_eq(avg, tolerance))
        })
    }

    /// Most frequent exact color over the whole image (ties: smallest color).
    pub fn dominant_color(&self) -> Color {
        let mut counts = std::collections::BTreeMap::new();
        for &c in &self.pixels {
            *counts.entry(c).or_insert(0u64) += 1;
        }
        let mut best = (Color::WHITE, 0u64);
        for (c, n) in counts {
            if n > best.1 {
                best = (c, n);
            }
        }
        best.0
    }
}

fn summed_area(width: usize, height: usize, pixels: &[Color]) -> Vec<[u64; 4]> {
    let stride = width + 1;
    let mut sums = vec![[0u64; 4]; stride * (height + 1)];
    for y in 0..height {
        let mut row = [0u64; 4];
        for x in 0..width {
            let ch = pixels[y * width + x].channels();
            for k in 0..4 {
                row[k] += ch[k] as u64;
            }
            let above = sums[y * stride + x + 1];
            let cell = &mut sums[(y + 1) * stride + x + 1];
            for k in 0..4 {
                cell[k] = above[k] + row[k];
            }
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> TargetImage {
        // 2x2 top-down: red green / blue white
        let rgba = [
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ];
        TargetImage::from_rgba_top_down(2, 2, &rgba).unwrap()
    }

    #[test]
    fn top_down_rows_are_flipped() {
        let img = checker();
        assert_eq!(img.pixel(0, 0), Color::new(0, 0, 255, 255));
        assert_eq!(img.pixel(1, 0), Color::WHITE);
        assert_eq!(img.pixel(0, 1), Color::new(255, 0, 0, 255));
    }

    #[test]
    fn summed_area_average_matches_scan() {
        let pixels: Vec<Color> = (0..35u8)
            .map(|i| Color::new(i * 7, 255 - i * 3, i, 200))
            .collect();
        let img = TargetImage::from_pixels(7, 5, pixels).unwrap();
        let s = Shape::new(1, 2, 6, 5);
        let mut sums = [0u64; 4];
        for p in s.pixels() {
            for (k, v) in img.pixel(p.x, p.y).channels().into_iter().enumerate() {
                sums[k] += v as u64;
            }
        }
        assert_eq!(img.channel_sums(&s), sums);
        let n = s.size();
        assert_eq!(img.average(&s), Color::from_channels(sums.map(|v| ((v + n / 2) / n) as u8)));
    }

    #[test]
    fn size_mismatch_is_reported() {
        let err = TargetImage::from_rgba_top_down(2, 2, &[0; 15]).unwrap_err();
        assert_eq!(
            err,
            ImageError::SizeMismatch {
                expected: 16,
                actual: 15
            }
        );
        assert_eq!(TargetImage::from_pixels(0, 3, vec![]).unwrap_err(), ImageError::Empty);
    }

    #[test]
    fn uniformity_and_dominant_color() {
        let img = checker();
        assert!(!img.is_uniform(&img.shape(), 10));
        assert!(img.is_uniform(&Shape::new(0, 0, 1, 1), 0));
        let mostly_white = TargetImage::from_pixels(
            3,
            1,
            vec![Color::WHITE, Color::BLACK, Color::WHITE],
        )
        .unwrap();
        assert_eq!(mostly_white.dominant_color(), Color::WHITE);
        let fraction = mostly_white.match_fraction(&mostly_white.shape(), Color::WHITE, 0);
        assert!((fraction - 2.0 / 3.0).abs() < 1e-12);
    }
}
