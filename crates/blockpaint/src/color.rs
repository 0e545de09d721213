//! RGBA colors, distances and representative-color methods.

use nalgebra::Vector4;
use std::fmt;

/// Four 8-bit channels. Equality is exact per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn channels(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn from_channels(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    #[inline]
    pub fn to_vector(self) -> Vector4<f64> {
        Vector4::new(self.r as f64, self.g as f64, self.b as f64, self.a as f64)
    }

    /// Rounds and clamps each component into `0..=255`.
    pub fn from_vector(v: Vector4<f64>) -> Self {
        let q = |c: f64| c.round().clamp(0.0, 255.0) as u8;
        Self::new(q(v.x), q(v.y), q(v.z), q(v.w))
    }

    /// Squared Euclidean distance over all four channels.
    #[inline]
    pub fn distance_sq(self, other: Color) -> u32 {
        self.channels()
            .iter()
            .zip(other.channels())
            .map(|(&a, b)| {
                let d = a as i32 - b as i32;
                (d * d) as u32
            })
            .sum()
    }

    /// Euclidean distance in 4D channel space.
    #[inline]
    pub fn distance(self, other: Color) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    /// Every channel within `tolerance` of the other color's channel.
    #[inline]
    pub fn approx_eq(self, other: Color, tolerance: u8) -> bool {
        self.channels()
            .iter()
            .zip(other.channels())
            .all(|(&a, b)| a.abs_diff(b) <= tolerance)
    }

    /// Coarse bucket used to group similar colors (`bucket_size` per channel).
    pub fn bucket(self, bucket_size: u8) -> [u8; 4] {
        let s = bucket_size.max(1);
        self.channels().map(|c| c / s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.r, self.g, self.b, self.a)
    }
}

/// How a block's representative color is derived from target pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMethod {
    /// Arithmetic mean per channel, rounded.
    #[default]
    Average,
    /// Per-channel median.
    Median,
    /// Per-channel histogram peak.
    Mode,
}

/// Per-channel 256-bin histogram.
#[derive(Clone, Debug)]
pub struct Histogram {
    bins: [[u32; 256]; 4],
    count: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: [[0; 256]; 4],
            count: 0,
        }
    }
}

impl Histogram {
    #[inline]
    pub fn add(&mut self, c: Color) {
        for (bins, v) in self.bins.iter_mut().zip(c.channels()) {
            bins[v as usize] += 1;
        }
        self.count += 1;
    }

    /// Lowest value with the highest count, per channel.
    pub fn mode(&self) -> Color {
        Color::from_channels(self.bins.map(|bins| {
            let mut best = 0usize;
            for (v, &n) in bins.iter().enumerate() {
                if n > bins[best] {
                    best = v;
                }
            }
            best as u8
        }))
    }

    /// Lower median per channel.
    pub fn median(&self) -> Color {
        let half = self.count.saturating_sub(1) / 2;
        Color::from_channels(self.bins.map(|bins| {
            let mut seen = 0u64;
            for (v, &n) in bins.iter().enumerate() {
                seen += n as u64;
                if seen > half {
                    return v as u8;
                }
            }
            255
        }))
    }
}
