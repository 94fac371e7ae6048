//! Pixel grids and the bilinear grid sampler

use crate::{Error, Result, Uv};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// An RGBA sample with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black; marks texels left for an external content-fill tool
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque grey with every colour channel set to `value`
    pub const fn gray(value: f32) -> Self {
        Self::new(value, value, value, 1.0)
    }

    /// Linear interpolation between two colours
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        Rgba::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

/// Read-only access to a rectangular RGBA pixel buffer
pub trait ImageSource {
    /// Width in pixels
    fn width(&self) -> usize;

    /// Height in pixels
    fn height(&self) -> usize;

    /// Sample the image at `uv`; out-of-range coordinates are clamped
    fn sample(&self, uv: Uv) -> Rgba;
}

/// Sample `pixels` at `uv` by averaging the 2×2 texels around it.
///
/// The texel neighbourhood is found by flooring and ceiling `uv * (size - 1)`
/// on each axis and clamping to the buffer edge, so the sampler never reads
/// out of bounds.
pub fn sample_bilinear(pixels: &[Rgba], width: usize, height: usize, uv: Uv) -> Rgba {
    let max_x = width.saturating_sub(1);
    let max_y = height.saturating_sub(1);
    let fx = (uv.x * max_x as f32).clamp(0.0, max_x as f32);
    let fy = (uv.y * max_y as f32).clamp(0.0, max_y as f32);

    let x1 = fx.floor() as usize;
    let x2 = (fx.ceil() as usize).min(max_x);
    let y1 = fy.floor() as usize;
    let y2 = (fy.ceil() as usize).min(max_y);

    let a = pixels[y1 * width + x1];
    let b = pixels[y1 * width + x2];
    let c = pixels[y2 * width + x1];
    let d = pixels[y2 * width + x2];

    Rgba::new(
        (a.r + b.r + c.r + d.r) / 4.0,
        (a.g + b.g + c.g + d.g) / 4.0,
        (a.b + b.b + c.b + d.b) / 4.0,
        (a.a + b.a + c.a + d.a) / 4.0,
    )
}

/// An owned RGBA image, row-major with row 0 first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbaImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl RgbaImage {
    /// Create an image from its pixels
    pub fn new(width: usize, height: usize, pixels: Vec<Rgba>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidData(format!(
                "image must not be empty, got {}x{}",
                width, height
            )));
        }
        Error::check_len("image pixels", width * height, pixels.len())?;
        Ok(Self { width, height, pixels })
    }

    /// Create an image filled with a single colour
    pub fn filled(width: usize, height: usize, color: Rgba) -> Result<Self> {
        Self::new(width, height, vec![color; width * height])
    }

    /// Create an image by evaluating `f(col, row)` for every pixel
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> Rgba) -> Result<Self> {
        let pixels = (0..width * height)
            .map(|i| f(i % width, i / width))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Pixels as a flat slice
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Pixel at `(col, row)`
    pub fn pixel(&self, col: usize, row: usize) -> Rgba {
        self.pixels[row * self.width + col]
    }

    /// Set the pixel at `(col, row)`
    pub fn set_pixel(&mut self, col: usize, row: usize, color: Rgba) {
        self.pixels[row * self.width + col] = color;
    }

    /// Number of fully transparent pixels (alpha = 0)
    pub fn transparent_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.a == 0.0).count()
    }
}

impl ImageSource for RgbaImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn sample(&self, uv: Uv) -> Rgba {
        sample_bilinear(&self.pixels, self.width, self.height, uv)
    }
}
