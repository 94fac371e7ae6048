//! Synthetic inputs shared by the demo binaries

use photomesh_core::{Result, Rgba, RgbaImage};

/// Colour, disparity and matte for a ball in front of a tilted wall
pub struct Scene {
    pub color: RgbaImage,
    pub depth: RgbaImage,
    pub foreground: RgbaImage,
}

impl Scene {
    pub fn ball_and_wall(size: usize) -> Result<Self> {
        let center = size as f32 / 2.0;
        let radius = size as f32 / 4.0;
        let ball = move |col: usize, row: usize| {
            let dx = (col as f32 - center) / radius;
            let dy = (row as f32 - center) / radius;
            let r2 = dx * dx + dy * dy;
            (r2 < 1.0).then(|| (1.0 - r2).sqrt())
        };

        let color = RgbaImage::from_fn(size, size, |col, row| match ball(col, row) {
            Some(_) => Rgba::new(0.9, 0.3, 0.2, 1.0),
            None => Rgba::new(0.2, 0.4, col as f32 / size as f32, 1.0),
        })?;
        // Disparity: the wall recedes towards the top, the ball bulges out of it
        let depth = RgbaImage::from_fn(size, size, |col, row| {
            let wall = 0.1 + 0.3 * row as f32 / size as f32;
            Rgba::gray(ball(col, row).map_or(wall, |h| 0.7 + 0.2 * h))
        })?;
        let foreground = RgbaImage::from_fn(size, size, |col, row| {
            if ball(col, row).is_some() { Rgba::WHITE } else { Rgba::TRANSPARENT }
        })?;

        Ok(Self { color, depth, foreground })
    }
}
