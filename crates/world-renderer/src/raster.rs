//! Minimal software rasterizer used by the headless widget.

use glam::{DMat4, DVec3, DVec4};
use image::{Rgba, RgbaImage};

pub const BACKGROUND: [u8; 4] = [40, 44, 52, 255];
pub const GRID_COLOR: [u8; 4] = [90, 94, 102, 255];
pub const AXIS_X: [u8; 4] = [220, 60, 60, 255];
pub const AXIS_Y: [u8; 4] = [60, 200, 60, 255];
pub const AXIS_Z: [u8; 4] = [70, 110, 230, 255];

/// An RGBA image with a view-projection for drawing world-space primitives.
pub struct Canvas {
    image: RgbaImage,
    view_projection: DMat4,
}

impl Canvas {
    pub fn new(width: u32, height: u32, view_projection: DMat4) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(BACKGROUND)),
            view_projection,
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Projects a world point to pixel coordinates.
    ///
    /// Returns None for points behind the camera or outside the depth range.
    pub fn project(&self, point: DVec3) -> Option<(f64, f64)> {
        let clip = self.view_projection * DVec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= f64::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        let x = (ndc.x + 1.0) * 0.5 * self.image.width() as f64;
        let y = (1.0 - ndc.y) * 0.5 * self.image.height() as f64;
        Some((x, y))
    }

    /// Draws a world-space segment; skipped if an endpoint cannot be projected.
    pub fn line(&mut self, a: DVec3, b: DVec3, color: [u8; 4]) {
        if let (Some(pa), Some(pb)) = (self.project(a), self.project(b)) {
            self.line_2d(pa, pb, color);
        }
    }

    /// Draws a filled disc of `radius` pixels around a world point.
    pub fn disc(&mut self, center: DVec3, radius: f64, color: [u8; 4]) {
        let Some((cx, cy)) = self.project(center) else {
            return;
        };
        let r2 = radius * radius;
        let (x0, x1) = ((cx - radius).floor() as i64, (cx + radius).ceil() as i64);
        let (y0, y1) = ((cy - radius).floor() as i64, (cy + radius).ceil() as i64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                if dx * dx + dy * dy <= r2 {
                    self.put(x, y, color);
                }
            }
        }
    }

    fn line_2d(&mut self, (x0, y0): (f64, f64), (x1, y1): (f64, f64), color: [u8; 4]) {
        let (w, h) = (self.image.width() as f64, self.image.height() as f64);
        // Both ends far outside: nothing sensible to draw.
        let limit = 4.0 * w.max(h);
        if [x0, y0, x1, y1].iter().any(|v| v.abs() > limit) {
            return;
        }

        // Bresenham
        let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
        let (xe, ye) = (x1.round() as i64, y1.round() as i64);
        let dx = (xe - x).abs();
        let dy = -(ye - y).abs();
        let sx = if x < xe { 1 } else { -1 };
        let sy = if y < ye { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color);
            if x == xe && y == ye {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x >= 0 && y >= 0 && (x as u32) < self.image.width() && (y as u32) < self.image.height() {
            self.image.put_pixel(x as u32, y as u32, Rgba(color));
        }
    }
}
