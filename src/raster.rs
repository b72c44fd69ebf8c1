//! Software surface that rasterises draw lists into an RGBA image.
//!
//! Used for headless rendering (the demo's `--headless` mode writes PNGs)
//! and anywhere a GPU is unavailable. Discs and lines get one pixel of
//! coverage falloff at their edges; everything is blended source-over.

use std::path::Path;

use glam::Vec2;
use image::RgbaImage;

use crate::error::FieldError;
use crate::lifecycle::{Surface, SurfaceProvider};
use crate::render::{DrawList, LineSegment, PointSprite, Rgba};

/// CPU surface backed by an [`RgbaImage`].
pub struct RasterSurface {
    image: RgbaImage,
    released: bool,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            released: false,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Write the current frame as an image; the format follows the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FieldError> {
        self.image.save(path.as_ref())?;
        Ok(())
    }

    fn clear(&mut self, color: Rgba) {
        let pixel = image::Rgba(to_rgba8(color.with_alpha(1.0)));
        for p in self.image.pixels_mut() {
            *p = pixel;
        }
    }

    fn fill_disc(&mut self, sprite: &PointSprite) {
        let r = sprite.radius.max(0.5);
        let (x0, y0, x1, y1) = self.pixel_box(sprite.position - Vec2::splat(r + 1.0), sprite.position + Vec2::splat(r + 1.0));
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (r + 0.5 - center.distance(sprite.position)).clamp(0.0, 1.0);
                self.blend(x, y, sprite.color, coverage);
            }
        }
    }

    fn stroke_line(&mut self, line: &LineSegment) {
        let half = (line.width * 0.5).max(0.5);
        let pad = Vec2::splat(half + 1.0);
        let (x0, y0, x1, y1) = self.pixel_box(line.a.min(line.b) - pad, line.a.max(line.b) + pad);
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let d = distance_to_segment(center, line.a, line.b);
                let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
                self.blend(x, y, line.color, coverage);
            }
        }
    }

    /// Pixel range covering `min..max`, clipped to the image.
    fn pixel_box(&self, min: Vec2, max: Vec2) -> (u32, u32, u32, u32) {
        let (w, h) = self.image.dimensions();
        let clip = |v: f32, limit: u32| v.clamp(0.0, limit as f32) as u32;
        (
            clip(min.x.floor(), w),
            clip(min.y.floor(), h),
            clip(max.x.ceil(), w),
            clip(max.y.ceil(), h),
        )
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f32) {
        let alpha = color.a * coverage;
        if alpha <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x, y);
        let src = [color.r, color.g, color.b];
        for (c, s) in dst.0.iter_mut().zip(src) {
            let d = *c as f32 / 255.0;
            *c = ((s.clamp(0.0, 1.0) * alpha + d * (1.0 - alpha)) * 255.0).round() as u8;
        }
        let da = dst.0[3] as f32 / 255.0;
        dst.0[3] = ((alpha + da * (1.0 - alpha)) * 255.0).round() as u8;
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Vec2 {
        let (w, h) = self.image.dimensions();
        Vec2::new(w as f32, h as f32)
    }

    fn present(&mut self, frame: &DrawList) {
        if self.released {
            return;
        }
        self.clear(frame.clear);
        for line in &frame.lines {
            self.stroke_line(line);
        }
        for sprite in &frame.points {
            self.fill_disc(sprite);
        }
        for line in &frame.overlay_lines {
            self.stroke_line(line);
        }
        for sprite in &frame.overlay_points {
            self.fill_disc(sprite);
        }
    }

    fn release(&mut self) {
        self.image = RgbaImage::new(0, 0);
        self.released = true;
    }
}

/// Hands out raster surfaces of a fixed size. A zero-sized provider has
/// nothing to draw into.
#[derive(Debug, Clone, Copy)]
pub struct RasterProvider {
    pub width: u32,
    pub height: u32,
}

impl RasterProvider {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl SurfaceProvider for RasterProvider {
    type Surface = RasterSurface;

    fn acquire(&mut self) -> Option<RasterSurface> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(RasterSurface::new(self.width, self.height))
    }
}

fn to_rgba8(color: Rgba) -> [u8; 4] {
    color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
