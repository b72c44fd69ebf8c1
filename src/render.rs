//! Draw lists: what a field asks a surface to draw each frame.
//!
//! Everything here is in screen pixels. A [`DrawList`] holds one sprite per
//! particle and one segment per linked pair, plus optional pointer helpers
//! drawn on top; surfaces (raster, GPU) only rasterise it. Per-pair alpha is
//! decided here and nowhere else.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::camera::View;
use crate::spatial::Link;

/// Linear RGBA colour, components in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from `0xRRGGBB`.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Component-wise interpolation toward `other`.
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// How link colour responds to distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineShading {
    /// Point colour with alpha falling off over distance.
    #[default]
    Alpha,
    /// Opaque colour mixed from background to point colour.
    MixBackground,
}

/// Visual settings shared by every surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub color: Rgba,
    pub background: Rgba,
    /// Point radius in pixels.
    pub point_radius: f32,
    pub point_opacity: f32,
    pub line_width: f32,
    /// Alpha of a zero-length link.
    pub line_opacity: f32,
    /// Multiplier on the distance falloff before clamping to 1.
    pub line_contrast: f32,
    pub line_shading: LineShading,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Rgba::from_hex(0x07cfeb),
            background: Rgba::from_hex(0x050712),
            point_radius: 2.0,
            point_opacity: 0.9,
            line_width: 1.0,
            line_opacity: 0.6,
            line_contrast: 1.0,
            line_shading: LineShading::Alpha,
        }
    }
}

/// One particle marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSprite {
    pub position: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

/// One link between two particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Vec2,
    pub b: Vec2,
    pub width: f32,
    pub color: Rgba,
}

/// Everything to draw for one frame, back to front: clear, lines, points,
/// then the overlay lines and points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub clear: Rgba,
    pub points: Vec<PointSprite>,
    pub lines: Vec<LineSegment>,
    pub overlay_lines: Vec<LineSegment>,
    pub overlay_points: Vec<PointSprite>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the list, keeping allocations.
    pub fn reset(&mut self, clear: Rgba) {
        self.clear = clear;
        self.points.clear();
        self.lines.clear();
        self.overlay_lines.clear();
        self.overlay_points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
            && self.lines.is_empty()
            && self.overlay_lines.is_empty()
            && self.overlay_points.is_empty()
    }
}

/// Alpha for a link of length `distance`: 1 at zero length, 0 at
/// `link_distance`, scaled by `contrast` and clamped.
pub fn link_alpha(distance: f32, link_distance: f32, contrast: f32) -> f32 {
    if link_distance <= 0.0 {
        return 0.0;
    }
    ((1.0 - distance / link_distance) * contrast).clamp(0.0, 1.0)
}

/// Colour for a link, per the style's shading.
pub fn link_color(style: &Style, alpha: f32) -> Rgba {
    match style.line_shading {
        LineShading::Alpha => style.color.with_alpha(alpha * style.line_opacity),
        LineShading::MixBackground => style
            .background
            .lerp(style.color, alpha * style.line_opacity)
            .with_alpha(1.0),
    }
}

/// Append one sprite per visible particle. `scales[i]` multiplies the radius
/// of particle `i`; missing entries count as 1.
pub fn push_points(
    list: &mut DrawList,
    positions: &[Vec3],
    scales: &[f32],
    view: &View,
    viewport: Vec2,
    style: &Style,
) {
    let color = style.color.with_alpha(style.point_opacity);
    list.points
        .extend(positions.iter().enumerate().filter_map(|(i, &p)| {
            let scale = scales.get(i).copied().unwrap_or(1.0);
            view.project(p, viewport).map(|position| PointSprite {
                position,
                radius: style.point_radius * scale,
                color,
            })
        }));
}

/// Sprite scale for a point `distance` world units from the pointer ray:
/// 2.5 at 5 or closer, easing down to 1 from 11 on.
pub fn ray_marker_scale(distance: f32) -> f32 {
    if !distance.is_finite() {
        return 1.0;
    }
    ((15.0 - distance.clamp(5.0, 15.0)) * 0.25).clamp(1.0, 100.0)
}

const HELPER_COLOR: Rgba = Rgba::new(8.0 / 255.0, 210.0 / 255.0, 1.0, 1.0);
const HELPER_RING_SEGMENTS: usize = 48;

/// Outline the pointer's reach with a ring of `radius` pixels and mark the
/// pointer with a faint dot, in the overlay.
pub fn push_pointer_helpers(list: &mut DrawList, pointer: Vec2, radius: f32) {
    if radius > 0.0 {
        let ring = HELPER_COLOR.with_alpha(0.75);
        let at = |i: usize| {
            let angle = i as f32 / HELPER_RING_SEGMENTS as f32 * TAU;
            pointer + Vec2::from_angle(angle) * radius
        };
        list.overlay_lines
            .extend((0..HELPER_RING_SEGMENTS).map(|i| LineSegment {
                a: at(i),
                b: at(i + 1),
                width: 1.4,
                color: ring,
            }));
    }
    list.overlay_points.push(PointSprite {
        position: pointer,
        radius: 2.5,
        color: HELPER_COLOR.with_alpha(0.18),
    });
}

/// Append one segment per link. `endpoints` are the positions the links were
/// measured on.
pub fn push_links(
    list: &mut DrawList,
    endpoints: &[Vec3],
    links: &[Link],
    link_distance: f32,
    view: &View,
    viewport: Vec2,
    style: &Style,
) {
    for link in links {
        let alpha = link_alpha(link.distance, link_distance, style.line_contrast);
        if alpha <= 0.0 {
            continue;
        }
        let (Some(a), Some(b)) = (
            view.project(endpoints[link.a], viewport),
            view.project(endpoints[link.b], viewport),
        ) else {
            continue;
        };
        list.lines.push(LineSegment {
            a,
            b,
            width: style.line_width,
            color: link_color(style, alpha),
        });
    }
}
