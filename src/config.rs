//! Field configuration, presets and validated reconfiguration.
//!
//! A [`FieldConfig`] is assembled with `with_*` builder methods or taken from
//! one of the presets, then handed to a field at construction. Values are
//! clamped into range rather than rejected:
//!
//! ```ignore
//! let config = FieldConfig::constellation()
//!     .with_particle_count(120)
//!     .with_influence_radius(160.0)
//!     .with_align_mode(AlignMode::Grid { cell: 14.0 });
//! ```
//!
//! Hosts that receive options as loose JSON (the same flat option bag the
//! alignment helper has always accepted) go through [`FieldOptions`] and
//! [`FieldConfig::reconfigure`].

use std::str::FromStr;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::render::{LineShading, Rgba, Style};

/// Coordinate axis used by [`AlignMode::Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index into a `Vec3`.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Name that did not match any known mode or axis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown name '{0}'")]
pub struct UnknownName(pub String);

impl FromStr for Axis {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

/// Which alignment rule influenced particles follow, without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlignKind {
    #[default]
    Axis,
    Grid,
    Circle,
    Flow,
    Line,
}

impl FromStr for AlignKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "axis" => Ok(AlignKind::Axis),
            "grid" => Ok(AlignKind::Grid),
            "circle" => Ok(AlignKind::Circle),
            "flow" => Ok(AlignKind::Flow),
            "line" => Ok(AlignKind::Line),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

/// Geometric rule that turns a particle baseline and the pointer's world
/// position into a target position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignMode {
    /// Pull one coordinate toward the pointer's.
    Axis(Axis),
    /// Snap to a lattice of `cell` spacing anchored at the pointer.
    Grid { cell: f32 },
    /// Project onto a ring around the pointer. `None` uses half the influence
    /// radius. The radius is in pixels and converted to world units.
    Circle { radius: Option<f32> },
    /// Rotate around the pointer, scaled by `curl`.
    Flow { curl: f32 },
    /// Line up side by side through the pointer, ordered by screen x,
    /// `spacing` pixels apart.
    Line { spacing: f32 },
}

impl AlignMode {
    pub fn kind(&self) -> AlignKind {
        match self {
            AlignMode::Axis(_) => AlignKind::Axis,
            AlignMode::Grid { .. } => AlignKind::Grid,
            AlignMode::Circle { .. } => AlignKind::Circle,
            AlignMode::Flow { .. } => AlignKind::Flow,
            AlignMode::Line { .. } => AlignKind::Line,
        }
    }
}

/// How particles move between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Integration {
    /// Baselines drift with jitter and wall bounce; the pointer offsets
    /// nearby particles through the alignment mode.
    #[default]
    FreeDrift,
    /// Like `FreeDrift`, but influenced particles seek their assigned
    /// lattice point instead of following the alignment mode.
    LatticeSeek,
    /// The pointer attracts particles by adding to their velocity. No
    /// offsets are applied.
    Attract,
    /// Baselines come from an external effect every frame; the field only
    /// resolves influence and draws links.
    External,
}

/// Camera model used to map world positions to the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    /// World coordinates are screen pixels.
    Planar,
    /// Orbit camera looking at the origin.
    Perspective {
        /// Vertical field of view in degrees.
        fov_y_deg: f32,
        /// Distance from the camera to the origin.
        distance: f32,
        /// Yaw added per frame, in radians.
        auto_rotate: f32,
    },
}

/// Immutable set of tunables for one particle field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub particle_count: usize,
    pub integration: Integration,
    pub view: ViewMode,
    /// Half extents of the simulation volume for perspective views. Planar
    /// fields use the viewport instead.
    pub volume: Vec3,
    /// Initial velocity range, per axis (±).
    pub initial_speed: f32,
    /// Per-frame velocity noise amplitude.
    pub jitter: f32,
    pub max_speed: f32,
    /// Pairs closer than this are joined by a line. Zero disables lines.
    pub link_distance: f32,
    /// Screen-space radius of pointer influence, in pixels.
    pub influence_radius: f32,
    pub hover_strength: f32,
    pub press_strength: f32,
    /// How long press strength persists after a press starts.
    pub press_duration: Duration,
    pub align: AlignKind,
    pub axis: Axis,
    pub grid_size: f32,
    pub circle_radius: Option<f32>,
    pub flow_curl: f32,
    /// Pixel gap between neighbours in `Line` alignment.
    pub line_spacing: f32,
    /// Draw links at live positions while aligning. When off, link endpoints
    /// sit `line_blend` of the way from baseline to live position.
    pub align_lines: bool,
    pub line_blend: f32,
    /// Hard cap on particles influenced per frame, nearest first.
    pub max_affected: usize,
    /// Fraction of the offset removed per frame once influence stops.
    pub restore_ease: f32,
    /// Lattice spacing for `LatticeSeek` targets.
    pub lattice_gap: f32,
    /// Pointer pull for `Attract`.
    pub attraction: f32,
    /// Velocity multiplier per frame for `Attract`.
    pub damping: f32,
    /// Outline the influence radius around the pointer.
    pub debug_helpers: bool,
    /// Enlarge points close to the pointer ray (perspective views only).
    pub ray_markers: bool,
    pub style: Style,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 80,
            integration: Integration::FreeDrift,
            view: ViewMode::Planar,
            volume: Vec3::new(300.0, 200.0, 400.0),
            initial_speed: 0.4,
            jitter: 0.02,
            max_speed: 1.2,
            link_distance: 130.0,
            influence_radius: 140.0,
            hover_strength: 0.35,
            press_strength: 0.85,
            press_duration: Duration::from_millis(350),
            align: AlignKind::Axis,
            axis: Axis::X,
            grid_size: 12.0,
            circle_radius: None,
            flow_curl: 1.2,
            line_spacing: 22.0,
            align_lines: true,
            line_blend: 0.35,
            max_affected: 120,
            restore_ease: 0.08,
            lattice_gap: 12.0,
            attraction: 0.12,
            damping: 0.98,
            debug_helpers: false,
            ray_markers: false,
            style: Style::default(),
        }
    }
}

impl FieldConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Presets ==========

    /// Flat drifting constellation with axis alignment under the pointer.
    pub fn constellation() -> Self {
        Self::default()
    }

    /// Points that drift freely and are pulled toward the pointer, joined by
    /// fading links.
    pub fn cluster() -> Self {
        Self {
            particle_count: 70,
            integration: Integration::Attract,
            initial_speed: 0.2,
            jitter: 0.0,
            max_speed: 4.0,
            link_distance: 130.0,
            influence_radius: 160.0,
            attraction: 0.12,
            damping: 0.98,
            style: Style {
                point_radius: 2.2,
                line_width: 1.2,
                line_opacity: 0.6,
                ..Style::default()
            },
            ..Self::default()
        }
    }

    /// Rotating 3D point cloud whose particles snap to lattice points near
    /// the pointer.
    pub fn lattice() -> Self {
        Self {
            particle_count: 400,
            integration: Integration::LatticeSeek,
            view: ViewMode::Perspective {
                fov_y_deg: 70.0,
                distance: 600.0,
                auto_rotate: std::f32::consts::TAU / 1800.0,
            },
            volume: Vec3::new(300.0, 200.0, 400.0),
            initial_speed: 0.5,
            jitter: 0.02,
            max_speed: 2.0,
            link_distance: 0.0,
            influence_radius: 120.0,
            hover_strength: 0.08,
            press_strength: 0.3,
            restore_ease: 0.02,
            lattice_gap: 12.0,
            style: Style {
                point_radius: 1.6,
                background: Rgba::from_hex(0x000000),
                ..Style::default()
            },
            ..Self::default()
        }
    }

    /// Alignment settings for a network effect driven from outside.
    pub fn net_align() -> Self {
        Self {
            integration: Integration::External,
            view: ViewMode::Perspective {
                fov_y_deg: 50.0,
                distance: 35.0,
                auto_rotate: 0.0,
            },
            link_distance: 22.0,
            influence_radius: 168.0,
            hover_strength: 0.4,
            press_strength: 0.9,
            press_duration: Duration::from_millis(420),
            grid_size: 14.0,
            circle_radius: Some(90.0),
            flow_curl: 1.25,
            max_affected: 140,
            restore_ease: 0.08,
            ray_markers: true,
            style: Style {
                background: Rgba::from_hex(0x050712),
                line_shading: LineShading::MixBackground,
                line_contrast: 2.0,
                line_opacity: 1.0,
                ..Style::default()
            },
            ..Self::default()
        }
    }

    // ========== Builder ==========

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_integration(mut self, integration: Integration) -> Self {
        self.integration = integration;
        self
    }

    pub fn with_view(mut self, view: ViewMode) -> Self {
        self.view = view;
        self
    }

    /// Set the half extents of the simulation volume (perspective views).
    pub fn with_volume(mut self, half_extents: Vec3) -> Self {
        self.volume = half_extents;
        self
    }

    /// Set the initial velocity range and the speed cap.
    pub fn with_speed(mut self, initial: f32, max: f32) -> Self {
        self.initial_speed = initial;
        self.max_speed = max;
        self
    }

    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_link_distance(mut self, distance: f32) -> Self {
        self.link_distance = distance;
        self
    }

    pub fn with_influence_radius(mut self, radius: f32) -> Self {
        self.influence_radius = radius;
        self
    }

    /// Set the hover and press strengths.
    pub fn with_strengths(mut self, hover: f32, press: f32) -> Self {
        self.hover_strength = hover;
        self.press_strength = press;
        self
    }

    pub fn with_press_duration(mut self, duration: Duration) -> Self {
        self.press_duration = duration;
        self
    }

    /// Select the alignment mode together with its parameter.
    pub fn with_align_mode(mut self, mode: AlignMode) -> Self {
        self.set_align_mode(mode);
        self
    }

    pub fn with_align_lines(mut self, align_lines: bool) -> Self {
        self.align_lines = align_lines;
        self
    }

    pub fn with_max_affected(mut self, max: usize) -> Self {
        self.max_affected = max;
        self
    }

    pub fn with_restore_ease(mut self, ease: f32) -> Self {
        self.restore_ease = ease;
        self
    }

    pub fn with_lattice_gap(mut self, gap: f32) -> Self {
        self.lattice_gap = gap;
        self
    }

    /// Set the pointer pull and velocity damping used by `Attract`.
    pub fn with_attraction(mut self, attraction: f32, damping: f32) -> Self {
        self.attraction = attraction;
        self.damping = damping;
        self
    }

    pub fn with_debug_helpers(mut self, enabled: bool) -> Self {
        self.debug_helpers = enabled;
        self
    }

    /// Scale point sprites by their distance to the pointer ray.
    pub fn with_ray_markers(mut self, enabled: bool) -> Self {
        self.ray_markers = enabled;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    // ========== Alignment ==========

    /// The active alignment mode with its parameter.
    pub fn align_mode(&self) -> AlignMode {
        match self.align {
            AlignKind::Axis => AlignMode::Axis(self.axis),
            AlignKind::Grid => AlignMode::Grid { cell: self.grid_size },
            AlignKind::Circle => AlignMode::Circle {
                radius: self.circle_radius,
            },
            AlignKind::Flow => AlignMode::Flow {
                curl: self.flow_curl,
            },
            AlignKind::Line => AlignMode::Line {
                spacing: self.line_spacing,
            },
        }
    }

    /// Switch alignment mode, storing the mode's parameter.
    pub fn set_align_mode(&mut self, mode: AlignMode) {
        self.align = mode.kind();
        match mode {
            AlignMode::Axis(axis) => self.axis = axis,
            AlignMode::Grid { cell } => self.grid_size = cell,
            AlignMode::Circle { radius } => self.circle_radius = radius,
            AlignMode::Flow { curl } => self.flow_curl = curl,
            AlignMode::Line { spacing } => self.line_spacing = spacing,
        }
    }

    /// Whether the pointer moves particles through offsets (as opposed to
    /// velocity, or not at all).
    pub fn uses_offsets(&self) -> bool {
        !matches!(self.integration, Integration::Attract)
    }

    // ========== Validation ==========

    /// Clamp every field into its valid range.
    ///
    /// Non-finite numbers fall back to the default for that field.
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    pub(crate) fn sanitize(&mut self) {
        let d = FieldConfig::default();

        self.particle_count = self.particle_count.max(1);
        self.max_affected = self.max_affected.max(1);

        self.initial_speed = finite_or(self.initial_speed, d.initial_speed).max(0.0);
        self.jitter = finite_or(self.jitter, d.jitter).max(0.0);
        self.max_speed = finite_or(self.max_speed, d.max_speed).max(0.0);
        self.link_distance = finite_or(self.link_distance, d.link_distance).max(0.0);
        self.influence_radius = finite_or(self.influence_radius, d.influence_radius).max(0.0);
        self.hover_strength = finite_or(self.hover_strength, d.hover_strength).clamp(0.0, 1.0);
        self.press_strength = finite_or(self.press_strength, d.press_strength).clamp(0.0, 1.0);
        self.restore_ease = finite_or(self.restore_ease, d.restore_ease).clamp(0.0, 1.0);
        self.line_blend = finite_or(self.line_blend, d.line_blend).clamp(0.0, 1.0);
        self.grid_size = finite_or(self.grid_size, d.grid_size).max(1.0);
        self.circle_radius = self.circle_radius.filter(|r| r.is_finite()).map(|r| r.max(0.0));
        self.flow_curl = finite_or(self.flow_curl, d.flow_curl);
        self.line_spacing = finite_or(self.line_spacing, d.line_spacing).max(0.0);
        self.lattice_gap = finite_or(self.lattice_gap, d.lattice_gap).max(1.0);
        self.attraction = finite_or(self.attraction, d.attraction).max(0.0);
        self.damping = finite_or(self.damping, d.damping).clamp(0.0, 1.0);

        self.volume = Vec3::new(
            finite_or(self.volume.x, d.volume.x).abs(),
            finite_or(self.volume.y, d.volume.y).abs(),
            finite_or(self.volume.z, d.volume.z).abs(),
        );

        if let ViewMode::Perspective {
            fov_y_deg,
            distance,
            auto_rotate,
        } = self.view
        {
            self.view = ViewMode::Perspective {
                fov_y_deg: finite_or(fov_y_deg, 70.0).clamp(1.0, 179.0),
                distance: finite_or(distance, 600.0).max(1e-3),
                auto_rotate: finite_or(auto_rotate, 0.0),
            };
        }
    }

    /// Apply the supplied options, validating and clamping each one.
    ///
    /// Unknown mode or axis names fall back to `axis` / `x`. Options that are
    /// absent or non-finite leave the current value alone.
    pub fn reconfigure(&mut self, options: &FieldOptions) {
        if let Some(r) = options.affect_radius.filter(|v| v.is_finite()) {
            self.influence_radius = r;
        }
        if let Some(s) = options.hover_strength.filter(|v| v.is_finite()) {
            self.hover_strength = s;
        }
        if let Some(s) = options.click_strength.filter(|v| v.is_finite()) {
            self.press_strength = s;
        }
        if let Some(ms) = options.click_duration.filter(|v| v.is_finite()) {
            self.press_duration = Duration::from_secs_f64(ms.max(0.0) / 1000.0);
        }
        if let Some(name) = &options.align_mode {
            self.align = name.parse().unwrap_or_else(|e: UnknownName| {
                log::warn!("align mode: {}, using 'axis'", e);
                AlignKind::Axis
            });
        }
        if let Some(name) = &options.axis {
            self.axis = name.parse().unwrap_or_else(|e: UnknownName| {
                log::warn!("align axis: {}, using 'x'", e);
                Axis::X
            });
        }
        if let Some(g) = options.grid_size.filter(|v| v.is_finite()) {
            self.grid_size = g;
        }
        if let Some(r) = options.circle_radius.filter(|v| v.is_finite()) {
            self.circle_radius = Some(r);
        }
        if let Some(c) = options.flow_curl.filter(|v| v.is_finite()) {
            self.flow_curl = c;
        }
        if let Some(s) = options.line_spacing.filter(|v| v.is_finite()) {
            self.line_spacing = s;
        }
        if let Some(a) = options.align_lines {
            self.align_lines = a;
        }
        if let Some(m) = options.max_affected.filter(|v| v.is_finite()) {
            self.max_affected = m.max(1.0).floor() as usize;
        }
        if let Some(e) = options.restore_ease.filter(|v| v.is_finite()) {
            self.restore_ease = e;
        }
        if let Some(l) = options.link_distance.filter(|v| v.is_finite()) {
            self.link_distance = l;
        }
        if let Some(d) = options.debug_helpers {
            self.debug_helpers = d;
        }
        self.sanitize();
    }
}

#[inline]
fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Flat option bag, as accepted from JSON.
///
/// Field names follow the camelCase keys hosts already pass around
/// (`affectRadius`, `clickStrength`, ...). Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldOptions {
    pub affect_radius: Option<f32>,
    pub hover_strength: Option<f32>,
    pub click_strength: Option<f32>,
    /// Milliseconds.
    pub click_duration: Option<f64>,
    pub align_mode: Option<String>,
    pub axis: Option<String>,
    pub grid_size: Option<f32>,
    pub circle_radius: Option<f32>,
    pub flow_curl: Option<f32>,
    pub line_spacing: Option<f32>,
    pub align_lines: Option<bool>,
    pub max_affected: Option<f32>,
    pub restore_ease: Option<f32>,
    pub link_distance: Option<f32>,
    pub debug_helpers: Option<bool>,
}

impl FieldOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        Ok(serde_json::from_str(json)?)
    }
}
