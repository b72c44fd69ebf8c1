//! # Particle Field
//!
//! Pointer-reactive particle fields: a cloud of points that drifts inside a
//! bounded region, links near neighbours with faded lines, and pulls the
//! points closest to the pointer into a local arrangement (an axis, a grid,
//! a ring, a swirl or a line) that eases back once the pointer leaves.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particle_field::prelude::*;
//!
//! fn main() -> Result<(), FieldError> {
//!     let config = FieldConfig::cluster()
//!         .with_align_mode(AlignMode::Circle { radius: None })
//!         .with_particle_count(300);
//!     window::run(config, WindowOptions::default())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Fields
//!
//! A [`ParticleField`] owns its particles, its pointer state and its
//! randomness. Each call to [`ParticleField::step`] integrates motion,
//! applies pointer influence and returns a [`DrawList`] in screen pixels.
//! Input and resize only record state; the next step applies it.
//!
//! ### Integration
//!
//! [`Integration`] picks how particles move between frames:
//!
//! ```ignore
//! Integration::FreeDrift     // Random walk inside the bounds, bouncing at walls
//! Integration::Attract       // Drift, plus a pull toward the pointer
//! Integration::LatticeSeek   // Selected particles seek an assigned lattice point
//! Integration::External      // Positions come from someone else
//! ```
//!
//! ### Alignment
//!
//! [`AlignMode`] is the arrangement pointer-selected particles are pulled
//! into. Only the `max_affected` particles nearest the pointer (on screen)
//! are selected each frame. Their displacement is stored as an offset from
//! the baseline and restored smoothly afterwards.
//!
//! ### Surfaces and lifecycle
//!
//! A [`FieldController`] ties a field to a [`Surface`], a [`FrameDriver`] and
//! an [`InputSource`]. Surfaces shipped here:
//!
//! - [`RasterSurface`] - CPU rasteriser into an RGBA image (headless, PNG export)
//! - [`GpuSurface`] - wgpu instanced quads in a winit window
//!
//! ### External networks
//!
//! [`ClusterAlign`] attaches the same alignment to a [`NetworkEffect`] that
//! runs its own simulation, through the effect's post-step hooks.
//!
//! ## Configuration
//!
//! Presets ([`FieldConfig::constellation`], [`FieldConfig::cluster`],
//! [`FieldConfig::lattice`], [`FieldConfig::net_align`]) cover the common
//! looks. [`FieldOptions`] carries partial updates, parsed from JSON, that
//! can be applied to a running field. Out-of-range values are clamped, never
//! rejected.

pub mod align;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod field;
pub mod gpu;
pub mod influence;
pub mod integrate;
pub mod lattice;
pub mod lifecycle;
pub mod particle;
pub mod pointer;
pub mod raster;
pub mod render;
pub mod spatial;
pub mod window;

pub use align::{ClusterAlign, EffectFrame, HookId, HookRegistry, NetworkEffect};
pub use camera::{Camera, View};
pub use clock::FrameClock;
pub use config::{AlignKind, AlignMode, Axis, FieldConfig, FieldOptions, Integration, ViewMode};
pub use error::{FieldError, GpuError};
pub use field::ParticleField;
pub use glam::{Vec2, Vec3};
pub use gpu::{GpuProvider, GpuSurface};
pub use lifecycle::{
    DetachedInput, Environment, FieldController, FrameDriver, FrameRequest, InputSource,
    ManualFrameDriver, Phase, Registration, Surface, SurfaceProvider,
};
pub use pointer::{PointerEvent, PointerKind, PointerPhase};
pub use raster::{RasterProvider, RasterSurface};
pub use render::{DrawList, LineSegment, LineShading, PointSprite, Rgba, Style};
pub use window::WindowOptions;

/// Convenient imports for common usage.
///
/// ```ignore
/// use particle_field::prelude::*;
/// ```
///
/// This imports:
/// - [`FieldConfig`] and its option enums
/// - [`ParticleField`] - the simulation
/// - [`FieldController`] and the shipped surfaces and drivers
/// - [`PointerEvent`] - input
/// - [`Vec2`], [`Vec3`] - glam vector types
pub mod prelude {
    pub use crate::align::{ClusterAlign, NetworkEffect};
    pub use crate::config::{AlignMode, Axis, FieldConfig, FieldOptions, Integration, ViewMode};
    pub use crate::error::FieldError;
    pub use crate::field::ParticleField;
    pub use crate::lifecycle::{
        DetachedInput, Environment, FieldController, ManualFrameDriver, Phase,
    };
    pub use crate::pointer::PointerEvent;
    pub use crate::raster::{RasterProvider, RasterSurface};
    pub use crate::render::{DrawList, Rgba, Style};
    pub use crate::window::{self, WindowOptions};
    pub use glam::{Vec2, Vec3};
}
