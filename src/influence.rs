//! Influence resolution: how strongly, and toward where, the pointer pulls a
//! particle.
//!
//! All functions are pure. The field decides which particles are selected
//! (see [`crate::spatial::rank_cutoff`]) and feeds each one through
//! [`falloff`], [`target_position`] and [`blend_offset`]; everything else
//! goes through [`restore`].

use glam::{Vec2, Vec3};

use crate::config::AlignMode;

/// Offsets with a squared length below this snap to zero.
pub const OFFSET_EPSILON_SQ: f32 = 1e-5;

/// Weight given to the pointer's height in circle mode.
const CIRCLE_HEIGHT_PULL: f32 = 0.4;
/// Weight given to the particle's own height in flow mode.
const FLOW_HEIGHT_KEEP: f32 = 0.25;

/// Cubic Hermite step between `edge0` and `edge1`, clamped to [0, 1].
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Weight of the pointer at `distance`: 1 at the pointer, 0 at `radius`
/// and beyond.
#[inline]
pub fn falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || !distance.is_finite() {
        return 0.0;
    }
    1.0 - smoothstep(0.0, 1.0, distance / radius)
}

/// Effective per-particle strength.
#[inline]
pub fn strength(base: f32, falloff: f32) -> f32 {
    (base * falloff).clamp(0.0, 1.0)
}

/// Everything a target computation needs besides the particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetContext {
    pub mode: AlignMode,
    /// Pointer resolved into world space at the particle's depth.
    pub pointer: Vec3,
    /// World length of one screen pixel at the particle's depth.
    pub px_to_world: f32,
    /// Influence radius in pixels, for circle mode's default ring.
    pub influence_radius: f32,
    pub strength: f32,
    /// Work in the x–y plane instead of around the vertical axis.
    pub planar: bool,
    /// Signed position in a `Line` arrangement, in spacings from the
    /// pointer. Zero for every other mode.
    pub slot: f32,
}

/// Where `baseline` wants to be under the current alignment mode.
pub fn target_position(baseline: Vec3, ctx: &TargetContext) -> Vec3 {
    let pointer = ctx.pointer;
    match ctx.mode {
        AlignMode::Axis(axis) => {
            let i = axis.index();
            let mut target = baseline;
            target[i] = baseline[i] + (pointer[i] - baseline[i]) * ctx.strength;
            target
        }
        AlignMode::Grid { cell } => {
            if cell <= 0.0 {
                return baseline;
            }
            pointer + ((baseline - pointer) / cell).round() * cell
        }
        AlignMode::Circle { radius } => {
            let ring = radius.unwrap_or(ctx.influence_radius * 0.5) * ctx.px_to_world;
            let local = baseline - pointer;
            let in_plane = if ctx.planar {
                local.truncate()
            } else {
                Vec2::new(local.x, local.z)
            };
            // A zero ring keeps the current distance; a particle on the
            // pointer goes out along +x.
            let offset = match in_plane.try_normalize() {
                Some(dir) if ring > 0.0 => dir * ring,
                Some(_) => in_plane,
                None => Vec2::new(if ring > 0.0 { ring } else { 1.0 }, 0.0),
            };
            if ctx.planar {
                (pointer.truncate() + offset).extend(baseline.z)
            } else {
                Vec3::new(
                    pointer.x + offset.x,
                    baseline.y + (pointer.y - baseline.y) * CIRCLE_HEIGHT_PULL,
                    pointer.z + offset.y,
                )
            }
        }
        AlignMode::Flow { curl } => {
            let local = baseline - pointer;
            if ctx.planar {
                let l = local.truncate();
                let tangent = l.perp().normalize_or_zero() * l.length() * curl;
                (pointer.truncate() + tangent).extend(baseline.z)
            } else {
                let tangent = Vec3::new(-local.z, 0.0, local.x).normalize_or_zero()
                    * local.length()
                    * curl;
                Vec3::new(
                    pointer.x + tangent.x,
                    baseline.y + local.y * FLOW_HEIGHT_KEEP,
                    pointer.z + tangent.z,
                )
            }
        }
        AlignMode::Line { spacing } => {
            let mut target = baseline;
            target.x = pointer.x + ctx.slot * spacing * ctx.px_to_world;
            target.y = pointer.y;
            target
        }
    }
}

/// Signed slots for a `Line` arrangement of `count` particles, centred on
/// the pointer: rank `i` sits at `i - (count - 1) / 2`.
#[inline]
pub fn line_slot(rank: usize, count: usize) -> f32 {
    rank as f32 - (count.saturating_sub(1)) as f32 * 0.5
}

/// Move `offset` part of the way toward `target - baseline`.
#[inline]
pub fn blend_offset(offset: Vec3, baseline: Vec3, target: Vec3, strength: f32) -> Vec3 {
    offset + (target - baseline - offset) * strength
}

/// Decay an offset that is no longer being driven. Small offsets snap to
/// exactly zero.
#[inline]
pub fn restore(offset: Vec3, ease: f32) -> Vec3 {
    let decayed = offset * (1.0 - ease);
    if decayed.length_squared() < OFFSET_EPSILON_SQ {
        Vec3::ZERO
    } else {
        decayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Axis;

    fn ctx(mode: AlignMode, pointer: Vec3) -> TargetContext {
        TargetContext {
            mode,
            pointer,
            px_to_world: 1.0,
            influence_radius: 140.0,
            strength: 1.0,
            planar: false,
            slot: 0.0,
        }
    }

    #[test]
    fn test_falloff_boundary() {
        assert_eq!(falloff(0.0, 140.0), 1.0);
        assert_eq!(falloff(140.0, 140.0), 0.0);
        assert_eq!(falloff(500.0, 140.0), 0.0);
        assert_eq!(falloff(10.0, 0.0), 0.0);
        assert_eq!(falloff(0.0, -1.0), 0.0);
    }

    #[test]
    fn test_falloff_monotonic() {
        let mut last = f32::INFINITY;
        for i in 0..=200 {
            let f = falloff(i as f32, 140.0);
            assert!(f <= last, "falloff rose at distance {}", i);
            assert!((0.0..=1.0).contains(&f));
            last = f;
        }
    }

    #[test]
    fn test_strength_clamped() {
        assert_eq!(strength(1.5, 1.0), 1.0);
        assert_eq!(strength(0.5, 0.5), 0.25);
        assert_eq!(strength(-1.0, 1.0), 0.0);
    }

    #[test]
    fn test_axis_target_moves_one_coordinate() {
        let baseline = Vec3::new(10.0, 20.0, 30.0);
        let pointer = Vec3::new(50.0, -5.0, 0.0);
        let mut c = ctx(AlignMode::Axis(Axis::X), pointer);
        c.strength = 0.5;

        let target = target_position(baseline, &c);
        assert_eq!(target, Vec3::new(30.0, 20.0, 30.0));
    }

    #[test]
    fn test_grid_target_snaps_relative_to_pointer() {
        let c = ctx(AlignMode::Grid { cell: 10.0 }, Vec3::new(3.0, 3.0, 3.0));
        let target = target_position(Vec3::new(17.0, -9.0, 3.0), &c);
        assert_eq!(target, Vec3::new(13.0, -7.0, 3.0));
    }

    #[test]
    fn test_circle_target_on_ring() {
        let pointer = Vec3::new(0.0, 10.0, 0.0);
        let c = ctx(AlignMode::Circle { radius: Some(5.0) }, pointer);
        let target = target_position(Vec3::new(30.0, 0.0, 40.0), &c);

        let horizontal = Vec2::new(target.x - pointer.x, target.z - pointer.z);
        assert!((horizontal.length() - 5.0).abs() < 1e-5);
        assert!((target.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_degenerate_offset() {
        let pointer = Vec3::new(1.0, 2.0, 3.0);
        let mut c = ctx(AlignMode::Circle { radius: None }, pointer);
        c.px_to_world = 0.5;
        let target = target_position(pointer, &c);
        // Default ring is half the influence radius, scaled to world units
        assert_eq!(target, Vec3::new(1.0 + 35.0, 2.0, 3.0));
    }

    #[test]
    fn test_circle_planar_keeps_depth() {
        let mut c = ctx(AlignMode::Circle { radius: Some(10.0) }, Vec3::new(100.0, 100.0, 0.0));
        c.planar = true;
        let target = target_position(Vec3::new(100.0, 130.0, 7.0), &c);
        assert!((target - Vec3::new(100.0, 110.0, 7.0)).length() < 1e-5);
    }

    #[test]
    fn test_flow_target_is_tangent() {
        let pointer = Vec3::ZERO;
        let c = ctx(AlignMode::Flow { curl: 2.0 }, pointer);
        let target = target_position(Vec3::new(3.0, 4.0, 0.0), &c);
        // local = (3, 4, 0); tangent direction (0, 0, 1) scaled to |local| * curl
        assert!((target - Vec3::new(0.0, 1.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_line_target_spaces_slots_through_pointer() {
        let pointer = Vec3::new(100.0, 50.0, 0.0);
        let mut c = ctx(AlignMode::Line { spacing: 22.0 }, pointer);
        c.planar = true;

        let slots: Vec<f32> = (0..3).map(|rank| line_slot(rank, 3)).collect();
        assert_eq!(slots, vec![-1.0, 0.0, 1.0]);

        c.slot = slots[0];
        let left = target_position(Vec3::new(90.0, 80.0, 4.0), &c);
        assert_eq!(left, Vec3::new(78.0, 50.0, 4.0));

        c.slot = line_slot(1, 2);
        c.px_to_world = 0.5;
        let right = target_position(Vec3::new(0.0, 0.0, 0.0), &c);
        assert_eq!(right, Vec3::new(105.5, 50.0, 0.0));
        assert_eq!(line_slot(0, 0), 0.0);
    }

    #[test]
    fn test_blend_full_strength_reaches_target() {
        let baseline = Vec3::new(1.0, 1.0, 1.0);
        let target = Vec3::new(4.0, 1.0, -2.0);
        let offset = blend_offset(Vec3::new(9.0, 9.0, 9.0), baseline, target, 1.0);
        assert_eq!(baseline + offset, target);
    }

    #[test]
    fn test_restore_converges_to_zero() {
        let mut offset = Vec3::new(10.0, 0.0, 0.0);
        let mut last = offset.length();
        let mut frames = 0;
        while offset != Vec3::ZERO {
            offset = restore(offset, 0.08);
            let len = offset.length();
            assert!(len < last);
            last = len;
            frames += 1;
            assert!(frames <= 100, "offset did not converge");
        }
    }

    #[test]
    fn test_restore_zero_ease_holds() {
        let offset = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(restore(offset, 0.0), offset);
    }
}
