//! Particle state and the fixed-size store that owns it.
//!
//! The store is the single source of truth for a field. Anything outside it
//! (an external effect's point objects, GPU buffers) refers to particles by
//! their index only.

use glam::Vec3;
use rand::Rng;

/// One simulated point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Stable index into the store.
    pub index: usize,
    /// Rendered position.
    pub position: Vec3,
    /// Where the particle would be without pointer influence.
    pub baseline: Vec3,
    pub velocity: Vec3,
    /// Displacement from the baseline caused by influence.
    pub offset: Vec3,
    /// Lattice point this particle seeks, when the field uses one.
    pub assigned_target: Option<Vec3>,
    /// Held in a `Line` arrangement during the last step.
    pub line_locked: bool,
}

impl Particle {
    pub fn at(index: usize, position: Vec3, velocity: Vec3) -> Self {
        Self {
            index,
            position,
            baseline: position,
            velocity,
            offset: Vec3::ZERO,
            assigned_target: None,
            line_locked: false,
        }
    }

    /// Recompute `position` from `baseline + offset`.
    #[inline]
    pub fn sync_position(&mut self) {
        self.position = self.baseline + self.offset;
    }
}

/// Axis-aligned box particles live in.
///
/// Planar fields span `[0, width] × [0, height]` with z fixed at 0.
/// Volumetric fields are centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn planar(width: f32, height: f32) -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::new(width.max(0.0), height.max(0.0), 0.0),
        }
    }

    pub fn volume(half_extents: Vec3) -> Self {
        let h = half_extents.abs();
        Self { min: -h, max: h }
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True when the x–y area is zero; nothing can be laid out or drawn.
    pub fn is_empty(&self) -> bool {
        let s = self.size();
        s.x <= 0.0 || s.y <= 0.0
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Uniformly random point inside the box.
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec3 {
        let s = self.size();
        self.min + Vec3::new(rng.gen::<f32>() * s.x, rng.gen::<f32>() * s.y, rng.gen::<f32>() * s.z)
    }

    /// Map `p` from this box into `other`, keeping its relative placement.
    /// Axes with zero extent on either side are copied through.
    pub fn remap(&self, other: &Bounds, p: Vec3) -> Vec3 {
        let from = self.size();
        let to = other.size();
        let axis = |i: usize| {
            if from[i] > 0.0 && to[i] > 0.0 {
                other.min[i] + (p[i] - self.min[i]) / from[i] * to[i]
            } else {
                p[i]
            }
        };
        Vec3::new(axis(0), axis(1), axis(2))
    }
}

/// Fixed-size particle collection.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    /// Populate `count` particles uniformly inside `bounds`, with velocities
    /// in `±speed` per axis. Planar bounds get zero z velocity.
    pub fn seed<R: Rng>(count: usize, bounds: &Bounds, speed: f32, rng: &mut R) -> Self {
        let flat = bounds.size().z <= 0.0;
        let particles = (0..count)
            .map(|index| {
                let mut velocity = Vec3::new(
                    rng.gen_range(-0.5..0.5),
                    rng.gen_range(-0.5..0.5),
                    rng.gen_range(-0.5..0.5),
                ) * (speed * 2.0);
                if flat {
                    velocity.z = 0.0;
                }
                Particle::at(index, bounds.random_point(rng), velocity)
            })
            .collect();
        Self { particles }
    }

    /// Particles at known positions, at rest.
    pub fn from_positions(positions: &[Vec3]) -> Self {
        Self {
            particles: positions
                .iter()
                .enumerate()
                .map(|(index, &p)| Particle::at(index, p, Vec3::ZERO))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    /// Rescale every particle from `old` bounds into `new` bounds without
    /// reseeding. Offsets and lattice targets are left alone.
    pub fn resize_bounds(&mut self, old: &Bounds, new: &Bounds) {
        for p in &mut self.particles {
            p.baseline = old.remap(new, p.baseline);
            p.sync_position();
        }
    }
}
