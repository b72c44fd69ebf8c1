//! Regular lattice of seek targets for [`Integration::LatticeSeek`] fields.
//!
//! The lattice is never materialised. Points are addressed by a flat index
//! and computed on demand, so a dense volume costs nothing to hold.
//!
//! [`Integration::LatticeSeek`]: crate::config::Integration::LatticeSeek

use glam::{UVec3, Vec3};
use rand::Rng;

use crate::particle::{Bounds, ParticleStore};

/// Lattice centred in a bounds box with `gap` spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    center: Vec3,
    gap: f32,
    dims: UVec3,
}

impl Lattice {
    /// Lay out a lattice over `bounds`. Each axis gets
    /// `max(1, floor(extent / gap))` points; an axis with zero extent gets
    /// one point at the centre.
    pub fn new(bounds: &Bounds, gap: f32) -> Self {
        let gap = if gap > 0.0 && gap.is_finite() { gap } else { 1.0 };
        let size = bounds.size().max(Vec3::ZERO);
        let count = |extent: f32| ((extent / gap).floor() as u32).max(1);
        Self {
            center: (bounds.min + bounds.max) * 0.5,
            gap,
            dims: UVec3::new(count(size.x), count(size.y), count(size.z)),
        }
    }

    #[inline]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    #[inline]
    pub fn gap(&self) -> f32 {
        self.gap
    }

    pub fn len(&self) -> usize {
        self.dims.x as usize * self.dims.y as usize * self.dims.z as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The lattice point at cell `(x, y, z)`.
    ///
    /// Cells run from `-n/2` to `n/2` (exclusive) around the centre on each
    /// axis; single-cell axes sit on the centre.
    pub fn point(&self, cell: UVec3) -> Vec3 {
        let axis = |i: u32, n: u32| {
            if n <= 1 {
                0.0
            } else {
                (i as f32 - n as f32 * 0.5) * self.gap
            }
        };
        self.center
            + Vec3::new(
                axis(cell.x, self.dims.x),
                axis(cell.y, self.dims.y),
                axis(cell.z, self.dims.z),
            )
    }

    /// The lattice point at flat index `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Vec3> {
        if index >= self.len() {
            return None;
        }
        let (nx, ny) = (self.dims.x as usize, self.dims.y as usize);
        let x = index % nx;
        let y = (index / nx) % ny;
        let z = index / (nx * ny);
        Some(self.point(UVec3::new(x as u32, y as u32, z as u32)))
    }

    /// A uniformly chosen lattice point.
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec3 {
        let cell = UVec3::new(
            rng.gen_range(0..self.dims.x),
            rng.gen_range(0..self.dims.y),
            rng.gen_range(0..self.dims.z),
        );
        self.point(cell)
    }

    /// Give every particle a random lattice point to seek.
    pub fn assign<R: Rng>(&self, store: &mut ParticleStore, rng: &mut R) {
        for particle in store.iter_mut() {
            particle.assigned_target = Some(self.random_point(rng));
        }
    }

    /// Move existing assignments from `old` into this lattice, keeping each
    /// particle on the same cell (clamped to the new dimensions).
    pub fn relayout(&self, old: &Lattice, store: &mut ParticleStore) {
        for particle in store.iter_mut() {
            if let Some(target) = particle.assigned_target {
                particle.assigned_target = Some(self.point(self.clamp_cell(old.cell_of(target))));
            }
        }
    }

    /// The cell nearest `point`.
    pub fn cell_of(&self, point: Vec3) -> UVec3 {
        let axis = |p: f32, c: f32, n: u32| -> u32 {
            if n <= 1 {
                return 0;
            }
            let i = ((p - c) / self.gap + n as f32 * 0.5).round();
            i.clamp(0.0, (n - 1) as f32) as u32
        };
        UVec3::new(
            axis(point.x, self.center.x, self.dims.x),
            axis(point.y, self.center.y, self.dims.y),
            axis(point.z, self.center.z, self.dims.z),
        )
    }

    fn clamp_cell(&self, cell: UVec3) -> UVec3 {
        cell.min(self.dims - UVec3::ONE)
    }
}
