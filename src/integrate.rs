//! Free-particle motion: jitter, speed clamp, drift, wall bounce and pointer
//! attraction.

use glam::Vec3;
use rand::Rng;

use crate::particle::{Bounds, Particle};

/// Per-frame motion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub jitter: f32,
    pub max_speed: f32,
}

/// Advance one free particle by a frame: nudge its velocity, cap its speed,
/// move its baseline and keep it inside `bounds`.
///
/// Axes with zero extent (z in planar fields) get no jitter and no motion.
pub fn drift<R: Rng>(particle: &mut Particle, bounds: &Bounds, motion: &Motion, rng: &mut R) {
    let live = bounds.size().cmpgt(Vec3::ZERO);

    if motion.jitter > 0.0 {
        let noise = Vec3::new(
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
        ) * motion.jitter;
        particle.velocity += noise;
    }
    particle.velocity = Vec3::select(live, particle.velocity, Vec3::ZERO);
    particle.velocity = particle.velocity.clamp_length_max(motion.max_speed);

    particle.baseline += particle.velocity;
    bounce(particle, bounds);
}

/// Reflect velocity on every axis where the baseline left `bounds`, and
/// clamp it back inside.
pub fn bounce(particle: &mut Particle, bounds: &Bounds) {
    for axis in 0..3 {
        let p = particle.baseline[axis];
        if p < bounds.min[axis] {
            particle.baseline[axis] = bounds.min[axis];
            particle.velocity[axis] = particle.velocity[axis].abs();
        } else if p > bounds.max[axis] {
            particle.baseline[axis] = bounds.max[axis];
            particle.velocity[axis] = -particle.velocity[axis].abs();
        }
    }
}

/// Pull a particle toward the pointer. Strength falls off linearly from
/// `attraction` at the pointer to zero at `radius`.
///
/// `distance` is the screen-space distance the candidate was selected with;
/// `toward` is the pointer in world space at the particle's depth.
pub fn attract(particle: &mut Particle, toward: Vec3, distance: f32, radius: f32, attraction: f32) {
    if radius <= 0.0 || distance >= radius {
        return;
    }
    let dir = (toward - particle.baseline).normalize_or_zero();
    particle.velocity += dir * (1.0 - distance / radius) * attraction;
}

/// Apply damping after attraction.
#[inline]
pub fn damp(particle: &mut Particle, damping: f32) {
    particle.velocity *= damping;
}

/// Velocity nudge, per axis, given to particles let go from a line.
const RELEASE_KICK: f32 = 0.2;

/// Send a particle released from a line arrangement off with a small random
/// velocity in the x-y plane, so the line breaks up instead of hanging.
pub fn release_kick<R: Rng>(particle: &mut Particle, rng: &mut R) {
    particle.velocity.x += (rng.gen::<f32>() - 0.5) * RELEASE_KICK;
    particle.velocity.y += (rng.gen::<f32>() - 0.5) * RELEASE_KICK;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_bounce_containment() {
        let mut rng = SmallRng::seed_from_u64(11);
        let bounds = Bounds::planar(100.0, 60.0);
        let motion = Motion {
            jitter: 0.5,
            max_speed: 7.0,
        };
        let mut particle = Particle::at(0, Vec3::new(50.0, 30.0, 0.0), Vec3::new(6.0, -5.0, 0.0));

        for _ in 0..5_000 {
            drift(&mut particle, &bounds, &motion, &mut rng);
            particle.sync_position();
            assert!(bounds.contains(particle.position), "escaped at {:?}", particle.position);
            assert!(particle.velocity.length() <= 7.0 + 1e-4);
            assert_eq!(particle.velocity.z, 0.0);
        }
    }

    #[test]
    fn test_bounce_flips_sign() {
        let bounds = Bounds::planar(100.0, 100.0);
        let mut particle = Particle::at(0, Vec3::new(99.0, 1.0, 0.0), Vec3::new(3.0, -3.0, 0.0));
        particle.baseline += particle.velocity;
        bounce(&mut particle, &bounds);

        assert_eq!(particle.baseline, Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(particle.velocity, Vec3::new(-3.0, 3.0, 0.0));
    }

    #[test]
    fn test_volume_bounce() {
        let bounds = Bounds::volume(Vec3::splat(10.0));
        let mut particle = Particle::at(0, Vec3::new(0.0, 0.0, -9.5), Vec3::new(0.0, 0.0, -2.0));
        let mut rng = SmallRng::seed_from_u64(1);
        drift(
            &mut particle,
            &bounds,
            &Motion {
                jitter: 0.0,
                max_speed: 5.0,
            },
            &mut rng,
        );
        assert_eq!(particle.baseline.z, -10.0);
        assert_eq!(particle.velocity.z, 2.0);
    }

    #[test]
    fn test_attract_pulls_toward_pointer() {
        let mut particle = Particle::at(0, Vec3::ZERO, Vec3::ZERO);
        attract(&mut particle, Vec3::new(40.0, 0.0, 0.0), 40.0, 160.0, 0.12);
        assert!(particle.velocity.x > 0.0);
        assert!((particle.velocity.x - 0.09).abs() < 1e-6);

        let before = particle.velocity;
        attract(&mut particle, Vec3::new(400.0, 0.0, 0.0), 400.0, 160.0, 0.12);
        assert_eq!(particle.velocity, before);

        damp(&mut particle, 0.5);
        assert!((particle.velocity.x - 0.045).abs() < 1e-6);
    }

    #[test]
    fn test_release_kick_is_small_and_planar() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..100 {
            let mut particle = Particle::at(0, Vec3::ZERO, Vec3::ZERO);
            release_kick(&mut particle, &mut rng);
            assert!(particle.velocity.x.abs() <= 0.1);
            assert!(particle.velocity.y.abs() <= 0.1);
            assert_eq!(particle.velocity.z, 0.0);
        }
    }
}
