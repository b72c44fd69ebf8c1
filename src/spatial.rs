//! Proximity queries.
//!
//! Two queries run every frame:
//!
//! - pointer → particles, measured in screen space after projection, then
//!   ranked and cut off at `max_affected`;
//! - particle ↔ particle, measured in world space, for the link graph.
//!
//! The pair query is a plain O(n²) scan. Fields hold tens to low hundreds
//! of particles, where a spatial hash costs more than it saves.

use glam::{Vec2, Vec3};

/// A particle within reach of the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Index into the particle store.
    pub index: usize,
    /// Screen-space distance to the pointer, in pixels.
    pub distance: f32,
}

/// An unordered pair of particles closer than the link distance. `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
}

/// Collect every projected particle within `radius` of the pointer.
///
/// `projected` yields `(index, screen_position)`; particles that failed to
/// project are simply not yielded. `out` is cleared first.
pub fn pointer_candidates<I>(projected: I, pointer: Vec2, radius: f32, out: &mut Vec<Candidate>)
where
    I: IntoIterator<Item = (usize, Vec2)>,
{
    out.clear();
    if radius <= 0.0 {
        return;
    }
    out.extend(projected.into_iter().filter_map(|(index, screen)| {
        let distance = screen.distance(pointer);
        (distance <= radius).then_some(Candidate { index, distance })
    }));
}

/// Keep only the `max_affected` nearest candidates, nearest first.
///
/// The sort is stable, so equal distances keep store order.
pub fn rank_cutoff(candidates: &mut Vec<Candidate>, max_affected: usize) {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates.truncate(max_affected);
}

/// Every pair of points closer than `link_distance`. `out` is cleared first.
pub fn linked_pairs(points: &[Vec3], link_distance: f32, out: &mut Vec<Link>) {
    out.clear();
    if link_distance <= 0.0 {
        return;
    }
    let max_sq = link_distance * link_distance;
    for (i, a) in points.iter().enumerate() {
        for (j, b) in points.iter().enumerate().skip(i + 1) {
            let dist_sq = a.distance_squared(*b);
            if dist_sq < max_sq {
                out.push(Link {
                    a: i,
                    b: j,
                    distance: dist_sq.sqrt(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pointer_candidates_within_radius() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 4.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(50.0, 50.0),
        ];
        let mut out = Vec::new();
        pointer_candidates(points.iter().copied().enumerate(), Vec2::ZERO, 10.0, &mut out);

        let indices: Vec<usize> = out.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(out[1].distance, 5.0);
    }

    #[test]
    fn test_zero_radius_finds_nothing() {
        let mut out = vec![Candidate { index: 9, distance: 0.0 }];
        pointer_candidates([(0, Vec2::ZERO)], Vec2::ZERO, 0.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_rank_cutoff_keeps_nearest() {
        let mut candidates: Vec<Candidate> = (0..10)
            .map(|i| Candidate {
                index: i,
                distance: (10 - i) as f32,
            })
            .collect();
        rank_cutoff(&mut candidates, 3);

        let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![9, 8, 7]);
    }

    #[test]
    fn test_rank_cutoff_ties_keep_order() {
        let mut candidates = vec![
            Candidate { index: 4, distance: 1.0 },
            Candidate { index: 2, distance: 1.0 },
            Candidate { index: 7, distance: 0.5 },
        ];
        rank_cutoff(&mut candidates, 10);
        let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![7, 4, 2]);
    }

    #[test]
    fn test_linked_pairs_symmetric_no_self() {
        let points: Vec<Vec3> = (0..12)
            .map(|i| Vec3::new((i % 4) as f32 * 7.0, (i / 4) as f32 * 9.0, 0.0))
            .collect();
        let mut links = Vec::new();
        linked_pairs(&points, 12.0, &mut links);

        let set: HashSet<(usize, usize)> = links.iter().map(|l| (l.a, l.b)).collect();
        assert_eq!(set.len(), links.len());
        for link in &links {
            assert!(link.a < link.b);
            assert!(!set.contains(&(link.b, link.a)));
        }

        // Every close pair is found exactly once, whichever way round
        for i in 0..points.len() {
            for j in 0..points.len() {
                let close = i != j && points[i].distance(points[j]) < 12.0;
                let found = set.contains(&(i.min(j), i.max(j)));
                assert_eq!(close, found, "pair ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_linked_pairs_distance_is_exclusive() {
        let points = [Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)];
        let mut links = Vec::new();
        linked_pairs(&points, 5.0, &mut links);
        assert!(links.is_empty());
        linked_pairs(&points, 5.01, &mut links);
        assert_eq!(links.len(), 1);
    }
}
