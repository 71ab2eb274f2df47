//! Ray query orchestration across acceleration strategies
//!
//! Every strategy answers the same question: the nearest impact of a ray
//! against the scene's shapes. The brute-force strategies differ only in
//! their per-shape broad phase; the tree strategies first narrow the shape
//! set to candidates along the ray. Mismatched answers between strategies
//! mean an accelerator disagrees with ground truth, which is a programming
//! error, not an input error.

use crate::foundation::time::Stopwatch;
use crate::geometry::{BroadPhase, ConvexShape, Ray2, RayHit2};
use crate::scene::Scene;
use crate::spatial::ShapeIndex;

/// How a ray query selects its candidate shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayQueryStrategy {
    /// Narrow-phase test against every shape
    BruteForce,
    /// Per-shape bounding-disc rejection before the narrow phase
    DiscReject,
    /// Per-shape bounding-box rejection before the narrow phase
    BoxReject,
    /// Region quadtree candidate query, then narrow phase
    QuadTree,
    /// Bounding-box tree candidate query, then narrow phase
    BvhTree,
}

impl RayQueryStrategy {
    /// All strategies, in benchmark order
    pub const ALL: [RayQueryStrategy; 5] = [
        RayQueryStrategy::BruteForce,
        RayQueryStrategy::DiscReject,
        RayQueryStrategy::BoxReject,
        RayQueryStrategy::QuadTree,
        RayQueryStrategy::BvhTree,
    ];

    /// Short display name for logs and benchmark output
    pub fn name(self) -> &'static str {
        match self {
            RayQueryStrategy::BruteForce => "brute-force",
            RayQueryStrategy::DiscReject => "disc-reject",
            RayQueryStrategy::BoxReject => "box-reject",
            RayQueryStrategy::QuadTree => "quadtree",
            RayQueryStrategy::BvhTree => "bvh",
        }
    }
}

/// Aggregate result of casting a batch of rays with one strategy
#[derive(Debug, Clone, Copy)]
pub struct RayBatchStats {
    /// Number of rays cast
    pub rays: usize,
    /// Number of rays that hit any shape
    pub hit_count: usize,
    /// Average nearest-impact distance over the hitting rays
    pub average_distance: f32,
    /// Wall-clock time spent casting, in milliseconds
    pub elapsed_ms: f32,
}

/// Nearest impact over every shape, with a per-shape broad phase
pub fn cast_all_shapes(shapes: &[ConvexShape], ray: &Ray2, broad_phase: BroadPhase) -> Option<RayHit2> {
    let mut closest: Option<RayHit2> = None;
    for shape in shapes {
        if let Some(hit) = shape.raycast(ray, broad_phase) {
            if closest.map_or(true, |best| hit.distance < best.distance) {
                closest = Some(hit);
            }
        }
    }
    closest
}

/// Nearest impact over a candidate subset produced by a tree query
pub fn cast_candidates(shapes: &[ConvexShape], candidates: &[ShapeIndex], ray: &Ray2) -> Option<RayHit2> {
    let mut closest: Option<RayHit2> = None;
    for &index in candidates {
        let Some(shape) = shapes.get(index as usize) else {
            continue;
        };
        if let Some(hit) = shape.raycast(ray, BroadPhase::Disc) {
            if closest.map_or(true, |best| hit.distance < best.distance) {
                closest = Some(hit);
            }
        }
    }
    closest
}

/// Cast a batch of rays against a scene and collect aggregate statistics
pub fn run_batch(scene: &Scene, rays: &[Ray2], strategy: RayQueryStrategy) -> RayBatchStats {
    let stopwatch = Stopwatch::start_new();
    let mut hit_count = 0usize;
    let mut distance_sum = 0.0f32;

    for ray in rays {
        if let Some(hit) = scene.query_ray(ray, strategy) {
            hit_count += 1;
            distance_sum += hit.distance;
        }
    }

    RayBatchStats {
        rays: rays.len(),
        hit_count,
        average_distance: if hit_count > 0 {
            distance_sum / hit_count as f32
        } else {
            0.0
        },
        elapsed_ms: stopwatch.elapsed_millis(),
    }
}

/// Run one batch per strategy and verify they agree
///
/// Hit counts must match exactly across every strategy; a mismatch trips a
/// debug assertion because it means an accelerator dropped or invented a
/// candidate.
pub fn run_comparison(scene: &Scene, rays: &[Ray2]) -> Vec<(RayQueryStrategy, RayBatchStats)> {
    let mut results = Vec::with_capacity(RayQueryStrategy::ALL.len());
    for strategy in RayQueryStrategy::ALL {
        let stats = run_batch(scene, rays, strategy);
        log::debug!(
            "{}: {}/{} hits, avg distance {:.3}, {:.3} ms",
            strategy.name(),
            stats.hit_count,
            stats.rays,
            stats.average_distance,
            stats.elapsed_ms
        );
        results.push((strategy, stats));
    }

    let baseline = results[0].1;
    for (strategy, stats) in &results[1..] {
        debug_assert_eq!(
            stats.hit_count,
            baseline.hit_count,
            "{} hit count diverges from brute force",
            strategy.name()
        );
        if stats.hit_count != baseline.hit_count {
            log::error!(
                "{} reported {} hits, brute force reported {}",
                strategy.name(),
                stats.hit_count,
                baseline.hit_count
            );
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::geometry::Aabb2;
    use crate::scene::generator;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn triangle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> ConvexShape {
        ConvexShape::from_vertices(vec![
            Vec2::new(a.0, a.1),
            Vec2::new(b.0, b.1),
            Vec2::new(c.0, c.1),
        ])
    }

    /// Three separated triangles in a 200x100 world; one ray through all
    /// three bounding boxes must report the same nearest hit under every
    /// strategy.
    #[test]
    fn test_three_triangles_all_strategies_agree() {
        let world = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
        let mut scene = Scene::new(world);
        scene.add_shape(triangle((40.0, 15.0), (55.0, 25.0), (38.0, 28.0)));
        scene.add_shape(triangle((90.0, 40.0), (105.0, 50.0), (88.0, 55.0)));
        scene.add_shape(triangle((150.0, 70.0), (165.0, 80.0), (148.0, 85.0)));
        scene.rebuild_accelerators();

        let ray = Ray2::from_segment(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));

        let baseline = scene
            .query_ray(&ray, RayQueryStrategy::BruteForce)
            .expect("the diagonal ray should hit a triangle");
        for strategy in RayQueryStrategy::ALL {
            let hit = scene
                .query_ray(&ray, strategy)
                .unwrap_or_else(|| panic!("{} missed", strategy.name()));
            assert_relative_eq!(hit.distance, baseline.distance, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_batch_statistics_identical_across_strategies() {
        let mut rng = StdRng::seed_from_u64(7);
        let world = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
        let mut scene = generator::random_scene(&mut rng, world, 48, 2.0, 6.0);
        scene.rebuild_accelerators();

        let rays = generator::random_rays(&mut rng, world, 256);
        let results = run_comparison(&scene, &rays);

        let baseline = results[0].1;
        assert!(baseline.hit_count > 0, "seeded batch should produce hits");
        for (strategy, stats) in &results {
            assert_eq!(stats.hit_count, baseline.hit_count, "{} hit count", strategy.name());
            assert_relative_eq!(
                stats.average_distance,
                baseline.average_distance,
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn test_empty_scene_misses_everything() {
        let world = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let mut scene = Scene::new(world);
        scene.rebuild_accelerators();

        let ray = Ray2::from_segment(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        for strategy in RayQueryStrategy::ALL {
            assert!(scene.query_ray(&ray, strategy).is_none());
        }
    }
}
