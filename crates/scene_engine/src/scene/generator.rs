//! Randomized scene and ray generation
//!
//! Used by the benchmark application and the randomized tests. Generation is
//! driven by a caller-supplied RNG so seeded runs are reproducible.

use rand::Rng;

use crate::foundation::math::{utils, Vec2};
use crate::geometry::{Aabb2, ConvexShape, Ray2};
use crate::scene::Scene;

/// Generate a random convex shape centered near a point
///
/// Picks 3 to 8 corners at jittered, sorted polar angles with a uniform
/// radius; sorting the angles guarantees counter-clockwise winding.
pub fn random_convex<R: Rng>(rng: &mut R, center: Vec2, min_radius: f32, max_radius: f32) -> ConvexShape {
    let sides = rng.gen_range(3..=8);
    let radius = rng.gen_range(min_radius..max_radius);
    let angle_step = 360.0 / sides as f32;

    let mut angles: Vec<f32> = (0..sides)
        .map(|i| {
            let base = angle_step * i as f32;
            base + rng.gen_range(-angle_step * 0.3..angle_step * 0.3)
        })
        .collect();
    angles.sort_by(|a, b| a.total_cmp(b));

    let vertices = angles
        .iter()
        .map(|&angle| center + utils::from_polar_degrees(angle, radius))
        .collect();
    ConvexShape::from_vertices(vertices)
}

/// Generate a scene populated with random convex shapes
///
/// Centers are placed inside the world rectangle inset by the maximum radius
/// so every shape lies fully inside the world bounds.
pub fn random_scene<R: Rng>(
    rng: &mut R,
    world_bounds: Aabb2,
    shape_count: usize,
    min_radius: f32,
    max_radius: f32,
) -> Scene {
    let mut scene = Scene::new(world_bounds);
    for _ in 0..shape_count {
        let center = Vec2::new(
            rng.gen_range(world_bounds.min.x + max_radius..world_bounds.max.x - max_radius),
            rng.gen_range(world_bounds.min.y + max_radius..world_bounds.max.y - max_radius),
        );
        scene.add_shape(random_convex(rng, center, min_radius, max_radius));
    }
    scene
}

/// Generate rays between random point pairs inside a rectangle
pub fn random_rays<R: Rng>(rng: &mut R, world_bounds: Aabb2, count: usize) -> Vec<Ray2> {
    (0..count)
        .map(|_| {
            let start = Vec2::new(
                rng.gen_range(world_bounds.min.x..world_bounds.max.x),
                rng.gen_range(world_bounds.min.y..world_bounds.max.y),
            );
            let end = Vec2::new(
                rng.gen_range(world_bounds.min.x..world_bounds.max.x),
                rng.gen_range(world_bounds.min.y..world_bounds.max.y),
            );
            Ray2::from_segment(start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_convex_is_convex_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..32 {
            let center = Vec2::new(50.0, 50.0);
            let shape = random_convex(&mut rng, center, 2.0, 8.0);
            let sides = shape.polygon().vertices().len();
            assert!((3..=8).contains(&sides));

            // Every vertex stays within the radius cap
            for v in shape.polygon().vertices() {
                assert!((v - center).magnitude() <= 8.0 + 1e-4);
            }

            // All vertices inside the hull (CCW winding produced a valid dual)
            for v in shape.polygon().vertices() {
                for plane in shape.hull().planes() {
                    assert!(plane.altitude(*v) <= 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_random_scene_stays_in_world() {
        let mut rng = StdRng::seed_from_u64(9);
        let world = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
        let scene = random_scene(&mut rng, world, 20, 2.0, 6.0);
        assert_eq!(scene.shape_count(), 20);
        for shape in scene.shapes() {
            assert!(world.contains_point(shape.bounding_box().min));
            assert!(world.contains_point(shape.bounding_box().max));
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let world = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
        let scene_a = random_scene(&mut StdRng::seed_from_u64(3), world, 8, 2.0, 6.0);
        let scene_b = random_scene(&mut StdRng::seed_from_u64(3), world, 8, 2.0, 6.0);
        for (a, b) in scene_a.shapes().iter().zip(scene_b.shapes()) {
            assert_eq!(a.polygon().vertices(), b.polygon().vertices());
        }
    }
}
