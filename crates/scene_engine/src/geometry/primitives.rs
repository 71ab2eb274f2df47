//! Primitive 2D shapes and intersection algorithms
//!
//! Provides the basic geometric primitives (rays, discs, axis-aligned boxes)
//! with the intersection tests used by the broad phase and the tree walks.

use crate::foundation::math::Vec2;

/// A ray for ray casting queries
#[derive(Debug, Clone, Copy)]
pub struct Ray2 {
    /// The origin point of the ray in world space
    pub origin: Vec2,
    /// The direction of the ray (normalized on construction)
    pub direction: Vec2,
    /// Maximum distance along the ray that counts as a hit
    pub max_distance: f32,
}

impl Ray2 {
    /// Creates a new ray with the given origin, direction, and reach
    pub fn new(origin: Vec2, direction: Vec2, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            max_distance,
        }
    }

    /// Creates a ray spanning a line segment from start to end
    pub fn from_segment(start: Vec2, end: Vec2) -> Self {
        let displacement = end - start;
        let length = displacement.magnitude();
        Self {
            origin: start,
            direction: if length > 0.0 {
                displacement / length
            } else {
                Vec2::new(1.0, 0.0)
            },
            max_distance: length,
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.origin + self.direction * t
    }
}

/// Result of a ray intersection test
#[derive(Debug, Clone, Copy)]
pub struct RayHit2 {
    /// The distance from the ray origin to the impact point
    pub distance: f32,
    /// The point of impact in world space
    pub point: Vec2,
    /// The surface normal at the impact point
    pub normal: Vec2,
}

/// Axis-aligned bounding box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    /// Minimum corner of the bounding box
    pub min: Vec2,
    /// Maximum corner of the bounding box
    pub max: Vec2,
}

impl Aabb2 {
    /// Create a new box from min and max points
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Placeholder box assigned to tree nodes that contain no shapes
    pub fn empty_placeholder() -> Self {
        Self {
            min: Vec2::new(-1.0, -1.0),
            max: Vec2::new(0.0, 0.0),
        }
    }

    /// Compute the tight bounding box of a set of points
    ///
    /// Returns the placeholder box when the iterator yields no points.
    pub fn from_points<'a, I: IntoIterator<Item = &'a Vec2>>(points: I) -> Self {
        let mut min = Vec2::new(f32::MAX, f32::MAX);
        let mut max = Vec2::new(f32::MIN, f32::MIN);
        let mut any = false;
        for p in points {
            any = true;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        if any {
            Self { min, max }
        } else {
            Self::empty_placeholder()
        }
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the width and height of the box
    pub fn dimensions(&self) -> Vec2 {
        self.max - self.min
    }

    /// Move the box by an offset
    pub fn translate(&mut self, offset: Vec2) {
        self.min += offset;
        self.max += offset;
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Check if this box overlaps another box (touching edges count)
    pub fn overlaps(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Test ray intersection with this box using the slab method
    ///
    /// Returns the distance to the entry point if the ray reaches the box
    /// within its maximum distance, None otherwise. A ray starting inside the
    /// box reports an entry distance of zero.
    pub fn intersect_ray(&self, ray: &Ray2) -> Option<f32> {
        let inv_dir = Vec2::new(
            if ray.direction.x != 0.0 { 1.0 / ray.direction.x } else { f32::INFINITY },
            if ray.direction.y != 0.0 { 1.0 / ray.direction.y } else { f32::INFINITY },
        );

        let t1 = (self.min.x - ray.origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray.origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray.origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray.origin.y) * inv_dir.y;

        let tmin = t1.min(t2).max(t3.min(t4));
        let tmax = t1.max(t2).min(t3.max(t4));

        if tmax >= tmin && tmax >= 0.0 {
            let entry = tmin.max(0.0);
            if entry <= ray.max_distance {
                return Some(entry);
            }
        }
        None
    }
}

/// A bounding disc used for broad-phase ray rejection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingDisc {
    /// The center of the disc in world space
    pub center: Vec2,
    /// The radius of the disc
    pub radius: f32,
}

impl BoundingDisc {
    /// Creates a new bounding disc with the given center and radius
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if a point lies strictly inside the disc
    pub fn contains_point(&self, point: Vec2) -> bool {
        (point - self.center).magnitude_squared() < self.radius * self.radius
    }

    /// Test ray intersection with this disc
    ///
    /// Returns the entry distance if the ray reaches the disc within its
    /// maximum distance. A ray whose origin lies inside the disc reports no
    /// impact; callers that need the interior case must check
    /// [`contains_point`](Self::contains_point) first.
    pub fn intersect_ray(&self, ray: &Ray2) -> Option<f32> {
        // Vector from disc center to ray origin
        let oc = ray.origin - self.center;
        let c = oc.magnitude_squared() - self.radius * self.radius;
        if c < 0.0 {
            return None; // Interior origin: no impact by convention
        }

        // Quadratic formula coefficients for ray-disc intersection
        // Solve: |origin + t*direction - center|^2 = radius^2
        let a = ray.direction.magnitude_squared(); // 1.0 for a normalized direction
        let b = 2.0 * oc.dot(&ray.direction);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        // Nearest root is the entry point since the origin is outside
        let t = (-b - discriminant.sqrt()) / (2.0 * a);
        if t >= 0.0 && t <= ray.max_distance {
            Some(t)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_ray_entry_distance() {
        let bounds = Aabb2::new(Vec2::new(2.0, -1.0), Vec2::new(4.0, 1.0));
        let ray = Ray2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 10.0);
        let entry = bounds.intersect_ray(&ray).expect("ray should enter the box");
        assert_relative_eq!(entry, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_aabb_ray_miss_and_reach() {
        let bounds = Aabb2::new(Vec2::new(2.0, -1.0), Vec2::new(4.0, 1.0));
        let miss = Ray2::new(Vec2::new(0.0, 5.0), Vec2::new(1.0, 0.0), 10.0);
        assert!(bounds.intersect_ray(&miss).is_none());

        let short = Ray2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 1.5);
        assert!(bounds.intersect_ray(&short).is_none());
    }

    #[test]
    fn test_aabb_ray_origin_inside() {
        let bounds = Aabb2::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        let ray = Ray2::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), 5.0);
        assert_eq!(bounds.intersect_ray(&ray), Some(0.0));
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        let b = Aabb2::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0));
        let c = Aabb2::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_disc_ray_entry() {
        let disc = BoundingDisc::new(Vec2::new(5.0, 0.0), 1.0);
        let ray = Ray2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 10.0);
        let entry = disc.intersect_ray(&ray).expect("ray should hit the disc");
        assert_relative_eq!(entry, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_disc_interior_origin_reports_no_impact() {
        let disc = BoundingDisc::new(Vec2::new(0.0, 0.0), 2.0);
        let ray = Ray2::new(Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0), 10.0);
        assert!(disc.contains_point(ray.origin));
        assert!(disc.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_from_points_tight_fit() {
        let points = [Vec2::new(1.0, 4.0), Vec2::new(-2.0, 0.5), Vec2::new(3.0, 2.0)];
        let bounds = Aabb2::from_points(points.iter());
        assert_eq!(bounds.min, Vec2::new(-2.0, 0.5));
        assert_eq!(bounds.max, Vec2::new(3.0, 4.0));
    }
}
