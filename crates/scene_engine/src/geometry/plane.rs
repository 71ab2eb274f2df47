//! Half-plane representation used by the convex hull

use crate::foundation::math::{utils, Vec2};

/// A directed 2D plane (a line with an outward normal)
///
/// Points p on the plane satisfy `normal . p == distance`. The altitude of a
/// point is positive on the outside (the side the normal points toward) and
/// negative on the inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane2 {
    /// Unit outward normal
    pub normal: Vec2,
    /// Signed distance from the world origin along the normal
    pub distance: f32,
}

impl Plane2 {
    /// Creates a plane from an outward normal and a distance from origin
    pub fn new(normal: Vec2, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Creates the plane through a point with the given outward normal
    pub fn from_point_normal(point: Vec2, normal: Vec2) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: normal.dot(&point),
        }
    }

    /// Signed distance from a point to the plane (positive = outside)
    pub fn altitude(&self, point: Vec2) -> f32 {
        self.normal.dot(&point) - self.distance
    }

    /// The point on the plane closest to the world origin
    pub fn origin_point(&self) -> Vec2 {
        self.normal * self.distance
    }

    /// Move the plane by an offset
    pub fn translate(&mut self, offset: Vec2) {
        self.distance += self.normal.dot(&offset);
    }

    /// Rotate the plane counter-clockwise around a pivot by degrees
    pub fn rotate_about(&mut self, degrees: f32, pivot: Vec2) {
        let rotated_point = utils::rotate_about(self.origin_point(), pivot, degrees);
        self.normal = utils::rotate_degrees(self.normal, degrees);
        self.distance = self.normal.dot(&rotated_point);
    }

    /// Scale the plane's distance from a pivot by a factor
    pub fn scale_about(&mut self, factor: f32, pivot: Vec2) {
        let scaled_point = pivot + (self.origin_point() - pivot) * factor;
        self.distance = self.normal.dot(&scaled_point);
    }

    /// Intersect two planes, returning the common point
    ///
    /// Returns None for parallel (or nearly parallel) planes.
    pub fn intersect(&self, other: &Plane2) -> Option<Vec2> {
        let det = self.normal.x * other.normal.y - self.normal.y * other.normal.x;
        if det.abs() < 1e-8 {
            return None;
        }
        Some(Vec2::new(
            (self.distance * other.normal.y - other.distance * self.normal.y) / det,
            (self.normal.x * other.distance - other.normal.x * self.distance) / det,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_altitude_sign() {
        let plane = Plane2::from_point_normal(Vec2::new(2.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(plane.altitude(Vec2::new(3.0, 1.0)) > 0.0);
        assert!(plane.altitude(Vec2::new(1.0, -1.0)) < 0.0);
        assert_relative_eq!(plane.altitude(Vec2::new(2.0, 5.0)), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_translate_keeps_orientation() {
        let mut plane = Plane2::from_point_normal(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0));
        plane.translate(Vec2::new(2.0, 7.0));
        assert_relative_eq!(plane.distance, 3.0, epsilon = 1e-6);
        assert_relative_eq!(plane.normal.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_plane_intersection() {
        let a = Plane2::from_point_normal(Vec2::new(2.0, 0.0), Vec2::new(1.0, 0.0));
        let b = Plane2::from_point_normal(Vec2::new(0.0, 3.0), Vec2::new(0.0, 1.0));
        let p = a.intersect(&b).expect("perpendicular planes intersect");
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_parallel_planes_do_not_intersect() {
        let a = Plane2::from_point_normal(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0));
        let b = Plane2::from_point_normal(Vec2::new(4.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(a.intersect(&b).is_none());
    }
}
