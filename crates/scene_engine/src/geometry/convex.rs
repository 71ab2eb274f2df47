//! Dual-representation convex polygon
//!
//! A convex shape is held in two equivalent forms at all times: an ordered
//! counter-clockwise vertex loop (for rendering and bounds computation) and a
//! list of outward half-planes (for containment and raycasting). Every edit
//! keeps both forms and the cached bounding volumes in sync.

use crate::foundation::math::{utils, Vec2};
use crate::geometry::plane::Plane2;
use crate::geometry::primitives::{Aabb2, BoundingDisc, Ray2, RayHit2};

/// Broad-phase rejection policy for a single-shape ray test
///
/// The policy only changes how much work a miss costs; hit results are
/// identical across all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadPhase {
    /// Always run the narrow-phase hull test
    None,
    /// Reject rays that miss the bounding disc
    Disc,
    /// Reject rays that miss the bounding box
    Box,
}

/// Vertex-based representation: a counter-clockwise loop of corners
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<Vec2>,
}

impl ConvexPolygon {
    /// Create a polygon from counter-clockwise ordered vertices
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// The vertex loop in counter-clockwise order
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Average of the vertices
    pub fn centroid(&self) -> Vec2 {
        let mut sum = Vec2::new(0.0, 0.0);
        for v in &self.vertices {
            sum += *v;
        }
        sum / self.vertices.len().max(1) as f32
    }

    /// Move every vertex by an offset
    pub fn translate(&mut self, offset: Vec2) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Rotate every vertex counter-clockwise around a pivot by degrees
    pub fn rotate_about(&mut self, degrees: f32, pivot: Vec2) {
        for v in &mut self.vertices {
            *v = utils::rotate_about(*v, pivot, degrees);
        }
    }

    /// Scale every vertex away from a pivot by a factor
    pub fn scale_about(&mut self, factor: f32, pivot: Vec2) {
        for v in &mut self.vertices {
            *v = pivot + (*v - pivot) * factor;
        }
    }
}

/// Plane-based representation: outward half-planes, one per edge
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    planes: Vec<Plane2>,
}

impl ConvexHull {
    /// Create a hull from outward bounding planes in edge order
    pub fn new(planes: Vec<Plane2>) -> Self {
        Self { planes }
    }

    /// Derive the hull from a counter-clockwise polygon
    ///
    /// Each edge contributes one plane whose normal points away from the
    /// interior. Zero-length edges are skipped.
    pub fn from_polygon(polygon: &ConvexPolygon) -> Self {
        let vertices = polygon.vertices();
        let count = vertices.len();
        let mut planes = Vec::with_capacity(count);
        for i in 0..count {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            let edge = b - a;
            let length = edge.magnitude();
            if length <= 0.0 {
                continue;
            }
            // Interior lies to the left of a CCW edge, so outward is right
            let normal = utils::rotate_minus_90(edge / length);
            planes.push(Plane2::from_point_normal(a, normal));
        }
        Self { planes }
    }

    /// Reconstruct the vertex loop by intersecting adjacent planes
    ///
    /// Plane i is the edge from vertex i to vertex i+1, so vertex i is the
    /// intersection of planes i-1 and i. Nearly parallel neighbors produce no
    /// vertex.
    pub fn to_polygon(&self) -> ConvexPolygon {
        let count = self.planes.len();
        let mut vertices = Vec::with_capacity(count);
        for i in 0..count {
            let previous = &self.planes[(i + count - 1) % count];
            if let Some(vertex) = previous.intersect(&self.planes[i]) {
                vertices.push(vertex);
            }
        }
        ConvexPolygon::new(vertices)
    }

    /// The bounding planes in edge order
    pub fn planes(&self) -> &[Plane2] {
        &self.planes
    }

    /// Test if a point is inside the hull (boundary counts as inside)
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.planes.iter().all(|plane| plane.altitude(point) <= 0.0)
    }

    /// Move the hull by an offset
    pub fn translate(&mut self, offset: Vec2) {
        for plane in &mut self.planes {
            plane.translate(offset);
        }
    }

    /// Rotate the hull counter-clockwise around a pivot by degrees
    pub fn rotate_about(&mut self, degrees: f32, pivot: Vec2) {
        for plane in &mut self.planes {
            plane.rotate_about(degrees, pivot);
        }
    }

    /// Scale the hull away from a pivot by a factor
    pub fn scale_about(&mut self, factor: f32, pivot: Vec2) {
        for plane in &mut self.planes {
            plane.scale_about(factor, pivot);
        }
    }

    /// Narrow-phase ray test by clipping against every half-plane
    ///
    /// Entering planes raise the entry distance, exiting planes lower the
    /// exit distance; the ray hits when an entry interval survives. A ray
    /// starting inside reports an impact at its origin with the reversed ray
    /// direction as the normal.
    pub fn intersect_ray(&self, ray: &Ray2) -> Option<RayHit2> {
        if self.planes.is_empty() {
            return None; // An empty hull bounds nothing
        }
        let mut entry: Option<(f32, Vec2)> = None;
        let mut t_exit = f32::INFINITY;

        for plane in &self.planes {
            let facing = plane.normal.dot(&ray.direction);
            let altitude = plane.altitude(ray.origin);

            if facing == 0.0 {
                if altitude > 0.0 {
                    return None; // Parallel and outside: can never enter
                }
                continue;
            }

            let t = -altitude / facing;
            if facing < 0.0 {
                // Moving toward the interior of this plane
                if entry.map_or(true, |(t_enter, _)| t > t_enter) {
                    entry = Some((t, plane.normal));
                }
            } else if t < t_exit {
                t_exit = t;
            }
        }

        let t_enter = entry.map_or(f32::NEG_INFINITY, |(t, _)| t);
        if t_enter > t_exit || t_exit < 0.0 {
            return None;
        }

        match entry {
            Some((distance, normal)) if distance >= 0.0 => {
                if distance > ray.max_distance {
                    None
                } else {
                    Some(RayHit2 {
                        distance,
                        point: ray.point_at(distance),
                        normal,
                    })
                }
            }
            // Origin inside the hull: immediate impact
            _ => Some(RayHit2 {
                distance: 0.0,
                point: ray.origin,
                normal: -ray.direction,
            }),
        }
    }
}

/// 2D convex polygon with dual representation and cached bounding volumes
///
/// Maintains both the plane-based hull (for raycasting) and the vertex-based
/// polygon (for rendering and bounds), plus a bounding disc and box for
/// broad-phase rejection.
#[derive(Debug, Clone)]
pub struct ConvexShape {
    polygon: ConvexPolygon,
    hull: ConvexHull,
    bounding_box: Aabb2,
    bounding_disc: BoundingDisc,
    scale: f32,
}

impl ConvexShape {
    /// Construct from a counter-clockwise vertex loop
    pub fn from_vertices(vertices: Vec<Vec2>) -> Self {
        Self::from_polygon(ConvexPolygon::new(vertices))
    }

    /// Construct from the vertex representation, deriving the hull
    pub fn from_polygon(polygon: ConvexPolygon) -> Self {
        let hull = ConvexHull::from_polygon(&polygon);
        let mut shape = Self {
            polygon,
            hull,
            bounding_box: Aabb2::empty_placeholder(),
            bounding_disc: BoundingDisc::new(Vec2::new(0.0, 0.0), 0.0),
            scale: 1.0,
        };
        shape.rebuild_bounding_volumes();
        shape
    }

    /// Construct from the plane representation, deriving the polygon
    pub fn from_hull(hull: ConvexHull) -> Self {
        let polygon = hull.to_polygon();
        let mut shape = Self {
            polygon,
            hull,
            bounding_box: Aabb2::empty_placeholder(),
            bounding_disc: BoundingDisc::new(Vec2::new(0.0, 0.0), 0.0),
            scale: 1.0,
        };
        shape.rebuild_bounding_volumes();
        shape
    }

    /// The vertex representation
    pub fn polygon(&self) -> &ConvexPolygon {
        &self.polygon
    }

    /// The plane representation
    pub fn hull(&self) -> &ConvexHull {
        &self.hull
    }

    /// The cached axis-aligned bounding box
    pub fn bounding_box(&self) -> &Aabb2 {
        &self.bounding_box
    }

    /// The cached bounding disc
    pub fn bounding_disc(&self) -> &BoundingDisc {
        &self.bounding_disc
    }

    /// The accumulated uniform scale factor
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Overwrite the hull representation (decoded from a scene file)
    pub(crate) fn set_hull(&mut self, hull: ConvexHull) {
        self.hull = hull;
    }

    /// Overwrite the cached bounding volumes (decoded from a scene file)
    pub(crate) fn set_bounding_volumes(&mut self, disc: BoundingDisc, bounding_box: Aabb2) {
        self.bounding_disc = disc;
        self.bounding_box = bounding_box;
    }

    /// Move the shape by an offset
    pub fn translate(&mut self, offset: Vec2) {
        self.hull.translate(offset);
        self.polygon.translate(offset);
        self.bounding_box.translate(offset);
        self.bounding_disc.center += offset;
    }

    /// Rotate the shape counter-clockwise around a reference point by degrees
    pub fn rotate(&mut self, degrees: f32, pivot: Vec2) {
        self.bounding_disc.center = utils::rotate_about(self.bounding_disc.center, pivot, degrees);
        self.hull.rotate_about(degrees, pivot);
        self.polygon.rotate_about(degrees, pivot);

        // Rotation changes the axis-aligned bounds
        self.rebuild_bounding_box();
    }

    /// Grow or shrink the shape around a reference point
    ///
    /// The delta is accumulated into the running scale total; the factor
    /// applied to the geometry is the ratio of the new total to the old. A
    /// delta that would drive the total to zero or below is ignored.
    pub fn scale_by(&mut self, delta: f32, pivot: Vec2) {
        let new_scale = self.scale + delta;
        if new_scale <= 0.0 {
            log::warn!("ignoring scale delta {delta} that would collapse the shape");
            return;
        }
        let factor = new_scale / self.scale;
        self.scale = new_scale;

        self.bounding_disc.radius *= factor;
        self.bounding_disc.center = pivot + (self.bounding_disc.center - pivot) * factor;
        self.hull.scale_about(factor, pivot);
        self.polygon.scale_about(factor, pivot);

        self.rebuild_bounding_box();
    }

    /// Recompute the bounding box tight to the current vertices
    pub fn rebuild_bounding_box(&mut self) {
        self.bounding_box = Aabb2::from_points(self.polygon.vertices());
    }

    /// Recompute both the bounding box and the bounding disc
    ///
    /// The disc center is the vertex centroid; the radius is the distance to
    /// the farthest vertex.
    pub fn rebuild_bounding_volumes(&mut self) {
        self.rebuild_bounding_box();

        let center = self.polygon.centroid();
        let mut max_radius_sq = 0.0f32;
        for v in self.polygon.vertices() {
            max_radius_sq = max_radius_sq.max((v - center).magnitude_squared());
        }
        self.bounding_disc = BoundingDisc::new(center, max_radius_sq.sqrt());
    }

    /// Test if a point is inside the shape
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.hull.contains_point(point)
    }

    /// Ray test with an optional broad-phase rejection step
    ///
    /// All policies return the same impact (or miss) for any ray; the broad
    /// phase only skips narrow-phase work for rays that cannot hit.
    pub fn raycast(&self, ray: &Ray2, broad_phase: BroadPhase) -> Option<RayHit2> {
        match broad_phase {
            BroadPhase::Disc => {
                // The disc test reports no impact for an interior origin, so
                // a ray starting inside the disc must go straight to the
                // narrow phase.
                if self.bounding_disc.contains_point(ray.origin) {
                    return self.hull.intersect_ray(ray);
                }
                if self.bounding_disc.intersect_ray(ray).is_some() {
                    return self.hull.intersect_ray(ray);
                }
                None
            }
            BroadPhase::Box => {
                if self.bounding_box.intersect_ray(ray).is_some() {
                    return self.hull.intersect_ray(ray);
                }
                None
            }
            BroadPhase::None => self.hull.intersect_ray(ray),
        }
    }
}
