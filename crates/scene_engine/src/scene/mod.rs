//! Scene container: shapes, world bounds, and both accelerators
//!
//! The scene owns the shape list and the two spatial trees built over it.
//! Mutating any shape invalidates the trees; callers rebuild them before the
//! next accelerated query. Loading a scene file replaces the live scene only
//! after the whole file decodes successfully.

pub mod generator;

use std::path::Path;

use crate::codec::{self, CodecError, UnknownChunk};
use crate::foundation::math::Vec2;
use crate::geometry::{Aabb2, BroadPhase, ConvexShape, Ray2, RayHit2};
use crate::raycast::{self, RayQueryStrategy};
use crate::spatial::{bvh_depth_for, AabbTree, RegionQuadTree, ShapeIndex};

/// Default recursion depth of the region quadtree
pub const DEFAULT_QUADTREE_DEPTH: usize = 4;

/// A collection of convex shapes with ray acceleration and persistence
#[derive(Debug, Clone)]
pub struct Scene {
    shapes: Vec<ConvexShape>,
    world_bounds: Aabb2,
    bvh: AabbTree,
    quadtree: RegionQuadTree,
    quadtree_depth: usize,
    preserved_chunks: Vec<UnknownChunk>,
    modified: bool,
    accelerators_stale: bool,
}

impl Scene {
    /// Create an empty scene covering the given world rectangle
    pub fn new(world_bounds: Aabb2) -> Self {
        Self {
            shapes: Vec::new(),
            world_bounds,
            bvh: AabbTree::new(),
            quadtree: RegionQuadTree::new(),
            quadtree_depth: DEFAULT_QUADTREE_DEPTH,
            preserved_chunks: Vec::new(),
            modified: false,
            accelerators_stale: false,
        }
    }

    /// Assemble a scene decoded from a file
    pub(crate) fn from_decoded(
        shapes: Vec<ConvexShape>,
        world_bounds: Aabb2,
        bvh: AabbTree,
        quadtree: RegionQuadTree,
        preserved_chunks: Vec<UnknownChunk>,
    ) -> Self {
        Self {
            shapes,
            world_bounds,
            bvh,
            quadtree,
            quadtree_depth: DEFAULT_QUADTREE_DEPTH,
            preserved_chunks,
            modified: false,
            accelerators_stale: false,
        }
    }

    /// All shapes in the scene, in serialization order
    pub fn shapes(&self) -> &[ConvexShape] {
        &self.shapes
    }

    /// A single shape by index
    pub fn shape(&self, index: ShapeIndex) -> Option<&ConvexShape> {
        self.shapes.get(index as usize)
    }

    /// Number of shapes in the scene
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// The world rectangle the accelerators subdivide
    pub fn world_bounds(&self) -> &Aabb2 {
        &self.world_bounds
    }

    /// The bounding-box tree (for debug overlays; node bounds are readable)
    pub fn bvh(&self) -> &AabbTree {
        &self.bvh
    }

    /// The region quadtree (for debug overlays; node bounds are readable)
    pub fn quadtree(&self) -> &RegionQuadTree {
        &self.quadtree
    }

    /// Whether the scene changed since it was loaded or created
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Unrecognized chunks carried over from the loaded file
    pub(crate) fn preserved_chunks(&self) -> &[UnknownChunk] {
        &self.preserved_chunks
    }

    #[cfg(test)]
    pub(crate) fn set_preserved_chunks(&mut self, chunks: Vec<UnknownChunk>) {
        self.preserved_chunks = chunks;
    }

    /// Override the quadtree recursion depth used by rebuilds
    pub fn set_quadtree_depth(&mut self, depth: usize) {
        self.quadtree_depth = depth;
        self.accelerators_stale = true;
    }

    /// Add a shape, returning its index
    pub fn add_shape(&mut self, shape: ConvexShape) -> ShapeIndex {
        self.shapes.push(shape);
        self.mark_modified();
        (self.shapes.len() - 1) as ShapeIndex
    }

    /// Remove a shape by index, shifting later indices down
    pub fn remove_shape(&mut self, index: ShapeIndex) -> Option<ConvexShape> {
        if (index as usize) >= self.shapes.len() {
            return None;
        }
        let shape = self.shapes.remove(index as usize);
        self.mark_modified();
        Some(shape)
    }

    /// Move a shape by an offset
    pub fn translate_shape(&mut self, index: ShapeIndex, offset: Vec2) {
        if let Some(shape) = self.shapes.get_mut(index as usize) {
            shape.translate(offset);
            self.mark_modified();
        }
    }

    /// Rotate a shape around a pivot by degrees
    pub fn rotate_shape(&mut self, index: ShapeIndex, degrees: f32, pivot: Vec2) {
        if let Some(shape) = self.shapes.get_mut(index as usize) {
            shape.rotate(degrees, pivot);
            self.mark_modified();
        }
    }

    /// Apply a scale delta to a shape around a pivot
    pub fn scale_shape(&mut self, index: ShapeIndex, delta: f32, pivot: Vec2) {
        if let Some(shape) = self.shapes.get_mut(index as usize) {
            shape.scale_by(delta, pivot);
            self.mark_modified();
        }
    }

    fn mark_modified(&mut self) {
        self.modified = true;
        self.accelerators_stale = true;
    }

    /// Rebuild both trees over the current shape list
    ///
    /// The bounding-box tree depth follows the shape-count heuristic; the
    /// quadtree depth is fixed per scene.
    pub fn rebuild_accelerators(&mut self) {
        let depth = bvh_depth_for(self.shapes.len());
        self.bvh.build(&self.shapes, depth, self.world_bounds);
        self.quadtree.build(&self.shapes, self.quadtree_depth, self.world_bounds);
        self.accelerators_stale = false;
        log::debug!(
            "rebuilt accelerators: {} shapes, bvh depth {}, quadtree depth {}",
            self.shapes.len(),
            depth,
            self.quadtree_depth
        );
    }

    /// Whether the trees are out of date with respect to the shape list
    pub fn accelerators_stale(&self) -> bool {
        self.accelerators_stale
    }

    /// Nearest impact of a ray using the chosen strategy
    ///
    /// Tree strategies require fresh accelerators; querying stale trees is a
    /// caller bug.
    pub fn query_ray(&self, ray: &Ray2, strategy: RayQueryStrategy) -> Option<RayHit2> {
        match strategy {
            RayQueryStrategy::BruteForce => raycast::cast_all_shapes(&self.shapes, ray, BroadPhase::None),
            RayQueryStrategy::DiscReject => raycast::cast_all_shapes(&self.shapes, ray, BroadPhase::Disc),
            RayQueryStrategy::BoxReject => raycast::cast_all_shapes(&self.shapes, ray, BroadPhase::Box),
            RayQueryStrategy::QuadTree => {
                debug_assert!(!self.accelerators_stale, "quadtree queried after mutation without rebuild");
                let mut candidates = Vec::new();
                self.quadtree.query_ray(ray, &mut candidates);
                raycast::cast_candidates(&self.shapes, &candidates, ray)
            }
            RayQueryStrategy::BvhTree => {
                debug_assert!(!self.accelerators_stale, "bvh queried after mutation without rebuild");
                let mut candidates = Vec::new();
                self.bvh.query_ray(ray, &mut candidates);
                raycast::cast_candidates(&self.shapes, &candidates, ray)
            }
        }
    }

    /// Candidate shapes along a ray from the chosen tree, without the narrow
    /// phase (for debug overlays)
    pub fn query_ray_candidates(&self, ray: &Ray2, strategy: RayQueryStrategy) -> Vec<ShapeIndex> {
        let mut candidates = Vec::new();
        match strategy {
            RayQueryStrategy::QuadTree => self.quadtree.query_ray(ray, &mut candidates),
            RayQueryStrategy::BvhTree => self.bvh.query_ray(ray, &mut candidates),
            _ => candidates.extend(0..self.shapes.len() as ShapeIndex),
        }
        candidates
    }

    /// Serialize the scene to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CodecError> {
        codec::save_scene(self, path)
    }

    /// Deserialize a scene from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CodecError> {
        codec::load_scene(path)
    }

    /// Replace this scene with the contents of a file
    ///
    /// On error the current scene is left untouched.
    pub fn load_in_place<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CodecError> {
        *self = Self::load(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_scene() -> Scene {
        let mut scene = Scene::new(Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0)));
        scene.add_shape(ConvexShape::from_vertices(vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(15.0, 20.0),
        ]));
        scene.add_shape(ConvexShape::from_vertices(vec![
            Vec2::new(100.0, 40.0),
            Vec2::new(120.0, 40.0),
            Vec2::new(110.0, 60.0),
        ]));
        scene
    }

    #[test]
    fn test_mutation_marks_scene_modified_and_trees_stale() {
        let mut scene = small_scene();
        scene.rebuild_accelerators();
        assert!(!scene.accelerators_stale());

        scene.translate_shape(0, Vec2::new(1.0, 0.0));
        assert!(scene.is_modified());
        assert!(scene.accelerators_stale());

        scene.rebuild_accelerators();
        assert!(!scene.accelerators_stale());
        assert!(scene.is_modified(), "rebuild does not clear the modified flag");
    }

    #[test]
    fn test_remove_shape_shifts_indices() {
        let mut scene = small_scene();
        let removed = scene.remove_shape(0).expect("index 0 exists");
        assert!(removed.contains_point(Vec2::new(15.0, 13.0)));
        assert_eq!(scene.shape_count(), 1);
        assert!(scene.shape(0).is_some());
        assert!(scene.shape(1).is_none());
    }

    #[test]
    fn test_query_after_rebuild_sees_moved_shape() {
        let mut scene = small_scene();
        scene.rebuild_accelerators();

        // Move the second triangle out of the ray's path and rebuild
        scene.translate_shape(1, Vec2::new(0.0, 30.0));
        scene.rebuild_accelerators();

        let ray = Ray2::from_segment(Vec2::new(100.0, 45.0), Vec2::new(130.0, 45.0));
        assert!(scene.query_ray(&ray, RayQueryStrategy::BvhTree).is_none());
    }
}
