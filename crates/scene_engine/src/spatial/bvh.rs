//! Bounding-volume tree over axis-aligned boxes
//!
//! A complete binary tree built once per scene edit. Splits alternate axis by
//! level parity and partition shapes by bounding-disc center, so every shape
//! lands in exactly one node per level. Node bounds are then refitted tight
//! to the member vertices rather than halved geometrically.

use crate::geometry::{Aabb2, ConvexShape, Ray2};
use crate::spatial::{
    first_child_index, next_sibling_up, node_count, parent_index, ShapeIndex, SpatialNode,
};

const BRANCHING: usize = 2;

/// Complete binary tree of axis-aligned boxes for ray-range queries
#[derive(Debug, Clone, Default)]
pub struct AabbTree {
    nodes: Vec<SpatialNode>,
    first_leaf: usize,
}

impl AabbTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// The flat node array, root first
    pub fn nodes(&self) -> &[SpatialNode] {
        &self.nodes
    }

    /// Index of the first node of the deepest level
    ///
    /// Every node at or past this index is a leaf for traversal purposes.
    pub fn first_leaf(&self) -> usize {
        self.first_leaf
    }

    /// Whether the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Restore a tree from its serialized node array
    pub(crate) fn from_parts(nodes: Vec<SpatialNode>, first_leaf: usize) -> Self {
        Self { nodes, first_leaf }
    }

    /// Rebuild the tree over the given shapes
    ///
    /// The root holds every shape and the world bounds. Each level below the
    /// root splits its parent at the midpoint of the alternating axis: odd
    /// levels compare disc centers against the x midpoint (strictly less goes
    /// left), even levels against the y midpoint (greater-or-equal goes top).
    /// Saved files depend on this exact assignment, ties included.
    pub fn build(&mut self, shapes: &[ConvexShape], depth: usize, world_bounds: Aabb2) {
        self.nodes.clear();
        self.first_leaf = 0;

        let total = node_count(BRANCHING, depth);
        if total == 0 {
            return;
        }
        self.nodes.resize_with(total, SpatialNode::default);

        self.nodes[0].bounds = world_bounds;
        self.nodes[0].shapes = (0..shapes.len() as u16).collect();

        let mut index = 1;
        for level in 1..depth {
            if level == depth - 1 {
                self.first_leaf = index;
            }
            let nodes_in_level = BRANCHING.pow(level as u32);
            let vertical_split = level % 2 == 1;

            for _ in 0..nodes_in_level {
                let parent = parent_index(index, BRANCHING);
                let parent_bounds = self.nodes[parent].bounds;
                let is_left_child = index == first_child_index(parent, BRANCHING);

                let mut members = Vec::new();
                if vertical_split {
                    let pivot = (parent_bounds.min.x + parent_bounds.max.x) * 0.5;
                    for &shape in &self.nodes[parent].shapes {
                        let goes_left = shapes[shape as usize].bounding_disc().center.x < pivot;
                        if goes_left == is_left_child {
                            members.push(shape);
                        }
                    }
                } else {
                    let pivot = (parent_bounds.min.y + parent_bounds.max.y) * 0.5;
                    for &shape in &self.nodes[parent].shapes {
                        // Ties on the pivot go to the top child
                        let goes_top = shapes[shape as usize].bounding_disc().center.y >= pivot;
                        if goes_top == is_left_child {
                            members.push(shape);
                        }
                    }
                }

                self.nodes[index].bounds = tight_bounds(shapes, &members);
                self.nodes[index].shapes = members;
                index += 1;
            }
        }
    }

    /// Collect the shapes of every leaf whose box the ray reaches
    ///
    /// Iterative depth-first walk over the flat array: a missed box
    /// backtracks, a hit leaf collects and backtracks, a hit internal node
    /// descends into its first child (an out-of-range child index means the
    /// node acts as a leaf). The split policy puts each shape in exactly one
    /// leaf, so the result holds no duplicates.
    pub fn query_ray(&self, ray: &Ray2, out: &mut Vec<ShapeIndex>) {
        let mut index = 0;
        while index < self.nodes.len() {
            if self.nodes[index].bounds.intersect_ray(ray).is_some() {
                if index >= self.first_leaf {
                    out.extend_from_slice(&self.nodes[index].shapes);
                    match next_sibling_up(index, BRANCHING) {
                        Some(next) => index = next,
                        None => break,
                    }
                } else {
                    let child = first_child_index(index, BRANCHING);
                    if child >= self.nodes.len() {
                        match next_sibling_up(index, BRANCHING) {
                            Some(next) => index = next,
                            None => break,
                        }
                    } else {
                        index = child;
                    }
                }
            } else {
                match next_sibling_up(index, BRANCHING) {
                    Some(next) => index = next,
                    None => break,
                }
            }
        }
    }
}

/// Tight bounding box over the vertices of the listed shapes
fn tight_bounds(shapes: &[ConvexShape], members: &[ShapeIndex]) -> Aabb2 {
    if members.is_empty() {
        return Aabb2::empty_placeholder();
    }
    Aabb2::from_points(
        members
            .iter()
            .flat_map(|&index| shapes[index as usize].polygon().vertices()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::geometry::BroadPhase;
    use std::collections::HashSet;

    fn triangle_at(center: Vec2, radius: f32) -> ConvexShape {
        ConvexShape::from_vertices(vec![
            center + Vec2::new(radius, 0.0),
            center + Vec2::new(-radius * 0.5, radius),
            center + Vec2::new(-radius * 0.5, -radius),
        ])
    }

    fn grid_scene() -> (Vec<ConvexShape>, Aabb2) {
        let mut shapes = Vec::new();
        for row in 0..4 {
            for col in 0..8 {
                let center = Vec2::new(12.0 + col as f32 * 24.0, 12.0 + row as f32 * 24.0);
                shapes.push(triangle_at(center, 4.0));
            }
        }
        let world = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
        (shapes, world)
    }

    #[test]
    fn test_leaf_membership_partitions_shapes() {
        let (shapes, world) = grid_scene();
        let mut tree = AabbTree::new();
        tree.build(&shapes, 4, world);

        let mut seen = HashSet::new();
        for node in &tree.nodes()[tree.first_leaf()..] {
            for &shape in &node.shapes {
                assert!(seen.insert(shape), "shape {shape} appears in two leaves");
            }
        }
        assert_eq!(seen.len(), shapes.len(), "every shape must land in a leaf");
    }

    #[test]
    fn test_node_bounds_contain_member_vertices() {
        let (shapes, world) = grid_scene();
        let mut tree = AabbTree::new();
        tree.build(&shapes, 4, world);

        for node in tree.nodes() {
            for &shape in &node.shapes {
                for v in shapes[shape as usize].polygon().vertices() {
                    assert!(node.bounds.contains_point(*v));
                }
            }
        }
    }

    #[test]
    fn test_query_matches_brute_force_hits() {
        let (shapes, world) = grid_scene();
        let mut tree = AabbTree::new();
        tree.build(&shapes, 4, world);

        let rays = [
            Ray2::from_segment(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0)),
            Ray2::from_segment(Vec2::new(0.0, 12.0), Vec2::new(200.0, 12.0)),
            Ray2::from_segment(Vec2::new(100.0, 0.0), Vec2::new(100.0, 100.0)),
            Ray2::from_segment(Vec2::new(190.0, 90.0), Vec2::new(5.0, 5.0)),
        ];
        for ray in &rays {
            let mut candidates = Vec::new();
            tree.query_ray(ray, &mut candidates);
            let candidate_set: HashSet<_> = candidates.iter().copied().collect();
            assert_eq!(candidate_set.len(), candidates.len(), "candidates must be unique");

            for (index, shape) in shapes.iter().enumerate() {
                if shape.raycast(ray, BroadPhase::None).is_some() {
                    assert!(
                        candidate_set.contains(&(index as ShapeIndex)),
                        "tree query missed a shape the ray hits"
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_scene_builds_empty_tree() {
        let mut tree = AabbTree::new();
        tree.build(&[], 0, Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)));
        assert!(tree.is_empty());

        let ray = Ray2::from_segment(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let mut out = Vec::new();
        tree.query_ray(&ray, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_level_tree_collects_at_root() {
        let (shapes, world) = grid_scene();
        let mut tree = AabbTree::new();
        tree.build(&shapes, 1, world);
        assert_eq!(tree.first_leaf(), 0);

        let ray = Ray2::from_segment(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
        let mut out = Vec::new();
        tree.query_ray(&ray, &mut out);
        assert_eq!(out.len(), shapes.len());
    }
}
