//! Region quadtree over a fixed spatial subdivision
//!
//! Unlike the bounding-box tree, the subdivision is content-independent:
//! every node's bounds come from quartering its parent's box, and only the
//! deepest level holds shape memberships. A shape joins every leaf whose box
//! overlaps its bounding box, so it can appear in several leaves and queries
//! must deduplicate.

use std::collections::HashSet;

use crate::foundation::math::Vec2;
use crate::geometry::{Aabb2, ConvexShape, Ray2};
use crate::spatial::{first_child_index, next_sibling_up, node_count, parent_index, ShapeIndex, SpatialNode};

const BRANCHING: usize = 4;

/// Complete quaternary tree over fixed spatial quadrants
#[derive(Debug, Clone, Default)]
pub struct RegionQuadTree {
    nodes: Vec<SpatialNode>,
}

impl RegionQuadTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// The flat node array, root first
    pub fn nodes(&self) -> &[SpatialNode] {
        &self.nodes
    }

    /// Whether the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Restore a tree from its serialized node array
    pub(crate) fn from_parts(nodes: Vec<SpatialNode>) -> Self {
        Self { nodes }
    }

    /// Rebuild the tree over the given shapes
    ///
    /// Child order within a parent is bottom-left, bottom-right, top-left,
    /// top-right. Shape membership is assigned only at the deepest level, by
    /// bounding-box overlap.
    pub fn build(&mut self, shapes: &[ConvexShape], depth: usize, world_bounds: Aabb2) {
        self.nodes.clear();

        let total = node_count(BRANCHING, depth);
        if total == 0 {
            return;
        }
        self.nodes.resize_with(total, SpatialNode::default);
        self.nodes[0].bounds = world_bounds;

        let mut index = 1;
        for level in 1..depth {
            let nodes_in_level = BRANCHING.pow(level as u32);
            let is_leaf_level = level == depth - 1;

            for _ in 0..nodes_in_level {
                let parent = parent_index(index, BRANCHING);
                let quadrant = index - first_child_index(parent, BRANCHING);
                let parent_bounds = self.nodes[parent].bounds;
                self.nodes[index].bounds = quadrant_bounds(&parent_bounds, quadrant);

                if is_leaf_level {
                    let bounds = self.nodes[index].bounds;
                    self.nodes[index].shapes = shapes
                        .iter()
                        .enumerate()
                        .filter(|(_, shape)| shape.bounding_box().overlaps(&bounds))
                        .map(|(shape_index, _)| shape_index as ShapeIndex)
                        .collect();
                }
                index += 1;
            }
        }
    }

    /// Collect the shapes of every populated node whose box the ray reaches
    ///
    /// Mirrors the bounding-box tree walk with branching factor 4. Because a
    /// shape can live in several leaves, a per-query set keeps each shape in
    /// the result exactly once.
    pub fn query_ray(&self, ray: &Ray2, out: &mut Vec<ShapeIndex>) {
        let mut seen: HashSet<ShapeIndex> = HashSet::new();

        let mut index = 0;
        while index < self.nodes.len() {
            if self.nodes[index].bounds.intersect_ray(ray).is_some() {
                if !self.nodes[index].shapes.is_empty() {
                    for &shape in &self.nodes[index].shapes {
                        if seen.insert(shape) {
                            out.push(shape);
                        }
                    }
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

/// Bounds of one quadrant of a parent box
///
/// Quadrant order: 0 = bottom-left, 1 = bottom-right, 2 = top-left,
/// 3 = top-right.
fn quadrant_bounds(parent: &Aabb2, quadrant: usize) -> Aabb2 {
    let half = parent.dimensions() * 0.5;
    match quadrant {
        0 => Aabb2::new(parent.min, parent.min + half),
        1 => {
            let min = parent.min + Vec2::new(half.x, 0.0);
            Aabb2::new(min, min + half)
        }
        2 => {
            let min = parent.min + Vec2::new(0.0, half.y);
            Aabb2::new(min, min + half)
        }
        _ => Aabb2::new(parent.min + half, parent.max),
    }
}
