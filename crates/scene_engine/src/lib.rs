//! # Scene Engine
//!
//! A 2D convex-shape scene with ray acceleration and binary persistence.
//!
//! ## Features
//!
//! - **Dual-representation shapes**: every convex polygon carries both its
//!   vertex loop and its half-plane hull, kept in sync through edits
//! - **Two accelerators**: a bounding-volume tree with alternating-axis
//!   splits and a region quadtree over fixed quadrants, both flat-array
//!   complete trees with iterative traversal
//! - **Five interchangeable ray strategies**: brute force, disc rejection,
//!   box rejection, quadtree, and BVH, all returning identical hits
//! - **Chunked binary persistence**: versioned container with a table of
//!   contents, per-chunk endianness, a corruption-detecting checksum, and
//!   byte-exact passthrough of unrecognized chunk types
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! let world = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
//! let mut scene = Scene::new(world);
//! scene.add_shape(ConvexShape::from_vertices(vec![
//!     Vec2::new(40.0, 40.0),
//!     Vec2::new(60.0, 40.0),
//!     Vec2::new(50.0, 60.0),
//! ]));
//! scene.rebuild_accelerators();
//!
//! let ray = Ray2::from_segment(Vec2::new(0.0, 45.0), Vec2::new(200.0, 45.0));
//! let hit = scene.query_ray(&ray, RayQueryStrategy::BvhTree);
//! assert!(hit.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod codec;
pub mod config;
pub mod foundation;
pub mod geometry;
pub mod raycast;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::codec::CodecError;
    pub use crate::config::SceneEngineConfig;
    pub use crate::foundation::math::Vec2;
    pub use crate::geometry::{Aabb2, BoundingDisc, BroadPhase, ConvexHull, ConvexPolygon, ConvexShape, Plane2, Ray2, RayHit2};
    pub use crate::raycast::{RayBatchStats, RayQueryStrategy};
    pub use crate::scene::Scene;
    pub use crate::spatial::{AabbTree, RegionQuadTree, ShapeIndex};
}
