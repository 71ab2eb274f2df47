//! 2D geometric primitives and the convex shape type
//!
//! Provides rays, bounding volumes, half-planes, and the dual-representation
//! convex polygon used throughout the scene and spatial modules.

pub mod convex;
pub mod plane;
pub mod primitives;

pub use convex::{BroadPhase, ConvexHull, ConvexPolygon, ConvexShape};
pub use plane::Plane2;
pub use primitives::{Aabb2, BoundingDisc, Ray2, RayHit2};
