//! Math utilities and types
//!
//! Provides the fundamental math types for 2D geometry and spatial queries.

pub use nalgebra::{Matrix2, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Build a vector from a polar angle in degrees and a length
    pub fn from_polar_degrees(degrees: f32, length: f32) -> Vec2 {
        let radians = deg_to_rad(degrees);
        Vec2::new(radians.cos() * length, radians.sin() * length)
    }

    /// Rotate a vector counter-clockwise by an angle in degrees
    pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
        let radians = deg_to_rad(degrees);
        let (sin, cos) = radians.sin_cos();
        Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    }

    /// Rotate a point counter-clockwise around a pivot by an angle in degrees
    pub fn rotate_about(point: Vec2, pivot: Vec2, degrees: f32) -> Vec2 {
        pivot + rotate_degrees(point - pivot, degrees)
    }

    /// Rotate a vector 90 degrees counter-clockwise
    pub fn rotate_90(v: Vec2) -> Vec2 {
        Vec2::new(-v.y, v.x)
    }

    /// Rotate a vector 90 degrees clockwise
    pub fn rotate_minus_90(v: Vec2) -> Vec2 {
        Vec2::new(v.y, -v.x)
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotate_degrees_quarter_turn() {
        let v = rotate_degrees(Vec2::new(1.0, 0.0), 90.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotate_about_pivot() {
        let p = rotate_about(Vec2::new(2.0, 1.0), Vec2::new(1.0, 1.0), 180.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_from_polar_degrees() {
        let v = from_polar_degrees(60.0, 2.0);
        assert_relative_eq!(v.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 3.0f32.sqrt(), epsilon = 1e-6);
    }
}
