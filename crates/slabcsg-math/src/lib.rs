#![warn(missing_docs)]

//! Math types for the slabcsg geometry builder.
//!
//! Thin wrappers around nalgebra providing the points, vectors and
//! directions used to place planes, plus the [`Frame`] a component is
//! built in and the tolerance used to compare surfaces.

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A right-handed local coordinate frame.
///
/// Components are built in their own frame: Y runs along the beam,
/// X across the slab width and Z up the slab height. The frame is
/// supplied by whatever positions the component in the wider assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Local origin in global coordinates.
    pub origin: Point3,
    /// Local X axis (transverse, width).
    pub x_axis: Dir3,
    /// Local Y axis (beam direction).
    pub y_axis: Dir3,
    /// Local Z axis (transverse, height).
    pub z_axis: Dir3,
}

impl Frame {
    /// Frame from an origin and the X/Y axes. Z completes a right-handed set
    /// and Y is re-orthogonalised against X.
    pub fn new(origin: Point3, x_axis: Vec3, y_axis: Vec3) -> Self {
        let x = Dir3::new_normalize(x_axis);
        let z = Dir3::new_normalize(x.as_ref().cross(&y_axis));
        let y = Dir3::new_normalize(z.as_ref().cross(x.as_ref()));
        Self {
            origin,
            x_axis: x,
            y_axis: y,
            z_axis: z,
        }
    }

    /// The global frame.
    pub fn world() -> Self {
        Self::new(Point3::origin(), Vec3::x(), Vec3::y())
    }

    /// Convert local coordinates to a global point.
    pub fn point(&self, x: f64, y: f64, z: f64) -> Point3 {
        self.origin + x * self.x_axis.as_ref() + y * self.y_axis.as_ref() + z * self.z_axis.as_ref()
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two directions point the same way.
    pub fn dirs_equal(&self, a: &Dir3, b: &Dir3) -> bool {
        a.as_ref().dot(b.as_ref()) > 1.0 - self.angular
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_frame_is_identity() {
        let f = Frame::world();
        let p = f.point(1.0, 2.0, 3.0);
        assert!((p - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn test_frame_right_handed() {
        // Beam along global X, width along global -Y.
        let f = Frame::new(Point3::new(5.0, 0.0, 0.0), -Vec3::y(), Vec3::x());
        assert!((f.z_axis.as_ref() - Vec3::z()).norm() < 1e-12);
        let p = f.point(1.0, 2.0, 0.0);
        assert!((p - Point3::new(7.0, -1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_tolerance_dirs() {
        let tol = Tolerance::DEFAULT;
        let a = Dir3::new_normalize(Vec3::x());
        let b = Dir3::new_normalize(Vec3::new(1.0, 1e-12, 0.0));
        assert!(tol.dirs_equal(&a, &b));
        assert!(!tol.dirs_equal(&a, &Dir3::new_normalize(-Vec3::x())));
    }
}
