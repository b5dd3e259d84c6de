#![warn(missing_docs)]

//! Geometry model for the slabcsg builder.
//!
//! Cells are described the way CSG transport codes expect them: as
//! boolean combinations of signed half-spaces bounded by surfaces. This
//! crate owns the surface table (planes only), the half-space rule
//! algebra, and the cell table that components write into.

use serde::{Deserialize, Serialize};
use slabcsg_math::{Dir3, Point3, Tolerance, Vec3};
use std::fmt;

pub mod error;
pub mod model;
pub mod rule;

pub use error::{GeomError, Result};
pub use model::{Cell, CellEdit, IdAllocator, Model};
pub use rule::{HalfSpace, HeadRule, Sense};

/// Identifier of a surface in a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a cell in a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Plane
// =============================================================================

/// An infinite plane defined by a point on it and a unit normal.
///
/// The positive half-space is the side the normal points into.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3,
    /// Unit normal.
    pub normal: Dir3,
}

impl Plane {
    /// Create a plane from origin and normal. The normal need not be normalized.
    pub fn new(origin: Point3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: Dir3::new_normalize(normal),
        }
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal.as_ref())
    }

    /// Distance of the plane from the global origin along its normal.
    pub fn offset(&self) -> f64 {
        self.origin.coords.dot(self.normal.as_ref())
    }

    /// Which half-space a point lies in. Points on the plane count as negative.
    pub fn side(&self, p: &Point3) -> Sense {
        if self.signed_distance(p) > 0.0 {
            Sense::Positive
        } else {
            Sense::Negative
        }
    }

    /// True if `other` is the same plane with the same orientation.
    pub fn is_coincident(&self, other: &Plane, tol: &Tolerance) -> bool {
        tol.dirs_equal(&self.normal, &other.normal) && tol.is_zero(self.signed_distance(&other.origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_signed_distance() {
        let p = Plane::new(Point3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
        assert!((p.signed_distance(&Point3::new(9.0, 5.0, -1.0)) - 3.0).abs() < 1e-12);
        assert!((p.offset() - 2.0).abs() < 1e-12);
        assert_eq!(p.side(&Point3::new(0.0, 1.0, 0.0)), Sense::Negative);
        assert_eq!(p.side(&Point3::new(0.0, 3.0, 0.0)), Sense::Positive);
    }

    #[test]
    fn test_plane_coincident() {
        let tol = Tolerance::DEFAULT;
        let a = Plane::new(Point3::new(0.0, 2.0, 0.0), Vec3::y());
        let b = Plane::new(Point3::new(4.0, 2.0, 7.0), Vec3::y());
        let flipped = Plane::new(Point3::new(0.0, 2.0, 0.0), -Vec3::y());
        let shifted = Plane::new(Point3::new(0.0, 2.1, 0.0), Vec3::y());
        assert!(a.is_coincident(&b, &tol));
        assert!(!a.is_coincident(&flipped, &tol));
        assert!(!a.is_coincident(&shifted, &tol));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(SurfaceId(1203).to_string(), "1203");
        assert_eq!(CellId(7).to_string(), "7");
    }
}
