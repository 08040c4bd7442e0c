use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// An oriented plane `normal · p + d = 0`, positive on the side the normal
/// points to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f64,
}

impl Plane {
    /// A plane every point is on the negative side of.
    pub const REJECT_ALL: Self = Self {
        normal: Vec3::ZERO,
        d: -1.0,
    };

    pub fn new(normal: Vec3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Plane through `origin` with the given (unit) normal.
    pub fn from_point_normal(origin: &Point3d, normal: Vec3) -> Self {
        Self {
            normal,
            d: -normal.dot(&origin.to_vec3()),
        }
    }

    /// Plane through three points, normal `(b - a) × (c - a)` normalized.
    /// `None` for collinear input.
    pub fn from_points(a: &Point3d, b: &Point3d, c: &Point3d) -> Option<Self> {
        let normal = (*b - *a).cross(&(*c - *a)).normalized()?;
        Some(Self::from_point_normal(a, normal))
    }

    /// Normalize raw `[a, b, c, d]` coefficients. `None` when the normal
    /// part vanishes.
    pub fn from_coefficients(coeffs: [f64; 4]) -> Option<Self> {
        let normal = Vec3::new(coeffs[0], coeffs[1], coeffs[2]);
        let len = normal.length();
        if len < 1e-15 || !len.is_finite() {
            return None;
        }
        Some(Self {
            normal: normal / len,
            d: coeffs[3] / len,
        })
    }

    pub fn to_coefficients(&self) -> [f64; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.d]
    }

    /// Signed distance (exact for unit normals).
    pub fn distance(&self, p: &Point3d) -> f64 {
        self.normal.dot(&p.to_vec3()) + self.d
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal * self.distance(p)
    }
}
