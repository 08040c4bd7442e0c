use nalgebra::{Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// A 4x4 transformation acting on column vectors (`p' = M * p`).
///
/// Used both for affine scene transforms and for the camera's combined
/// view-projection matrix, so points can also be pushed through with their
/// homogeneous `w` preserved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub matrix: Matrix4<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Build from row-major entries, the layout matrices are usually written in.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut matrix = Matrix4::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                matrix[(r, c)] = *v;
            }
        }
        Self { matrix }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vector3::new(dx, dy, dz)),
        }
    }

    pub fn scaling(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)),
        }
    }

    pub fn uniform_scaling(s: f64) -> Self {
        Self::scaling(s, s, s)
    }

    /// Rotation around the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        Self::rotation_axis_angle(&Vec3::X, angle)
    }

    /// Rotation around the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        Self::rotation_axis_angle(&Vec3::Y, angle)
    }

    /// Rotation around the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        Self::rotation_axis_angle(&Vec3::Z, angle)
    }

    /// Rotation around an arbitrary axis (need not be unit length).
    pub fn rotation_axis_angle(axis: &Vec3, angle: f64) -> Self {
        let scaled = match axis.normalized() {
            Some(n) => Vector3::new(n.x, n.y, n.z) * angle,
            None => Vector3::zeros(),
        };
        Self {
            matrix: Matrix4::new_rotation(scaled),
        }
    }

    /// Right-handed perspective projection looking down -Z with clip depth
    /// mapped to `[0, 1]`.
    pub fn perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (fov_y * 0.5).tan();
        let range = near - far;
        Self::from_rows([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, far / range, near * far / range],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Compose: apply `self` first, then `other`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    /// Transform a point, dividing through by `w` when it is not 1.
    pub fn transform_point(&self, p: &Point3d) -> Point3d {
        let [x, y, z, w] = self.transform_homogeneous(p);
        if w != 0.0 && w != 1.0 {
            Point3d::new(x / w, y / w, z / w)
        } else {
            Point3d::new(x, y, z)
        }
    }

    /// Transform a point and return the raw homogeneous result `[x, y, z, w]`.
    pub fn transform_homogeneous(&self, p: &Point3d) -> [f64; 4] {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        [v.x, v.y, v.z, v.w]
    }

    /// Transform a direction (ignores translation).
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    pub fn inverse(&self) -> Option<Transform> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// `(M^-1)^T`, the matrix that carries plane coefficients along with `M`.
    pub fn inverse_transpose(&self) -> Option<Matrix4<f64>> {
        self.matrix.try_inverse().map(|inv| inv.transpose())
    }

    /// Row `r` of the matrix as `[m_r0, m_r1, m_r2, m_r3]`.
    pub fn row(&self, r: usize) -> [f64; 4] {
        [
            self.matrix[(r, 0)],
            self.matrix[(r, 1)],
            self.matrix[(r, 2)],
            self.matrix[(r, 3)],
        ]
    }

    pub fn is_identity(&self, eps: f64) -> bool {
        self.matrix.is_identity(eps)
    }
}
