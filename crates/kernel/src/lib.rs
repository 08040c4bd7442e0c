pub mod geometry;
pub mod mesh;
pub mod boolean;
pub mod validation;
pub mod traits;

// Re-export the working types at crate root for convenience.
pub use boolean::{DropAxis, tri_minus_poly};
pub use geometry::aabb::AlignedBox;
pub use geometry::frustum::{Frustum, FrustumPlane};
pub use geometry::segment::Segment;
pub use mesh::{EdgeId, Mesh, MeshError, TriangleId, VertexId};
pub use traits::VolumeQuery;
pub use validation::{MeshValidator, ValidationConfig, ValidationReport};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Triangles with a smaller area are pruned and reported as degenerate.
    pub degenerate_area: f64,
    /// Squared length below which a triangle normal is treated as zero.
    pub normal_length_sq: f64,
    /// Squared length below which a tangent-frame axis is rejected.
    pub tangent_length_sq: f64,
    /// Texture coordinate differences smaller than this are treated as equal.
    pub uv: f64,
    /// Segments shorter than this have no usable direction.
    pub line: f64,
    /// Relative determinant below which a segment runs parallel to a plane.
    pub parallel: f64,
    /// `|direction . normal|` below which a sweep misses a triangle's plane.
    pub sweep_parallel: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            degenerate_area: 1e-6,
            normal_length_sq: 1e-7,
            tangent_length_sq: 1e-30,
            uv: 1e-6,
            line: 1e-5,
            parallel: 1e-12,
            sweep_parallel: 1e-4,
        }
    }
}

impl Tolerance {
    pub fn is_degenerate_area(&self, area: f64) -> bool {
        area.abs() < self.degenerate_area
    }
}

/// Default tolerances used by every geometric comparison in the crate.
pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
