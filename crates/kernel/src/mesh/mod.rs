//! Indexed triangle mesh with a derived wireframe.
//!
//! Positions are addressed by [`VertexId`] handles, triangles by
//! [`TriangleId`] and wireframe edges by [`EdgeId`]. Every accessor checks
//! its handle, so a stale or out-of-range id is reported instead of read.
//!
//! The wireframe is a derived view: it always holds exactly one entry per
//! distinct unordered vertex pair used by a triangle side, in first-seen
//! order. Every edit that changes triangles keeps it that way.

pub mod hole;
pub mod query;
pub mod tangents;
pub mod topology;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::transform::Transform;
use crate::geometry::vector::Vec3;
use crate::validation::{MeshValidator, ValidationConfig, ValidationReport};

pub use hole::HoleReport;
pub use query::{ProximityHit, ScreenHit, SweepHit, SweptSphere, TriangleHit, nearest_point_in_triangle};
pub use tangents::TangentReport;
pub use topology::{Compaction, WeldReport};

/// Handle of a position in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Marks a triangle slot as pending removal. Never a valid position.
    pub const SENTINEL: VertexId = VertexId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }

    pub(crate) fn from_index(i: usize) -> Self {
        VertexId(i as u32)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle of a triangle (position in the triangle list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriangleId(pub u32);

impl TriangleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a wireframe edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unordered vertex pair; `Edge::new(a, b) == Edge::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    a: VertexId,
    b: VertexId,
}

impl Edge {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }

    /// Endpoints, smaller id first.
    pub fn vertices(&self) -> (VertexId, VertexId) {
        (self.a, self.b)
    }
}

impl From<[VertexId; 2]> for Edge {
    fn from(pair: [VertexId; 2]) -> Self {
        Edge::new(pair[0], pair[1])
    }
}

/// Rejected mesh operations. The mesh is left unmodified whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("vertex {id} out of range (vertex count {count})")]
    VertexOutOfRange { id: u32, count: usize },

    #[error("triangle {id} out of range (triangle count {count})")]
    TriangleOutOfRange { id: u32, count: usize },

    #[error("edge {id} out of range (edge count {count})")]
    EdgeOutOfRange { id: u32, count: usize },

    #[error("triangle index buffer length {len} is not a multiple of 3")]
    TriangleStride { len: usize },

    #[error("{uvs} texture coordinates for {vertices} vertices")]
    UvCountMismatch { uvs: usize, vertices: usize },

    #[error("mesh has no texture coordinates")]
    MissingTexCoords,

    #[error("too many vertices for 32-bit ids: {count}")]
    TooManyVertices { count: usize },

    #[error("cutting transform is not invertible")]
    SingularTransform,

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// An indexed triangle mesh owned by one editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub(crate) positions: Vec<Point3d>,
    pub(crate) triangles: Vec<[VertexId; 3]>,
    pub(crate) wireframe: Vec<[VertexId; 2]>,
    pub(crate) uvs: Option<Vec<Point2d>>,
    pub(crate) tangents: Vec<Vec3>,
    pub(crate) binormals: Vec<Vec3>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import loader buffers: positions, a flat stride-3 index list and
    /// optional per-vertex texture coordinates. The wireframe is derived.
    pub fn from_buffers(
        positions: Vec<Point3d>,
        triangle_indices: &[u32],
        uvs: Option<Vec<Point2d>>,
    ) -> Result<Self, MeshError> {
        if triangle_indices.len() % 3 != 0 {
            return Err(MeshError::TriangleStride {
                len: triangle_indices.len(),
            });
        }
        if positions.len() >= u32::MAX as usize {
            return Err(MeshError::TooManyVertices {
                count: positions.len(),
            });
        }
        if let Some(uvs) = &uvs {
            if uvs.len() != positions.len() {
                return Err(MeshError::UvCountMismatch {
                    uvs: uvs.len(),
                    vertices: positions.len(),
                });
            }
        }
        if let Some(&id) = triangle_indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::VertexOutOfRange {
                id,
                count: positions.len(),
            });
        }

        let triangles: Vec<[VertexId; 3]> = triangle_indices
            .chunks_exact(3)
            .map(|c| [VertexId(c[0]), VertexId(c[1]), VertexId(c[2])])
            .collect();
        let wireframe = derive_wireframe(&triangles);

        Ok(Self {
            positions,
            triangles,
            wireframe,
            uvs,
            tangents: Vec::new(),
            binormals: Vec::new(),
        })
    }

    /// Convenience constructor from index triples.
    pub fn from_triangles(positions: Vec<Point3d>, triangles: &[[u32; 3]]) -> Result<Self, MeshError> {
        let flat: Vec<u32> = triangles.iter().flatten().copied().collect();
        Self::from_buffers(positions, &flat, None)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.wireframe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn positions(&self) -> &[Point3d] {
        &self.positions
    }

    pub fn triangles(&self) -> &[[VertexId; 3]] {
        &self.triangles
    }

    pub fn wireframe(&self) -> &[[VertexId; 2]] {
        &self.wireframe
    }

    pub fn uvs(&self) -> Option<&[Point2d]> {
        self.uvs.as_deref()
    }

    /// Per-vertex tangents; empty until
    /// [`compute_tangents_and_binormals`](Self::compute_tangents_and_binormals)
    /// runs, and cleared by any edit that changes the vertex list.
    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    pub fn binormals(&self) -> &[Vec3] {
        &self.binormals
    }

    /// Replace the texture coordinates (one per vertex).
    pub fn set_uvs(&mut self, uvs: Vec<Point2d>) -> Result<(), MeshError> {
        if uvs.len() != self.positions.len() {
            return Err(MeshError::UvCountMismatch {
                uvs: uvs.len(),
                vertices: self.positions.len(),
            });
        }
        self.uvs = Some(uvs);
        Ok(())
    }

    pub fn position(&self, id: VertexId) -> Option<Point3d> {
        self.positions.get(id.index()).copied()
    }

    /// Vertex ids of a live triangle; `None` for out-of-range or pending
    /// removal.
    pub fn triangle(&self, id: TriangleId) -> Option<[VertexId; 3]> {
        self.triangles
            .get(id.index())
            .copied()
            .filter(|tri| !tri[0].is_sentinel())
    }

    pub fn edge(&self, id: EdgeId) -> Option<[VertexId; 2]> {
        self.wireframe.get(id.index()).copied()
    }

    /// Corner positions of a triangle, optionally pushed through `transform`.
    pub fn triangle_positions(&self, id: TriangleId, transform: Option<&Transform>) -> Option<[Point3d; 3]> {
        let tri = self.triangle(id)?;
        let pts = self.corners(&tri);
        Some(match transform {
            Some(m) => pts.map(|p| m.transform_point(&p)),
            None => pts,
        })
    }

    /// Wireframe entry connecting `a` and `b`, in either order.
    pub fn edge_id_for_vertices(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let key = Edge::new(a, b);
        self.wireframe
            .iter()
            .position(|pair| Edge::from(*pair) == key)
            .map(|i| EdgeId(i as u32))
    }

    /// True between a mark pass and the following [`compact`](Self::compact).
    pub fn has_pending_removals(&self) -> bool {
        self.triangles.iter().any(|tri| tri[0].is_sentinel())
    }

    /// Positions as a flat `f32` array for the graphics device.
    pub fn position_buffer(&self) -> Vec<f32> {
        self.positions
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect()
    }

    /// Live triangles as a flat stride-3 index array.
    pub fn index_buffer(&self) -> Vec<u32> {
        self.live_triangles()
            .flat_map(|(_, tri)| tri.map(|v| v.0))
            .collect()
    }

    /// Wireframe as a flat stride-2 index array.
    pub fn wireframe_buffer(&self) -> Vec<u32> {
        self.wireframe.iter().flat_map(|e| e.map(|v| v.0)).collect()
    }

    /// Run the default validator over the mesh.
    pub fn validate(&self) -> ValidationReport {
        MeshValidator::new(ValidationConfig::default()).validate(self)
    }

    // ── Internal helpers ───────────────────────────────────────────────

    pub(crate) fn check_vertex(&self, id: VertexId) -> Result<(), MeshError> {
        if id.index() < self.positions.len() {
            Ok(())
        } else {
            Err(MeshError::VertexOutOfRange {
                id: id.0,
                count: self.positions.len(),
            })
        }
    }

    pub(crate) fn check_triangle(&self, id: TriangleId) -> Result<(), MeshError> {
        if id.index() < self.triangles.len() {
            Ok(())
        } else {
            Err(MeshError::TriangleOutOfRange {
                id: id.0,
                count: self.triangles.len(),
            })
        }
    }

    pub(crate) fn check_edge(&self, id: EdgeId) -> Result<(), MeshError> {
        if id.index() < self.wireframe.len() {
            Ok(())
        } else {
            Err(MeshError::EdgeOutOfRange {
                id: id.0,
                count: self.wireframe.len(),
            })
        }
    }

    /// Triangles not pending removal, with their ids.
    pub(crate) fn live_triangles(&self) -> impl Iterator<Item = (TriangleId, &[VertexId; 3])> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, tri)| !tri[0].is_sentinel())
            .map(|(i, tri)| (TriangleId(i as u32), tri))
    }

    /// Corner positions of a live triangle whose ids are known to be valid.
    pub(crate) fn corners(&self, tri: &[VertexId; 3]) -> [Point3d; 3] {
        tri.map(|v| self.positions[v.index()])
    }

    pub(crate) fn clear_frames(&mut self) {
        self.tangents.clear();
        self.binormals.clear();
    }
}

/// One wireframe entry per distinct triangle side, first-seen order.
pub(crate) fn derive_wireframe(triangles: &[[VertexId; 3]]) -> Vec<[VertexId; 2]> {
    let mut seen = HashSet::new();
    let mut wireframe = Vec::new();
    for tri in triangles.iter().filter(|t| !t[0].is_sentinel()) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if seen.insert(Edge::new(a, b)) {
                wireframe.push([a, b]);
            }
        }
    }
    wireframe
}


#[cfg(test)]
mod tests {
    use super::fixtures::quad;
    use super::*;

    #[test]
    fn test_from_buffers_rejects_bad_stride() {
        let err = Mesh::from_buffers(vec![Point3d::ORIGIN; 3], &[0, 1], None).unwrap_err();
        assert_eq!(err, MeshError::TriangleStride { len: 2 });
    }

    #[test]
    fn test_from_buffers_rejects_out_of_range() {
        let err = Mesh::from_buffers(vec![Point3d::ORIGIN; 3], &[0, 1, 3], None).unwrap_err();
        assert_eq!(err, MeshError::VertexOutOfRange { id: 3, count: 3 });
    }

    #[test]
    fn test_from_buffers_rejects_uv_mismatch() {
        let err = Mesh::from_buffers(vec![Point3d::ORIGIN; 3], &[0, 1, 2], Some(vec![Point2d::ORIGIN; 2]))
            .unwrap_err();
        assert!(matches!(err, MeshError::UvCountMismatch { uvs: 2, vertices: 3 }));
    }

    #[test]
    fn test_wireframe_shares_diagonal_once() {
        let mesh = quad();
        assert_eq!(mesh.edge_count(), 5);
        assert!(mesh.edge_id_for_vertices(VertexId(2), VertexId(0)).is_some());
        assert!(mesh.edge_id_for_vertices(VertexId(1), VertexId(3)).is_none());
    }

    #[test]
    fn test_edge_is_unordered() {
        assert_eq!(Edge::new(VertexId(4), VertexId(1)), Edge::new(VertexId(1), VertexId(4)));
        assert_eq!(Edge::new(VertexId(4), VertexId(1)).vertices(), (VertexId(1), VertexId(4)));
    }

    #[test]
    fn test_checked_accessors() {
        let mesh = quad();
        assert_eq!(mesh.position(VertexId(2)), Some(Point3d::new(1.0, 1.0, 0.0)));
        assert_eq!(mesh.position(VertexId(4)), None);
        assert_eq!(mesh.triangle(TriangleId(1)), Some([VertexId(0), VertexId(2), VertexId(3)]));
        assert_eq!(mesh.triangle(TriangleId(2)), None);
        assert!(mesh.edge(EdgeId(5)).is_none());
    }

    #[test]
    fn test_triangle_positions_with_transform() {
        let mesh = quad();
        let t = Transform::translation(0.0, 0.0, 2.0);
        let pts = mesh.triangle_positions(TriangleId(0), Some(&t)).unwrap();
        assert!(pts.iter().all(|p| (p.z - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_raw_buffers() {
        let mesh = quad();
        assert_eq!(mesh.index_buffer(), vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.position_buffer().len(), 12);
        assert_eq!(mesh.wireframe_buffer().len(), 10);
    }

    #[test]
    fn test_fresh_mesh_validates() {
        let report = quad().validate();
        assert!(report.valid, "{report}");
    }
}
