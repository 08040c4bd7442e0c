pub mod config;
pub mod geometry;
pub mod types;

pub use config::*;
pub use types::*;

use std::collections::HashSet;

use tracing::{info, instrument};

use crate::mesh::{Edge, EdgeId, Mesh, TriangleId, VertexId};

/// Mesh invariant checker.
///
/// Runs checks at increasing levels:
/// - **Topology**: index ranges, wireframe derived from triangle sides,
///   texture coordinate count, pending removals.
/// - **Geometry**: finite positions and degenerate triangles.
pub struct MeshValidator {
    config: ValidationConfig,
}

impl MeshValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a mesh, returning a unified report.
    #[instrument(skip(self, mesh), fields(vertices = mesh.positions().len(), triangles = mesh.triangles().len()))]
    pub fn validate(&self, mesh: &Mesh) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut metrics = ValidationMetrics {
            entity_counts: compute_entity_counts(mesh),
            ..Default::default()
        };

        self.check_topology(mesh, &mut errors, &mut warnings);
        let mut level_completed = ValidationLevel::Topology;

        if self.config.level >= ValidationLevel::Geometry {
            geometry::check_geometry(mesh, &self.config, &mut warnings, &mut metrics);
            level_completed = ValidationLevel::Geometry;
        }

        let valid = errors.is_empty();

        info!(
            valid,
            level = ?level_completed,
            error_count = errors.len(),
            warning_count = warnings.len(),
            "validation complete"
        );

        ValidationReport {
            valid,
            level_completed,
            errors,
            warnings,
            metrics,
        }
    }

    fn check_topology(
        &self,
        mesh: &Mesh,
        errors: &mut Vec<ValidationError>,
        warnings: &mut Vec<ValidationError>,
    ) {
        let vertex_count = mesh.positions().len();
        let mut pending = 0usize;

        for (i, tri) in mesh.triangles().iter().enumerate() {
            if tri[0].is_sentinel() {
                pending += 1;
                continue;
            }
            for v in tri.iter().filter(|v| v.index() >= vertex_count) {
                errors.push(ValidationError {
                    entity_id: EntityId::Triangle(TriangleId(i as u32)),
                    code: ErrorCode::IndexOutOfRange,
                    message: format!("References {v} but the mesh has {vertex_count} vertices"),
                    severity: Severity::Error,
                    numeric_value: None,
                    tolerance: None,
                });
            }
        }

        if pending > 0 {
            warnings.push(ValidationError {
                entity_id: EntityId::Mesh,
                code: ErrorCode::PendingRemoval,
                message: format!("{pending} triangles marked for removal"),
                severity: Severity::Warning,
                numeric_value: Some(pending as f64),
                tolerance: None,
            });
        }

        if let Some(uvs) = mesh.uvs() {
            if uvs.len() != vertex_count {
                errors.push(ValidationError {
                    entity_id: EntityId::Mesh,
                    code: ErrorCode::UvCountMismatch,
                    message: format!("{} texture coordinates for {vertex_count} vertices", uvs.len()),
                    severity: Severity::Error,
                    numeric_value: Some(uvs.len() as f64),
                    tolerance: None,
                });
            }
        }

        // Between a mark pass and compaction the wireframe may still carry
        // sides of the marked triangles.
        if self.config.check_wireframe && pending == 0 {
            check_wireframe(mesh, errors);
        }
    }
}

fn check_wireframe(mesh: &Mesh, errors: &mut Vec<ValidationError>) {
    let vertex_count = mesh.positions().len();
    let sides: HashSet<Edge> = mesh
        .triangles()
        .iter()
        .flat_map(|t| [Edge::new(t[0], t[1]), Edge::new(t[1], t[2]), Edge::new(t[2], t[0])])
        .collect();

    let mut listed = HashSet::new();
    for (i, pair) in mesh.wireframe().iter().enumerate() {
        let id = EntityId::Edge(EdgeId(i as u32));
        let edge = Edge::from(*pair);
        if pair.iter().any(|v| v.index() >= vertex_count) || !sides.contains(&edge) {
            errors.push(ValidationError {
                entity_id: id,
                code: ErrorCode::DanglingWireframe,
                message: format!("Edge {}-{} is not a triangle side", pair[0], pair[1]),
                severity: Severity::Error,
                numeric_value: None,
                tolerance: None,
            });
        }
        if !listed.insert(edge) {
            errors.push(ValidationError {
                entity_id: id,
                code: ErrorCode::DuplicateWireframeEdge,
                message: format!("Edge {}-{} listed twice", pair[0], pair[1]),
                severity: Severity::Error,
                numeric_value: None,
                tolerance: None,
            });
        }
    }

    let mut missing: Vec<Edge> = sides.difference(&listed).copied().collect();
    missing.sort();
    for edge in missing {
        let (a, b) = edge.vertices();
        errors.push(ValidationError {
            entity_id: EntityId::Vertex(a),
            code: ErrorCode::WireframeNotDerived,
            message: format!("Triangle side {a}-{b} has no wireframe entry"),
            severity: Severity::Error,
            numeric_value: None,
            tolerance: None,
        });
    }
}

fn compute_entity_counts(mesh: &Mesh) -> EntityCounts {
    let mut referenced = vec![false; mesh.positions().len()];
    let mut live = 0;
    for tri in mesh.triangles().iter().filter(|t| !t[0].is_sentinel()) {
        live += 1;
        for v in tri {
            if let Some(slot) = referenced.get_mut(v.index()) {
                *slot = true;
            }
        }
    }
    EntityCounts {
        vertices: mesh.positions().len(),
        triangles: mesh.triangles().len(),
        live_triangles: live,
        edges: mesh.wireframe().len(),
        unreferenced_vertices: referenced.iter().filter(|r| !**r).count(),
    }
}

/// Every vertex referenced by a live triangle, in ascending order.
pub fn referenced_vertices(mesh: &Mesh) -> Vec<VertexId> {
    let mut ids: Vec<VertexId> = mesh
        .triangles()
        .iter()
        .filter(|t| !t[0].is_sentinel())
        .flatten()
        .copied()
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::{Point2d, Point3d};
    use crate::mesh::fixtures::{grid, quad};

    #[test]
    fn test_fresh_mesh_is_valid() {
        let report = grid(3).validate();
        assert!(report.valid, "{report}");
        assert_eq!(report.level_completed, ValidationLevel::Topology);
        assert_eq!(report.metrics.entity_counts.unreferenced_vertices, 0);
    }

    #[test]
    fn test_pending_removal_is_warning() {
        let mut mesh = grid(2);
        mesh.mark_triangles(&[TriangleId(0)]).unwrap();
        let report = mesh.validate();
        assert!(report.valid, "{report}");
        assert_eq!(report.warnings_of(ErrorCode::PendingRemoval).len(), 1);
        assert_eq!(report.metrics.entity_counts.live_triangles, mesh.triangles().len() - 1);
    }

    #[test]
    fn test_dangling_wireframe_detected() {
        let mut mesh = quad();
        mesh.wireframe.push([VertexId(0), VertexId(9)]);
        let report = mesh.validate();
        assert!(!report.valid);
        assert_eq!(report.errors_of(ErrorCode::DanglingWireframe).len(), 1);
    }

    #[test]
    fn test_duplicate_and_missing_wireframe() {
        let mut mesh = quad();
        let first = mesh.wireframe[0];
        mesh.wireframe[1] = [first[1], first[0]];
        let report = mesh.validate();
        assert_eq!(report.errors_of(ErrorCode::DuplicateWireframeEdge).len(), 1);
        assert_eq!(report.errors_of(ErrorCode::WireframeNotDerived).len(), 1);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut mesh = quad();
        mesh.triangles[0][2] = VertexId(40);
        let report = MeshValidator::new(ValidationConfig::full()).validate(&mesh);
        assert!(!report.no_errors_of(ErrorCode::IndexOutOfRange));
        assert_eq!(report.level_completed, ValidationLevel::Geometry);
    }

    #[test]
    fn test_uv_mismatch() {
        let mut mesh = quad();
        mesh.uvs = Some(vec![Point2d::new(0.0, 0.0)]);
        let report = mesh.validate();
        assert_eq!(report.errors_of(ErrorCode::UvCountMismatch).len(), 1);
    }

    #[test]
    fn test_referenced_vertices_skips_orphans() {
        let mut mesh = quad();
        mesh.add_vertex(Point3d::new(5.0, 5.0, 5.0), None).unwrap();
        let ids = referenced_vertices(&mesh);
        assert_eq!(ids.len(), 4);
        let report = mesh.validate();
        assert!(report.valid);
        assert_eq!(report.metrics.entity_counts.unreferenced_vertices, 1);
    }
}
