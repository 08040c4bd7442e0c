//! Geometry level: finite positions and degenerate triangles.
//!
//! Both are warnings; the queries skip such elements and
//! `Mesh::prune_invalid_triangles` removes the triangles.

use super::config::ValidationConfig;
use super::types::*;
use crate::mesh::{Mesh, TriangleId, VertexId};

/// Run all geometry checks on a mesh.
pub fn check_geometry(
    mesh: &Mesh,
    config: &ValidationConfig,
    warnings: &mut Vec<ValidationError>,
    metrics: &mut ValidationMetrics,
) {
    check_positions(mesh, warnings);
    check_triangle_areas(mesh, config, warnings, metrics);
}

fn check_positions(mesh: &Mesh, warnings: &mut Vec<ValidationError>) {
    for (i, p) in mesh.positions().iter().enumerate() {
        if !p.is_valid() {
            warnings.push(ValidationError {
                entity_id: EntityId::Vertex(VertexId(i as u32)),
                code: ErrorCode::NonFiniteVertex,
                message: format!("Position ({}, {}, {}) is not usable", p.x, p.y, p.z),
                severity: Severity::Warning,
                numeric_value: None,
                tolerance: None,
            });
        }
    }
}

fn check_triangle_areas(
    mesh: &Mesh,
    config: &ValidationConfig,
    warnings: &mut Vec<ValidationError>,
    metrics: &mut ValidationMetrics,
) {
    let eps = config.tolerance.degenerate_area;
    for (i, tri) in mesh.triangles().iter().enumerate() {
        if tri[0].is_sentinel() {
            continue;
        }
        let positions = mesh.positions();
        let (Some(a), Some(b), Some(c)) = (
            positions.get(tri[0].index()),
            positions.get(tri[1].index()),
            positions.get(tri[2].index()),
        ) else {
            continue;
        };
        let p = [*a, *b, *c];
        let area = 0.5 * (p[1] - p[0]).cross(&(p[2] - p[0])).length();
        if area.is_nan() {
            continue;
        }
        metrics.min_triangle_area = Some(metrics.min_triangle_area.map_or(area, |m| m.min(area)));
        if area < eps {
            warnings.push(ValidationError {
                entity_id: EntityId::Triangle(TriangleId(i as u32)),
                code: ErrorCode::DegenerateTriangle,
                message: "Triangle has (near-)zero area".into(),
                severity: Severity::Warning,
                numeric_value: Some(area),
                tolerance: Some(eps),
            });
        }
    }
}
