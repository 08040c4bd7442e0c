use tracing::{debug, instrument};

use super::{Mesh, MeshError};
use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::vector::Vec3;

/// Outcome of a tangent pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TangentReport {
    /// Triangles that wrote a tangent frame.
    pub processed: usize,
    /// Degenerate triangles left out.
    pub skipped: usize,
}

impl Mesh {
    /// Derive per-vertex tangents and binormals from the texture mapping.
    ///
    /// Each triangle writes its frame to all three of its vertices, so a
    /// shared vertex keeps the frame of the last triangle that touched it.
    /// Degenerate triangles are skipped and vertices no triangle wrote to
    /// keep a zero frame.
    #[instrument(skip(self), fields(triangles = self.triangles.len()))]
    pub fn compute_tangents_and_binormals(&mut self) -> Result<TangentReport, MeshError> {
        let uvs = self.uvs.as_ref().ok_or(MeshError::MissingTexCoords)?;
        let mut tangents = vec![Vec3::ZERO; self.positions.len()];
        let mut binormals = vec![Vec3::ZERO; self.positions.len()];
        let mut report = TangentReport::default();

        for (_, tri) in self.live_triangles() {
            let uv = tri.map(|v| uvs[v.index()]);
            match triangle_frame(self.corners(tri), uv) {
                Some((tangent, binormal)) => {
                    for v in tri {
                        tangents[v.index()] = tangent;
                        binormals[v.index()] = binormal;
                    }
                    report.processed += 1;
                }
                None => report.skipped += 1,
            }
        }

        self.tangents = tangents;
        self.binormals = binormals;
        debug!(processed = report.processed, skipped = report.skipped, "tangent frames computed");
        Ok(report)
    }
}

/// Tangent and binormal of one triangle, or `None` when any step
/// degenerates.
fn triangle_frame(mut p: [Point3d; 3], mut uv: [Point2d; 3]) -> Option<(Vec3, Vec3)> {
    let tol = crate::default_tolerance();
    let floor = tol.tangent_length_sq;

    let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
    if normal.length_squared() <= floor {
        return None;
    }
    let normal = normal / normal.length();

    let tangent = texture_axis(&mut p, &mut uv, |q| q.y, |q| q.x, tol.uv);
    if tangent.length_squared() <= floor {
        return None;
    }
    let tangent = tangent / tangent.length();
    let tangent = tangent.reject_from(&normal);
    if tangent.length_squared() <= floor {
        return None;
    }
    let tangent = tangent / tangent.length();

    // Continues from the V-sorted corner order.
    let binormal = texture_axis(&mut p, &mut uv, |q| q.x, |q| q.y, tol.uv);
    let binormal = binormal.reject_from(&normal);
    let binormal = if binormal == Vec3::ZERO {
        tangent.cross(&normal)
    } else {
        binormal / binormal.length()
    };
    if binormal.length_squared() < floor {
        return None;
    }

    Some((tangent, binormal))
}

/// Direction in which `flip` grows across the triangle, measured along the
/// line of constant `key`.
///
/// Corners are sorted by descending `key`, a point is interpolated on the
/// max-to-min edge at the middle corner's `key`, and the result runs from
/// the middle corner to that point, negated when the interpolated `flip`
/// is below the middle corner's.
fn texture_axis(
    p: &mut [Point3d; 3],
    uv: &mut [Point2d; 3],
    key: fn(&Point2d) -> f64,
    flip: fn(&Point2d) -> f64,
    uv_eps: f64,
) -> Vec3 {
    for (i, j) in [(0, 1), (0, 2), (1, 2)] {
        if key(&uv[i]) < key(&uv[j]) {
            p.swap(i, j);
            uv.swap(i, j);
        }
    }

    let span = key(&uv[2]) - key(&uv[0]);
    let s = if span.abs() < uv_eps {
        1.0
    } else {
        (key(&uv[1]) - key(&uv[0])) / span
    };
    let on_edge = p[0].lerp(&p[2], s);
    let flip_at = flip(&uv[0]) * (1.0 - s) + flip(&uv[2]) * s;

    let axis = on_edge - p[1];
    if flip_at < flip(&uv[1]) { -axis } else { axis }
}
