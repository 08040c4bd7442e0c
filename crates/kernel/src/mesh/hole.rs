use tracing::{info, instrument, warn};

use super::{Mesh, MeshError, TriangleId, VertexId};
use crate::boolean::polygon::{DropAxis, tri_minus_poly};
use crate::geometry::aabb::AlignedBox;
use crate::geometry::frustum::Frustum;
use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::transform::Transform;
use crate::geometry::vector::Vec3;

/// Cross-section of the cutting cube in its local XZ plane.
const CUT_SQUARE: [Point3d; 4] = [
    Point3d { x: 1.0, y: 0.0, z: 1.0 },
    Point3d { x: 1.0, y: 0.0, z: -1.0 },
    Point3d { x: -1.0, y: 0.0, z: -1.0 },
    Point3d { x: -1.0, y: 0.0, z: 1.0 },
];

/// Triangles steeper than this against the cutting axis are left alone.
const MIN_NORMAL_Y: f64 = 1e-6;

/// Outcome of [`Mesh::cut_box_hole`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoleReport {
    /// Original triangles replaced by their remainder.
    pub cut_triangles: usize,
    /// Triangles appended for the remainders.
    pub added_triangles: usize,
    /// Vertices merged by the closing weld.
    pub welded_vertices: usize,
}

struct Piece {
    corners: [Point3d; 3],
    uvs: Option<[Point2d; 3]>,
}

impl Mesh {
    /// Punch the unit cube `[-1, 1]^3` placed by `transform` through the
    /// surface, cutting along the cube's local Y axis.
    ///
    /// Every triangle touching the cube is replaced by what is left of it
    /// outside the cube's XZ cross-section, the new seams are welded at
    /// `weld_threshold` and texture coordinates are interpolated onto new
    /// vertices. Triangles running parallel to the cutting axis are not
    /// cut. Nothing is modified when an error is returned.
    #[instrument(skip(self, transform), fields(triangles = self.triangles.len()))]
    pub fn cut_box_hole(&mut self, transform: &Transform, weld_threshold: f64) -> Result<HoleReport, MeshError> {
        if weld_threshold.is_nan() || weld_threshold < 0.0 {
            warn!(weld_threshold, "hole cut rejected");
            return Err(MeshError::InvalidParameter {
                name: "weld threshold",
                value: weld_threshold,
            });
        }
        let Some(to_local) = transform.inverse() else {
            warn!("hole cut rejected: singular transform");
            return Err(MeshError::SingularTransform);
        };

        let cube = Frustum::from_box(&AlignedBox::from_min_max(
            Point3d::new(-1.0, -1.0, -1.0),
            Point3d::new(1.0, 1.0, 1.0),
        ));

        let mut doomed: Vec<TriangleId> = Vec::new();
        let mut pieces: Vec<Piece> = Vec::new();
        for (id, tri) in self.live_triangles() {
            let local = self.corners(tri).map(|p| to_local.transform_point(&p));
            if !cube.intersects_triangle(&local[0], &local[1], &local[2]) {
                continue;
            }
            let Some(normal) = (local[1] - local[0]).cross(&(local[2] - local[0])).normalized() else {
                continue;
            };
            if normal.y.abs() < MIN_NORMAL_Y {
                continue;
            }
            let plane_w = normal.dot(&local[0].to_vec3());
            let flat = local.map(|p| Point3d::new(p.x, 0.0, p.z));
            let tri_uvs = self.uvs.as_ref().map(|uvs| tri.map(|v| uvs[v.index()]));

            doomed.push(id);
            for remainder in tri_minus_poly(&flat, &CUT_SQUARE, DropAxis::Y) {
                let uvs = tri_uvs.map(|uv| remainder.map(|p| interpolate_uv(&flat, &uv, &p)));
                let corners = remainder.map(|p| {
                    let lifted = Point3d::new(p.x, lift(&normal, plane_w, &p), p.z);
                    transform.transform_point(&lifted)
                });
                pieces.push(Piece { corners, uvs });
            }
        }

        if doomed.is_empty() {
            return Ok(HoleReport::default());
        }
        let needed = self.positions.len() + pieces.len() * 3;
        if needed >= u32::MAX as usize {
            return Err(MeshError::TooManyVertices { count: needed });
        }

        for piece in &pieces {
            let mut ids = [VertexId::SENTINEL; 3];
            for (k, corner) in piece.corners.iter().enumerate() {
                ids[k] = self.add_vertex(*corner, piece.uvs.map(|uv| uv[k]))?;
            }
            self.add_triangle(ids[0], ids[1], ids[2])?;
        }
        self.mark_triangles(&doomed)?;
        self.compact();
        let weld = self.weld_vertices(weld_threshold)?;

        let report = HoleReport {
            cut_triangles: doomed.len(),
            added_triangles: pieces.len(),
            welded_vertices: weld.merged,
        };
        info!(
            cut = report.cut_triangles,
            added = report.added_triangles,
            welded = report.welded_vertices,
            "hole cut"
        );
        Ok(report)
    }
}

/// Height of the plane `normal . p = w` above `(p.x, p.z)`.
fn lift(normal: &Vec3, w: f64, p: &Point3d) -> f64 {
    (w - normal.x * p.x - normal.z * p.z) / normal.y
}

/// Texture coordinate at `p` from barycentric weights in the XZ plane.
fn interpolate_uv(flat: &[Point3d; 3], uv: &[Point2d; 3], p: &Point3d) -> Point2d {
    let area = |a: &Point3d, b: &Point3d, c: &Point3d| (b.x - a.x) * (c.z - a.z) - (c.x - a.x) * (b.z - a.z);
    let whole = area(&flat[0], &flat[1], &flat[2]);
    if whole == 0.0 {
        return uv[0];
    }
    let w0 = area(p, &flat[1], &flat[2]) / whole;
    let w1 = area(&flat[0], p, &flat[2]) / whole;
    let w2 = 1.0 - w0 - w1;
    Point2d::new(
        uv[0].x * w0 + uv[1].x * w1 + uv[2].x * w2,
        uv[0].y * w0 + uv[1].y * w1 + uv[2].y * w2,
    )
}
