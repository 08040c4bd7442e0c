//! Six-plane convex volumes used for picking and culling.
//!
//! Planes face inward: a point is inside when its signed distance to every
//! plane is non-negative.

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

use super::aabb::{AlignedBox, BOX_TRIANGLES};
use super::plane::Plane;
use super::point::Point3d;
use super::segment::Segment;
use super::transform::Transform;
use super::vector::Vec3;

/// Upper bound on clip steps in [`Frustum::intersects_segment`].
pub const MAX_CLIP_ITERATIONS: u32 = 16;

/// Volume below which a box is tested as a point.
const DEGENERATE_VOLUME: f64 = 1e-12;

/// Names of the six planes, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrustumPlane {
    Top = 0,
    Bottom = 1,
    Left = 2,
    Right = 3,
    Near = 4,
    Far = 5,
}

impl FrustumPlane {
    pub const ALL: [FrustumPlane; 6] = [
        FrustumPlane::Top,
        FrustumPlane::Bottom,
        FrustumPlane::Left,
        FrustumPlane::Right,
        FrustumPlane::Near,
        FrustumPlane::Far,
    ];
}

/// A convex volume bounded by six inward-facing unit planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    pub fn from_planes(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract the planes of a combined (view-)projection matrix whose clip
    /// depth runs over `[0, w]`. Rows are summed or subtracted pairwise and
    /// then normalized; a plane that degenerates to a zero normal rejects
    /// everything, so a zero matrix gives an empty frustum.
    pub fn from_projection(m: &Transform) -> Self {
        let r: [[f64; 4]; 4] = [m.row(0), m.row(1), m.row(2), m.row(3)];
        let add = |a: [f64; 4], b: [f64; 4]| [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]];
        let sub = |a: [f64; 4], b: [f64; 4]| [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]];

        let raw = [
            sub(r[3], r[1]), // top
            add(r[3], r[1]), // bottom
            add(r[3], r[0]), // left
            sub(r[3], r[0]), // right
            r[2],            // near
            sub(r[3], r[2]), // far
        ];
        Self {
            planes: raw.map(|c| Plane::from_coefficients(c).unwrap_or(Plane::REJECT_ALL)),
        }
    }

    /// The six face planes of `bb`, each spanned by three of its corners so
    /// the winding follows the box faces. Flat axes use the axis normal.
    pub fn from_box(bb: &AlignedBox) -> Self {
        let v = bb.vertices();
        let face = |a: usize, b: usize, c: usize, origin: &Point3d, axis: Vec3| {
            Plane::from_points(&v[a], &v[b], &v[c])
                .unwrap_or_else(|| Plane::from_point_normal(origin, axis))
        };
        Self {
            planes: [
                face(3, 2, 6, &bb.max, -Vec3::Y),
                face(0, 4, 5, &bb.min, Vec3::Y),
                face(0, 3, 7, &bb.min, Vec3::X),
                face(1, 5, 6, &bb.max, -Vec3::X),
                face(0, 1, 2, &bb.min, Vec3::Z),
                face(4, 7, 6, &bb.max, -Vec3::Z),
            ],
        }
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// Move the frustum by `m`. Planes are carried by the inverse transpose,
    /// which keeps them valid under non-uniform scale. Returns `false` and
    /// leaves the frustum untouched when `m` is singular.
    pub fn transform(&mut self, m: &Transform) -> bool {
        match self.transformed(m) {
            Some(f) => {
                *self = f;
                true
            }
            None => false,
        }
    }

    pub fn transformed(&self, m: &Transform) -> Option<Frustum> {
        let inv_t = m.inverse_transpose()?;
        let planes = self.planes.map(|p| {
            let c = inv_t * Vector4::from(p.to_coefficients());
            Plane::from_coefficients([c.x, c.y, c.z, c.w]).unwrap_or(Plane::REJECT_ALL)
        });
        Some(Self { planes })
    }

    pub fn intersects_point(&self, p: &Point3d, tol: f64) -> bool {
        self.planes.iter().all(|plane| plane.distance(p) >= -tol)
    }

    pub fn intersects_sphere(&self, center: &Point3d, radius: f64) -> bool {
        self.planes.iter().all(|plane| plane.distance(center) >= -radius)
    }

    /// Bit `i` set when `p` is outside plane `i`.
    fn outcode(&self, p: &Point3d) -> u8 {
        self.planes
            .iter()
            .enumerate()
            .filter(|(_, plane)| plane.distance(p) < 0.0)
            .fold(0, |code, (i, _)| code | (1 << i))
    }

    /// Outcode clip. Returns the clipped endpoints (if any part survives)
    /// and the number of clip steps taken.
    fn clip_outcodes(&self, p1: &Point3d, p2: &Point3d) -> (Option<Segment>, u32) {
        let (mut a, mut b) = (*p1, *p2);
        let (mut code_a, mut code_b) = (self.outcode(&a), self.outcode(&b));
        let mut clips = 0;

        for _ in 0..MAX_CLIP_ITERATIONS {
            if code_a | code_b == 0 {
                return (Some(Segment::new(a, b)), clips);
            }
            if code_a & code_b != 0 {
                return (None, clips);
            }

            let clip_a = code_a != 0;
            let (outside, other, code) = if clip_a { (a, b, code_a) } else { (b, a, code_b) };
            let bit = code.trailing_zeros() as usize;
            let plane = &self.planes[bit];
            let d_out = plane.distance(&outside);
            let d_other = plane.distance(&other);
            let clipped = outside.lerp(&other, d_out / (d_out - d_other));
            clips += 1;

            // The clipped point sits on plane `bit`; rounding must not
            // re-flag it there.
            let code = self.outcode(&clipped) & !(1 << bit);
            if clip_a {
                a = clipped;
                code_a = code;
            } else {
                b = clipped;
                code_b = code;
            }
        }
        (None, clips)
    }

    /// Portion of the segment inside the frustum.
    pub fn clip_segment(&self, p1: &Point3d, p2: &Point3d) -> Option<Segment> {
        self.clip_outcodes(p1, p2).0
    }

    pub fn intersects_segment(&self, p1: &Point3d, p2: &Point3d) -> bool {
        self.clip_outcodes(p1, p2).0.is_some()
    }

    pub fn intersects_triangle(&self, v0: &Point3d, v1: &Point3d, v2: &Point3d) -> bool {
        let mut poly = vec![*v0, *v1, *v2];
        for plane in &self.planes {
            poly = clip_polygon(&poly, plane);
            if poly.is_empty() {
                return false;
            }
        }
        true
    }

    /// Box overlap. The fast path rejects on a single separating plane and
    /// can report false positives near frustum edges; `precise` resolves
    /// those by clipping the box's triangles.
    pub fn intersects_box(&self, bb: &AlignedBox, precise: bool) -> bool {
        let center = bb.center();
        let extents = bb.extents();
        for plane in &self.planes {
            let reach = extents.dot(&plane.normal.abs());
            if plane.distance(&center) + reach < 0.0 {
                return false;
            }
        }
        if !precise {
            return true;
        }

        if bb.volume().abs() < DEGENERATE_VOLUME {
            return self.intersects_point(&center, 0.0);
        }

        let corners = bb.vertices();
        if corners.iter().any(|c| self.intersects_point(c, 0.0)) {
            return true;
        }
        if let Some(frustum_corners) = self.corners() {
            if frustum_corners.iter().any(|c| bb.contains_point(c)) {
                return true;
            }
        }
        BOX_TRIANGLES
            .iter()
            .any(|[a, b, c]| self.intersects_triangle(&corners[*a], &corners[*b], &corners[*c]))
    }

    /// Every corner of `bb` inside every plane.
    pub fn contains(&self, bb: &AlignedBox) -> bool {
        bb.vertices().iter().all(|c| self.intersects_point(c, 0.0))
    }

    /// The eight plane-triple intersections, near face first, in the same
    /// order as [`AlignedBox::vertices`]. `None` if any triple is singular.
    pub fn corners(&self) -> Option<[Point3d; 8]> {
        use FrustumPlane::*;
        let triples = [
            (Near, Bottom, Left),
            (Near, Bottom, Right),
            (Near, Top, Right),
            (Near, Top, Left),
            (Far, Bottom, Left),
            (Far, Bottom, Right),
            (Far, Top, Right),
            (Far, Top, Left),
        ];
        let mut out = [Point3d::ORIGIN; 8];
        for (slot, (a, b, c)) in out.iter_mut().zip(triples) {
            *slot = intersect_planes(self.plane(a), self.plane(b), self.plane(c))?;
        }
        Some(out)
    }
}

/// Sutherland-Hodgman step: keep the part of `poly` on the inside of `plane`.
fn clip_polygon(poly: &[Point3d], plane: &Plane) -> Vec<Point3d> {
    let mut out = Vec::with_capacity(poly.len() + 1);
    for (i, cur) in poly.iter().enumerate() {
        let next = &poly[(i + 1) % poly.len()];
        let dc = plane.distance(cur);
        let dn = plane.distance(next);
        if dc >= 0.0 {
            out.push(*cur);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            out.push(cur.lerp(next, dc / (dc - dn)));
        }
    }
    out
}

/// Common point of three planes by Cramer's rule.
fn intersect_planes(p1: &Plane, p2: &Plane, p3: &Plane) -> Option<Point3d> {
    let n23 = p2.normal.cross(&p3.normal);
    let denom = p1.normal.dot(&n23);
    if denom.abs() < 1e-12 {
        return None;
    }
    let n31 = p3.normal.cross(&p1.normal);
    let n12 = p1.normal.cross(&p2.normal);
    let v = (n23 * p1.d + n31 * p2.d + n12 * p3.d) * (-1.0 / denom);
    Some(Point3d::from_vec3(v))
}
