//! Planar subtraction of a convex polygon from a triangle.
//!
//! Both shapes are given as 3D points and compared in the plane left after
//! dropping one coordinate axis. The 2D cross product used for every side
//! test is `cross(u, v) = v.a * u.b - u.a * v.b` over the kept coordinates
//! `(a, b)`; a triangle has positive sense when that cross product of its
//! first two edges is non-negative.
//!
//! The triangulation fans each clipped polygon edge to a triangle corner
//! and patches the wedges between fans. When the clipped boundary is an
//! open chain that patching can leave a wedge uncovered, so every result
//! is checked against the exact remaining area and rebuilt by half-plane
//! decomposition when the two disagree.

use tracing::debug;

use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::vector::Vec3;

/// Relative area mismatch above which the fan triangulation is discarded.
const AREA_CHECK: f64 = 1e-9;

/// Coordinate axis ignored by [`tri_minus_poly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAxis {
    /// Compare in `(y, z)`.
    X,
    /// Compare in `(x, z)`.
    Y,
    /// Compare in `(x, y)`.
    Z,
}

impl DropAxis {
    pub fn flatten(self, p: &Point3d) -> Point2d {
        match self {
            DropAxis::X => Point2d::new(p.y, p.z),
            DropAxis::Y => Point2d::new(p.x, p.z),
            DropAxis::Z => Point2d::new(p.x, p.y),
        }
    }

    fn flatten_vec(self, v: &Vec3) -> Point2d {
        self.flatten(&Point3d::from_vec3(*v))
    }

    /// 2D cross product of two 3D differences.
    fn cross(self, u: &Vec3, v: &Vec3) -> f64 {
        let (u, v) = (self.flatten_vec(u), self.flatten_vec(v));
        v.x * u.y - u.x * v.y
    }

    /// `+1` or `-1`; collinear corners count as positive.
    pub fn sense(self, tri: &[Point3d; 3]) -> i32 {
        let c = self.cross(&(tri[1] - tri[0]), &(tri[2] - tri[1]));
        if c >= 0.0 { 1 } else { -1 }
    }
}

/// Triangulate `tri` minus the convex polygon `poly`.
///
/// Output triangles share the winding of `tri`. The result is empty when
/// the polygon covers the triangle and is `tri` itself when the two do
/// not overlap. Polygons with fewer than three corners subtract nothing.
pub fn tri_minus_poly(tri: &[Point3d; 3], poly: &[Point3d], axis: DropAxis) -> Vec<[Point3d; 3]> {
    if poly.len() < 3 {
        return vec![*tri];
    }

    let input_sense = axis.sense(tri);
    let t = if input_sense > 0 {
        *tri
    } else {
        [tri[0], tri[2], tri[1]]
    };
    let mut ring = poly.to_vec();
    if axis.sense(&[ring[0], ring[1], ring[2]]) < 0 {
        ring.reverse();
    }

    let Some(edges) = clip_ring(&t, &ring, axis) else {
        let centroid = Point3d::from_vec3((t[0].to_vec3() + t[1].to_vec3() + t[2].to_vec3()) / 3.0);
        return if ring_contains(&ring, &centroid, axis) {
            Vec::new()
        } else {
            vec![*tri]
        };
    };

    let (mut out, loose) = fan_edges(&t, &edges, axis);
    fill_gaps(&mut out, &t, loose, axis);

    let whole = triangle_area(&t, axis);
    let remaining = whole - polygon_area(&overlap(&t, &ring, axis), axis);
    let covered: f64 = out.iter().map(|piece| triangle_area(piece, axis)).sum();
    if (covered - remaining).abs() > AREA_CHECK * whole {
        debug!(covered, remaining, "fan triangulation incomplete, decomposing");
        out = decompose(&t, &ring, axis);
    }

    for piece in &mut out {
        if axis.sense(piece) != input_sense {
            piece.swap(1, 2);
        }
    }
    out
}

/// Clip the polygon boundary against the triangle's three half-planes.
/// `None` when no boundary survives.
fn clip_ring(t: &[Point3d; 3], ring: &[Point3d], axis: DropAxis) -> Option<Vec<[Point3d; 2]>> {
    let mut edges: Vec<[Point3d; 2]> = (0..ring.len())
        .map(|i| [ring[(i + ring.len() - 1) % ring.len()], ring[i]])
        .collect();

    for i in 0..3 {
        let t0 = t[(i + 2) % 3];
        let side = t[i] - t0;
        let mut kept = Vec::with_capacity(edges.len());
        for [p0, p1] in edges {
            let c0 = axis.cross(&side, &(p0 - t0));
            let c1 = axis.cross(&side, &(p1 - t0));
            if c0 <= 0.0 && c1 <= 0.0 {
                continue;
            }
            let cut = || p0.lerp(&p1, c0 / (c0 - c1));
            let start = if c0 >= 0.0 { p0 } else { cut() };
            let end = if c1 >= 0.0 { p1 } else { cut() };
            kept.push([start, end]);
        }
        if kept.is_empty() {
            return None;
        }
        edges = kept;
    }
    Some(edges)
}

/// Close every clipped edge with the triangle corner furthest outside it.
/// Also returns the first corner that lies outside some edge yet closes
/// none of them.
fn fan_edges(t: &[Point3d; 3], edges: &[[Point3d; 2]], axis: DropAxis) -> (Vec<[Point3d; 3]>, Option<usize>) {
    let mut used = 0u8;
    let mut outside = 0u8;
    let mut out = Vec::with_capacity(edges.len() * 2 + 3);
    for &[p0, p1] in edges {
        let dir = p1 - p0;
        let c = t.map(|corner| axis.cross(&dir, &(corner - p0)));
        let pick = if c[0] < c[1] {
            if c[0] < c[2] { 0 } else { 2 }
        } else if c[1] < c[2] {
            1
        } else {
            2
        };
        out.push([p0, p1, t[pick]]);
        used |= 1 << pick;
        for (k, ck) in c.iter().enumerate() {
            if *ck < 0.0 {
                outside |= 1 << k;
            }
        }
    }
    let loose = outside & !used;
    let loose = (0..3).find(|k| loose & (1 << k) != 0);
    (out, loose)
}

/// Fill the wedges between consecutive fans, attaching the loose corner
/// where one exists.
fn fill_gaps(out: &mut Vec<[Point3d; 3]>, t: &[Point3d; 3], loose: Option<usize>, axis: DropAxis) {
    let Some(&last) = out.last() else {
        return;
    };
    let flat = |p: &Point3d| axis.flatten(p);
    let wrong_way = |a: Point3d, b: Point3d, c: Point3d| axis.sense(&[a, b, c]) != 1;

    let fans = out.len();
    let mut prev = last;
    for i in 0..fans {
        let cur = out[i];
        if flat(&prev[1]) == flat(&cur[0]) {
            if flat(&prev[2]) != flat(&cur[2]) {
                if wrong_way(cur[0], cur[2], prev[2]) {
                    out.push([cur[0], cur[2], prev[2]]);
                } else if let Some(k) = loose {
                    out.push([prev[2], cur[0], t[k]]);
                    out.push([cur[0], cur[2], t[k]]);
                }
            }
        } else if let Some(k) = loose {
            let corner = t[k];
            if wrong_way(corner, prev[0], prev[1]) && wrong_way(corner, prev[2], prev[1]) {
                out.push([prev[2], prev[1], corner]);
            }
            if wrong_way(corner, cur[0], cur[1]) && wrong_way(corner, cur[0], cur[2]) {
                out.push([cur[0], cur[2], corner]);
            }
        }
        prev = cur;
    }
}

/// Part of `poly` on the inner (`inside`) or outer side of the directed
/// line `a -> b`.
fn clip_convex(poly: &[Point3d], a: &Point3d, b: &Point3d, inside: bool, axis: DropAxis) -> Vec<Point3d> {
    let dir = *b - *a;
    let side = |p: &Point3d| {
        let c = axis.cross(&dir, &(*p - *a));
        if inside { c } else { -c }
    };
    let mut out = Vec::with_capacity(poly.len() + 1);
    for i in 0..poly.len() {
        let p = poly[(i + poly.len() - 1) % poly.len()];
        let q = poly[i];
        let (sp, sq) = (side(&p), side(&q));
        if (sp < 0.0) != (sq < 0.0) {
            out.push(p.lerp(&q, sp / (sp - sq)));
        }
        if sq >= 0.0 {
            out.push(q);
        }
    }
    out
}

/// Intersection of the triangle with the ring.
fn overlap(t: &[Point3d; 3], ring: &[Point3d], axis: DropAxis) -> Vec<Point3d> {
    let mut inner = t.to_vec();
    for i in 0..ring.len() {
        if inner.len() < 3 {
            break;
        }
        let a = ring[(i + ring.len() - 1) % ring.len()];
        inner = clip_convex(&inner, &a, &ring[i], true, axis);
    }
    inner
}

/// Split the triangle into the convex pieces outside each ring edge in
/// turn, each fan-triangulated.
fn decompose(t: &[Point3d; 3], ring: &[Point3d], axis: DropAxis) -> Vec<[Point3d; 3]> {
    let mut rest = t.to_vec();
    let mut out = Vec::new();
    for i in 0..ring.len() {
        let a = ring[(i + ring.len() - 1) % ring.len()];
        let b = ring[i];
        let piece = clip_convex(&rest, &a, &b, false, axis);
        for k in 1..piece.len().saturating_sub(1) {
            let tri = [piece[0], piece[k], piece[k + 1]];
            if triangle_area(&tri, axis) > 0.0 {
                out.push(tri);
            }
        }
        rest = clip_convex(&rest, &a, &b, true, axis);
        if rest.len() < 3 {
            break;
        }
    }
    out
}

fn triangle_area(t: &[Point3d; 3], axis: DropAxis) -> f64 {
    axis.cross(&(t[1] - t[0]), &(t[2] - t[0])).abs() * 0.5
}

fn polygon_area(poly: &[Point3d], axis: DropAxis) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    (1..poly.len() - 1)
        .map(|k| triangle_area(&[poly[0], poly[k], poly[k + 1]], axis))
        .sum()
}

/// Point-in-convex-ring test for a positively wound ring.
fn ring_contains(ring: &[Point3d], p: &Point3d, axis: DropAxis) -> bool {
    (0..ring.len()).all(|i| {
        let a = ring[(i + ring.len() - 1) % ring.len()];
        let b = ring[i];
        axis.cross(&(b - a), &(*p - a)) >= 0.0
    })
}
