//! Two-endpoint line segments and their intersection tests.
//!
//! Every test answers "no intersection" for numerically degenerate input
//! (zero-length directions, parallel lines, singular systems) instead of
//! failing.

use serde::{Deserialize, Serialize};

use super::aabb::AlignedBox;
use super::plane::Plane;
use super::point::Point3d;
use super::transform::Transform;
use super::vector::Vec3;

/// A line segment between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point3d,
    pub end: Point3d,
}

/// A point lying on the segment within a pick tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointHit {
    /// Parameter of the projected point along the segment, in `[0, 1]`.
    pub mu: f64,
    /// Perpendicular offset from the segment to the tested point.
    pub offset: Vec3,
}

/// Closest approach between this segment's line and another line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    /// Parameter along `self`.
    pub mu_a: f64,
    /// Parameter along the other line.
    pub mu_b: f64,
    pub on_self: Point3d,
    pub on_other: Point3d,
}

/// Result of the segment-triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleIntersection {
    /// Barycentric weight of `v1`.
    pub u: f64,
    /// Barycentric weight of `v2`.
    pub v: f64,
    /// Scale along `end - start` at which the line meets the triangle.
    pub t: f64,
}

/// Closest points between two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentClosest {
    /// Parameter along `self`, in `[0, 1]`.
    pub s: f64,
    /// Parameter along the other segment, in `[0, 1]`.
    pub t: f64,
    pub on_self: Point3d,
    pub on_other: Point3d,
    pub distance_squared: f64,
}

#[derive(Clone, Copy, PartialEq)]
enum Quadrant {
    Left,
    Right,
    Middle,
}

impl Segment {
    pub fn new(start: Point3d, end: Point3d) -> Self {
        Self { start, end }
    }

    /// Unnormalized direction `end - start`.
    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    pub fn point_at(&self, t: f64) -> Point3d {
        self.start.lerp(&self.end, t)
    }

    pub fn transform(&mut self, m: &Transform) {
        self.start = m.transform_point(&self.start);
        self.end = m.transform_point(&self.end);
    }

    pub fn transformed(&self, m: &Transform) -> Segment {
        let mut s = *self;
        s.transform(m);
        s
    }

    fn is_degenerate(&self) -> bool {
        let eps = crate::default_tolerance().line;
        self.direction().length_squared() < eps * eps
    }

    /// Accepts `p` when it projects inside the segment and lies within `err`
    /// of it.
    pub fn intersects_point(&self, p: &Point3d, err: f64) -> Option<PointHit> {
        if self.is_degenerate() {
            return None;
        }
        let dir = self.direction();
        let mu = (*p - self.start).dot(&dir) / dir.length_squared();
        if !(0.0..=1.0).contains(&mu) {
            return None;
        }
        let offset = *p - self.point_at(mu);
        (offset.length() <= err).then_some(PointHit { mu, offset })
    }

    /// Closest approach between the infinite lines through `self` and
    /// `p1`-`p2`.
    pub fn intersects_line(&self, p1: &Point3d, p2: &Point3d) -> Option<LineHit> {
        let tol = crate::default_tolerance();
        let p21 = self.direction();
        let p43 = *p2 - *p1;
        if p21.length_squared() < tol.line * tol.line || p43.length_squared() < tol.line * tol.line {
            return None;
        }
        let p13 = self.start - *p1;

        let d1343 = p13.dot(&p43);
        let d4321 = p43.dot(&p21);
        let d1321 = p13.dot(&p21);
        let d4343 = p43.dot(&p43);
        let d2121 = p21.dot(&p21);

        let denom = d2121 * d4343 - d4321 * d4321;
        if denom.abs() <= tol.parallel * d2121 * d4343 {
            return None;
        }
        let mu_a = (d1343 * d4321 - d1321 * d4343) / denom;
        let mu_b = (d1343 + d4321 * mu_a) / d4343;

        Some(LineHit {
            mu_a,
            mu_b,
            on_self: self.start + p21 * mu_a,
            on_other: *p1 + p43 * mu_b,
        })
    }

    /// Segment-segment variant of [`Self::intersects_line`]: both parameters
    /// must fall in `[0, 1]`, and when `err >= 0` the closest-approach gap
    /// must be within `err`.
    pub fn intersects_segment(&self, p1: &Point3d, p2: &Point3d, err: f64) -> Option<LineHit> {
        let hit = self.intersects_line(p1, p2)?;
        if !(0.0..=1.0).contains(&hit.mu_a) || !(0.0..=1.0).contains(&hit.mu_b) {
            return None;
        }
        if err >= 0.0 && hit.on_self.distance_to(&hit.on_other) > err {
            return None;
        }
        Some(hit)
    }

    /// Determinant test against triangle `v0 v1 v2`, independent of the
    /// triangle's winding.
    pub fn intersects_triangle(
        &self,
        v0: &Point3d,
        v1: &Point3d,
        v2: &Point3d,
    ) -> Option<TriangleIntersection> {
        let dir = self.direction();
        let edge1 = *v1 - *v0;
        let edge2 = *v2 - *v0;

        let pvec = dir.cross(&edge2);
        let det = edge1.dot(&pvec);
        let scale = dir.length() * edge1.length() * edge2.length();
        if det.abs() <= crate::default_tolerance().parallel * scale || scale == 0.0 {
            return None;
        }

        // Flip the origin vector with the determinant so the range checks
        // below only need the positive form.
        let (det, tvec) = if det < 0.0 {
            (-det, *v0 - self.start)
        } else {
            (det, self.start - *v0)
        };

        let u = tvec.dot(&pvec);
        if u < 0.0 || u > det {
            return None;
        }
        let qvec = tvec.cross(&edge1);
        let v = dir.dot(&qvec);
        if v < 0.0 || u + v > det {
            return None;
        }

        let inv = 1.0 / det;
        Some(TriangleIntersection {
            u: u * inv,
            v: v * inv,
            t: edge2.dot(&qvec) * inv,
        })
    }

    /// Points where the segment crosses the sphere surface: none, one
    /// (tangent) or two, ordered from `start` to `end`.
    pub fn intersects_sphere(&self, center: &Point3d, radius: f64) -> Vec<Point3d> {
        let dir = self.direction();
        let a = dir.length_squared();
        if a == 0.0 {
            return Vec::new();
        }
        let rel = self.start - *center;
        let b = 2.0 * dir.dot(&rel);
        let c = rel.length_squared() - radius * radius;
        let disc = b * b - 4.0 * a * c;

        let mus = if disc < 0.0 {
            return Vec::new();
        } else if disc == 0.0 {
            vec![-b / (2.0 * a)]
        } else {
            let root = disc.sqrt();
            vec![(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)]
        };

        mus.into_iter()
            .filter(|mu| (0.0..=1.0).contains(mu))
            .map(|mu| self.point_at(mu))
            .collect()
    }

    /// Where the line through the segment meets `plane`, as `(mu, point)`.
    /// `mu` is not range-checked so callers can tell "beyond the end" apart
    /// from "parallel".
    pub fn intersects_plane(&self, plane: &Plane) -> Option<(f64, Point3d)> {
        let den = plane.normal.dot(&(self.start - self.end));
        if den.abs() < crate::default_tolerance().parallel {
            return None;
        }
        let mu = plane.distance(&self.start) / den;
        Some((mu, self.point_at(mu)))
    }

    /// Slab test from `start` along `end - start`. Returns the entry point,
    /// or `start` itself when it is already inside the box.
    pub fn intersects_box(&self, bb: &AlignedBox) -> Option<Point3d> {
        let origin = self.start;
        let dir = self.direction();

        let mut inside = true;
        let mut quadrant = [Quadrant::Middle; 3];
        let mut candidate = [0.0; 3];
        for i in 0..3 {
            if origin[i] < bb.min[i] {
                quadrant[i] = Quadrant::Left;
                candidate[i] = bb.min[i];
                inside = false;
            } else if origin[i] > bb.max[i] {
                quadrant[i] = Quadrant::Right;
                candidate[i] = bb.max[i];
                inside = false;
            }
        }
        if inside {
            return Some(origin);
        }

        let mut max_t = [-1.0; 3];
        for i in 0..3 {
            if quadrant[i] != Quadrant::Middle && dir[i] != 0.0 {
                max_t[i] = (candidate[i] - origin[i]) / dir[i];
            }
        }

        let mut which = 0;
        for i in 1..3 {
            if max_t[which] < max_t[i] {
                which = i;
            }
        }
        if max_t[which] < 0.0 {
            return None;
        }

        let mut hit = [0.0; 3];
        for i in 0..3 {
            if i == which {
                hit[i] = candidate[i];
            } else {
                hit[i] = origin[i] + max_t[which] * dir[i];
                if hit[i] < bb.min[i] || hit[i] > bb.max[i] {
                    return None;
                }
            }
        }
        Some(Point3d::new(hit[0], hit[1], hit[2]))
    }

    /// Parameter in `[0, 1]` of the point of the segment nearest `p`.
    pub fn project_parameter(&self, p: &Point3d) -> f64 {
        let dir = self.direction();
        let len_sq = dir.length_squared();
        if len_sq == 0.0 {
            return 0.0;
        }
        ((*p - self.start).dot(&dir) / len_sq).clamp(0.0, 1.0)
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        self.point_at(self.project_parameter(p))
    }

    pub fn distance_squared_to_point(&self, p: &Point3d) -> f64 {
        self.project_point(p).distance_squared_to(p)
    }

    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        self.distance_squared_to_point(p).sqrt()
    }

    /// Closest points between `self` and `other`, well defined for parallel
    /// and zero-length segments.
    pub fn closest_points(&self, other: &Segment) -> SegmentClosest {
        const EPS: f64 = 1e-18;
        let d1 = self.direction();
        let d2 = other.direction();
        let r = self.start - other.start;
        let a = d1.length_squared();
        let e = d2.length_squared();
        let f = d2.dot(&r);

        let (s, t) = if a <= EPS && e <= EPS {
            (0.0, 0.0)
        } else if a <= EPS {
            (0.0, (f / e).clamp(0.0, 1.0))
        } else {
            let c = d1.dot(&r);
            if e <= EPS {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else {
                let b = d1.dot(&d2);
                let denom = a * e - b * b;
                let mut s = if denom > EPS {
                    ((b * f - c * e) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mut t = (b * s + f) / e;
                if t < 0.0 {
                    t = 0.0;
                    s = (-c / a).clamp(0.0, 1.0);
                } else if t > 1.0 {
                    t = 1.0;
                    s = ((b - c) / a).clamp(0.0, 1.0);
                }
                (s, t)
            }
        };

        let on_self = self.start + d1 * s;
        let on_other = other.start + d2 * t;
        SegmentClosest {
            s,
            t,
            on_self,
            on_other,
            distance_squared: on_self.distance_squared_to(&on_other),
        }
    }
}
