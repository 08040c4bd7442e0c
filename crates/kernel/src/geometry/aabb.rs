use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use super::frustum::Frustum;
use super::point::Point3d;
use super::transform::Transform;
use super::vector::Vec3;

/// Corner pairs of the 12 box edges, indexing [`AlignedBox::vertices`].
#[rustfmt::skip]
pub const BOX_EDGES: [[usize; 2]; 12] = [
    [0, 1], [1, 2], [2, 3], [3, 0],
    [4, 5], [5, 6], [6, 7], [7, 4],
    [0, 4], [1, 5], [2, 6], [3, 7],
];

/// Corner triples of the 12 box triangles, counter-clockwise seen from outside.
#[rustfmt::skip]
pub const BOX_TRIANGLES: [[usize; 3]; 12] = [
    [0, 2, 1], [0, 3, 2], // -z
    [4, 5, 6], [4, 6, 7], // +z
    [0, 7, 3], [0, 4, 7], // -x
    [1, 6, 5], [1, 2, 6], // +x
    [0, 5, 4], [0, 1, 5], // -y
    [3, 6, 2], [3, 7, 6], // +y
];

/// An axis-aligned bounding box.
///
/// An unseeded box is empty: the first point or box merged into it is
/// adopted verbatim instead of being unioned with the zero box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedBox {
    pub min: Point3d,
    pub max: Point3d,
    seeded: bool,
}

impl Default for AlignedBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl AlignedBox {
    pub fn empty() -> Self {
        Self {
            min: Point3d::ORIGIN,
            max: Point3d::ORIGIN,
            seeded: false,
        }
    }

    /// Seeded box from two corners, sorted per axis.
    pub fn from_min_max(a: Point3d, b: Point3d) -> Self {
        Self {
            min: a.min(&b),
            max: a.max(&b),
            seeded: true,
        }
    }

    /// Tight box around a point cloud; empty input gives an unseeded box.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3d>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.test(p);
        }
        bb
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// Grow to include `p`, seeding on the first call.
    pub fn test(&mut self, p: &Point3d) {
        if self.seeded {
            self.min = self.min.min(p);
            self.max = self.max.max(p);
        } else {
            self.min = *p;
            self.max = *p;
            self.seeded = true;
        }
    }

    pub fn merge(&mut self, other: &AlignedBox) {
        if !other.seeded {
            return;
        }
        if !self.seeded {
            *self = *other;
            return;
        }
        self.min = self.min.min(&other.min);
        self.max = self.max.max(&other.max);
    }

    /// Merge a unit box centered on `p`, so every point contributes a
    /// minimum footprint of half a unit in each direction.
    pub fn merge_point(&mut self, p: &Point3d) {
        let half = Vec3::splat(0.5);
        self.merge(&AlignedBox::from_min_max(*p - half, *p + half));
    }

    /// Re-fit to the 8 corners pushed through `m`. The result bounds the
    /// rotated box, not the shape the box was bounding.
    pub fn transform(&mut self, m: &Transform) {
        if !self.seeded {
            return;
        }
        let corners = self.vertices();
        self.reset();
        for c in &corners {
            self.test(&m.transform_point(c));
        }
    }

    pub fn transformed(&self, m: &Transform) -> AlignedBox {
        let mut bb = *self;
        bb.transform(m);
        bb
    }

    pub fn center(&self) -> Point3d {
        self.min.lerp(&self.max, 0.5)
    }

    /// Half of the size along each axis.
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    pub fn contains_point(&self, p: &Point3d) -> bool {
        self.seeded
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// The 8 corners: the `min.z` face counter-clockwise from `min`, then the
    /// `max.z` face in the same order.
    pub fn vertices(&self) -> [Point3d; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3d::new(a.x, a.y, a.z),
            Point3d::new(b.x, a.y, a.z),
            Point3d::new(b.x, b.y, a.z),
            Point3d::new(a.x, b.y, a.z),
            Point3d::new(a.x, a.y, b.z),
            Point3d::new(b.x, a.y, b.z),
            Point3d::new(b.x, b.y, b.z),
            Point3d::new(a.x, b.y, b.z),
        ]
    }

    pub fn wireframe(&self) -> [[Point3d; 2]; 12] {
        let v = self.vertices();
        BOX_EDGES.map(|[a, b]| [v[a], v[b]])
    }

    pub fn triangulated(&self) -> [[Point3d; 3]; 12] {
        let v = self.vertices();
        BOX_TRIANGLES.map(|[a, b, c]| [v[a], v[b], v[c]])
    }

    pub fn closest_corner(&self, p: &Point3d) -> Point3d {
        let corners = self.vertices();
        let mut best = corners[0];
        let mut best_dist = p.distance_squared_to(&best);
        for c in &corners[1..] {
            let d = p.distance_squared_to(c);
            if d < best_dist {
                best_dist = d;
                best = *c;
            }
        }
        best
    }

    /// Squared distance from `p` to the nearest point of the box (zero inside).
    pub fn distance_squared_to_point(&self, p: &Point3d) -> f64 {
        let mut dist = 0.0;
        for axis in 0..3 {
            let v = p[axis];
            if v < self.min[axis] {
                let s = v - self.min[axis];
                dist += s * s;
            } else if v > self.max[axis] {
                let s = v - self.max[axis];
                dist += s * s;
            }
        }
        dist
    }

    /// Sphere overlap: each axis places the center below, inside, or above
    /// the slab, which picks the face, edge or corner region it is nearest.
    pub fn intersects_sphere(&self, center: &Point3d, radius: f64) -> bool {
        self.distance_squared_to_point(center) <= radius * radius
    }

    /// Overlap test that reuses the frustum box test, treating `self` as a
    /// six-plane volume.
    pub fn intersects_box(&self, other: &AlignedBox) -> bool {
        if !self.seeded || !other.seeded {
            return false;
        }
        Frustum::from_box(self).intersects_box(other, false)
    }
}

impl AbsDiffEq for AlignedBox {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.seeded == other.seeded
            && self.min.abs_diff_eq(&other.min, epsilon)
            && self.max.abs_diff_eq(&other.max, epsilon)
    }
}
