//! Shared query traits.
//!
//! `VolumeQuery` is what mesh culling (`Mesh::triangles_in_volume`) and
//! picking code are written against, so a frustum and an axis-aligned box
//! can be used interchangeably.

use crate::geometry::aabb::AlignedBox;
use crate::geometry::frustum::Frustum;
use crate::geometry::point::Point3d;

/// A closed convex region that primitives can be tested against.
pub trait VolumeQuery {
    /// Whether `p` lies inside, allowing `tol` of slack outside the boundary.
    fn intersects_point(&self, p: &Point3d, tol: f64) -> bool;

    fn intersects_sphere(&self, center: &Point3d, radius: f64) -> bool;

    fn intersects_segment(&self, p1: &Point3d, p2: &Point3d) -> bool;

    fn intersects_triangle(&self, v0: &Point3d, v1: &Point3d, v2: &Point3d) -> bool;

    /// Exact overlap with an axis-aligned box.
    fn intersects_box(&self, bb: &AlignedBox) -> bool;

    /// True when every corner of `bb` is inside.
    fn contains_box(&self, bb: &AlignedBox) -> bool {
        bb.vertices().iter().all(|c| self.intersects_point(c, 0.0))
    }
}

impl VolumeQuery for Frustum {
    fn intersects_point(&self, p: &Point3d, tol: f64) -> bool {
        Frustum::intersects_point(self, p, tol)
    }

    fn intersects_sphere(&self, center: &Point3d, radius: f64) -> bool {
        Frustum::intersects_sphere(self, center, radius)
    }

    fn intersects_segment(&self, p1: &Point3d, p2: &Point3d) -> bool {
        Frustum::intersects_segment(self, p1, p2)
    }

    fn intersects_triangle(&self, v0: &Point3d, v1: &Point3d, v2: &Point3d) -> bool {
        Frustum::intersects_triangle(self, v0, v1, v2)
    }

    fn intersects_box(&self, bb: &AlignedBox) -> bool {
        Frustum::intersects_box(self, bb, true)
    }

    fn contains_box(&self, bb: &AlignedBox) -> bool {
        self.contains(bb)
    }
}

/// Boxes answer the clipping queries through their six-plane frustum.
impl VolumeQuery for AlignedBox {
    fn intersects_point(&self, p: &Point3d, tol: f64) -> bool {
        p.x >= self.min.x - tol
            && p.x <= self.max.x + tol
            && p.y >= self.min.y - tol
            && p.y <= self.max.y + tol
            && p.z >= self.min.z - tol
            && p.z <= self.max.z + tol
    }

    fn intersects_sphere(&self, center: &Point3d, radius: f64) -> bool {
        AlignedBox::intersects_sphere(self, center, radius)
    }

    fn intersects_segment(&self, p1: &Point3d, p2: &Point3d) -> bool {
        Frustum::from_box(self).intersects_segment(p1, p2)
    }

    fn intersects_triangle(&self, v0: &Point3d, v1: &Point3d, v2: &Point3d) -> bool {
        Frustum::from_box(self).intersects_triangle(v0, v1, v2)
    }

    fn intersects_box(&self, bb: &AlignedBox) -> bool {
        AlignedBox::intersects_box(self, bb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AlignedBox {
        AlignedBox::from_min_max(Point3d::new(-1.0, -1.0, -1.0), Point3d::new(1.0, 1.0, 1.0))
    }

    fn count_hits(volume: &impl VolumeQuery, points: &[Point3d]) -> usize {
        points.iter().filter(|p| volume.intersects_point(p, 0.0)).count()
    }

    #[test]
    fn test_box_and_frustum_agree() {
        let bb = unit_box();
        let frustum = Frustum::from_box(&bb);
        let points = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(0.99, -0.99, 0.5),
            Point3d::new(1.5, 0.0, 0.0),
            Point3d::new(0.0, 0.0, -3.0),
        ];
        assert_eq!(count_hits(&bb, &points), 2);
        assert_eq!(count_hits(&frustum, &points), 2);

        let (a, b) = (Point3d::new(-5.0, 0.0, 0.0), Point3d::new(5.0, 0.0, 0.0));
        assert!(VolumeQuery::intersects_segment(&bb, &a, &b));
        assert!(VolumeQuery::intersects_segment(&frustum, &a, &b));
    }

    #[test]
    fn test_contains_box() {
        let bb = unit_box();
        let inner = AlignedBox::from_min_max(Point3d::new(-0.5, -0.5, -0.5), Point3d::new(0.5, 0.5, 0.5));
        let straddling = AlignedBox::from_min_max(Point3d::new(0.5, 0.5, 0.5), Point3d::new(2.0, 2.0, 2.0));
        assert!(bb.contains_box(&inner));
        assert!(!bb.contains_box(&straddling));
        assert!(VolumeQuery::intersects_box(&bb, &straddling));
        assert!(Frustum::from_box(&bb).contains_box(&inner));
    }

    #[test]
    fn test_tolerance_widens_point_test() {
        let bb = unit_box();
        let p = Point3d::new(1.05, 0.0, 0.0);
        assert!(!VolumeQuery::intersects_point(&bb, &p, 0.0));
        assert!(VolumeQuery::intersects_point(&bb, &p, 0.1));
    }
}
