//! Closest-feature queries and aggregate diagnostics.
//!
//! Every query skips triangles pending removal and reports "nothing found"
//! as `None`.

use std::collections::HashSet;

use super::{Edge, EdgeId, Mesh, TriangleId, VertexId};
use crate::geometry::aabb::AlignedBox;
use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::segment::Segment;
use crate::geometry::transform::Transform;
use crate::geometry::vector::Vec3;
use crate::traits::VolumeQuery;

/// Nearest point on a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub id: TriangleId,
    pub point: Point3d,
    pub distance_squared: f64,
}

/// Nearest feature within a static sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityHit<I> {
    pub id: I,
    pub distance_squared: f64,
}

/// Earliest feature touched by a [`SweptSphere`]; `t` is the travelled
/// distance along the sweep, in `[0, length]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit<I> {
    pub id: I,
    pub t: f64,
}

/// Screen-space pick result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenHit {
    pub id: VertexId,
    /// Squared distance to the pick point in normalized device coordinates.
    pub distance_squared: f64,
    /// Post-divide depth in `[0, 1]`.
    pub depth: f64,
}

/// A sphere of `radius` moving from `start` along unit `direction` for
/// `length` units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptSphere {
    pub start: Point3d,
    pub direction: Vec3,
    pub length: f64,
    pub radius: f64,
}

impl SweptSphere {
    /// `None` when `direction` has no length.
    pub fn new(start: Point3d, direction: Vec3, length: f64, radius: f64) -> Option<Self> {
        Some(Self {
            start,
            direction: direction.normalized()?,
            length,
            radius,
        })
    }

    /// Path of the sphere's center.
    pub fn path(&self) -> Segment {
        Segment::new(self.start, self.start + self.direction * self.length)
    }
}

/// Nearest point to `p` on triangle `v0 v1 v2`, with `p` already lying in
/// the triangle's plane. The flag is true when `p` is inside all three
/// edges and was returned unchanged.
pub fn nearest_point_in_triangle(p: &Point3d, v0: &Point3d, v1: &Point3d, v2: &Point3d) -> (Point3d, bool) {
    let normal = (*v1 - *v0).cross(&(*v2 - *v0));
    let mut best: Option<(Point3d, f64)> = None;
    for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
        let outside = normal.dot(&(*b - *a).cross(&(*p - *a))) < 0.0;
        if !outside {
            continue;
        }
        let snapped = Segment::new(*a, *b).project_point(p);
        let d2 = snapped.distance_squared_to(p);
        if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
            best = Some((snapped, d2));
        }
    }
    match best {
        Some((q, _)) => (q, false),
        None => (*p, true),
    }
}

/// Unit normal of a triangle, `None` below the query degeneracy floor.
fn unit_normal(p0: &Point3d, p1: &Point3d, p2: &Point3d) -> Option<Vec3> {
    let n = (*p1 - *p0).cross(&(*p2 - *p0));
    if n.length_squared() < crate::default_tolerance().normal_length_sq {
        return None;
    }
    n.normalized()
}

impl Mesh {
    /// Nearest point on any triangle within `max_distance` of `point`.
    pub fn closest_triangle(&self, point: &Point3d, max_distance: f64) -> Option<TriangleHit> {
        let mut bound = max_distance * max_distance;
        let mut best = None;
        for (id, tri) in self.live_triangles() {
            let [p0, p1, p2] = self.corners(tri);
            let Some(n) = unit_normal(&p0, &p1, &p2) else {
                continue;
            };
            let plane_dist = n.dot(&(*point - p0));
            if plane_dist * plane_dist >= bound {
                continue;
            }
            let projected = *point - n * plane_dist;
            let (q, _) = nearest_point_in_triangle(&projected, &p0, &p1, &p2);
            let d2 = q.distance_squared_to(point);
            if d2 < bound {
                bound = d2;
                best = Some(TriangleHit {
                    id,
                    point: q,
                    distance_squared: d2,
                });
            }
        }
        best
    }

    /// Nearest position within `radius` of `center`.
    pub fn closest_vertex_in_sphere(&self, center: &Point3d, radius: f64) -> Option<ProximityHit<VertexId>> {
        let mut best: Option<ProximityHit<VertexId>> = None;
        for (i, p) in self.positions.iter().enumerate() {
            let d2 = p.distance_squared_to(center);
            if d2 <= radius * radius && best.is_none_or(|b| d2 < b.distance_squared) {
                best = Some(ProximityHit {
                    id: VertexId::from_index(i),
                    distance_squared: d2,
                });
            }
        }
        best
    }

    /// Nearest wireframe edge within `radius` of `center`.
    pub fn closest_edge_in_sphere(&self, center: &Point3d, radius: f64) -> Option<ProximityHit<EdgeId>> {
        let mut best: Option<ProximityHit<EdgeId>> = None;
        for (i, seg) in self.edge_segments() {
            let d2 = seg.distance_squared_to_point(center);
            if d2 <= radius * radius && best.is_none_or(|b| d2 < b.distance_squared) {
                best = Some(ProximityHit {
                    id: EdgeId(i as u32),
                    distance_squared: d2,
                });
            }
        }
        best
    }

    /// First position the swept sphere touches. `t` is where the sphere
    /// surface reaches the vertex, never before the sweep start; a vertex
    /// already inside the sphere at the start hits at `t = 0`.
    pub fn closest_vertex_swept(&self, sweep: &SweptSphere) -> Option<SweepHit<VertexId>> {
        let r2 = sweep.radius * sweep.radius;
        let mut best: Option<SweepHit<VertexId>> = None;
        for (i, p) in self.positions.iter().enumerate() {
            // Entry and exit of the center path through the sphere around `p`.
            let rel = *p - sweep.start;
            let along = rel.dot(&sweep.direction);
            let disc = along * along - (rel.length_squared() - r2);
            if disc.is_nan() || disc <= 0.0 {
                continue;
            }
            let half_chord = disc.sqrt();
            let (entry, exit) = (along - half_chord, along + half_chord);
            if exit < 0.0 || entry > sweep.length {
                continue;
            }
            let t = entry.max(0.0);
            if best.is_none_or(|b| t < b.t) {
                best = Some(SweepHit {
                    id: VertexId::from_index(i),
                    t,
                });
            }
        }
        best
    }

    /// First wireframe edge the swept sphere touches. `t` is the sweep
    /// position of closest approach to the edge.
    pub fn closest_edge_swept(&self, sweep: &SweptSphere) -> Option<SweepHit<EdgeId>> {
        let path = sweep.path();
        let r2 = sweep.radius * sweep.radius;
        let mut best: Option<SweepHit<EdgeId>> = None;
        for (i, seg) in self.edge_segments() {
            let closest = path.closest_points(&seg);
            if closest.distance_squared >= r2 {
                continue;
            }
            let t = closest.s * sweep.length;
            if best.is_none_or(|b| t < b.t) {
                best = Some(SweepHit {
                    id: EdgeId(i as u32),
                    t,
                });
            }
        }
        best
    }

    /// First triangle the sweep's center path passes through. `t` is where
    /// the path crosses the triangle's plane; the crossing point must lie
    /// inside the triangle.
    ///
    /// Sweeps running nearly parallel to a triangle's plane skip it.
    pub fn closest_triangle_swept(&self, sweep: &SweptSphere) -> Option<SweepHit<TriangleId>> {
        let parallel = crate::default_tolerance().sweep_parallel;
        let mut best: Option<SweepHit<TriangleId>> = None;
        for (id, tri) in self.live_triangles() {
            let [p0, p1, p2] = self.corners(tri);
            let Some(n) = unit_normal(&p0, &p1, &p2) else {
                continue;
            };
            let rate = sweep.direction.dot(&n);
            if rate.abs() < parallel {
                continue;
            }
            let t = n.dot(&(p0 - sweep.start)) / rate;
            if !(0.0..=sweep.length).contains(&t) {
                continue;
            }
            let crossing = sweep.start + sweep.direction * t;
            let (_, inside) = nearest_point_in_triangle(&crossing, &p0, &p1, &p2);
            if inside && best.is_none_or(|b| t < b.t) {
                best = Some(SweepHit { id, t });
            }
        }
        best
    }

    /// Vertex nearest `screen_point` (normalized device coordinates) after
    /// projection through `view_proj`.
    ///
    /// Vertices behind the eye, outside the depth range `[0, 1]` or outside
    /// the unit screen square are ignored, as are those whose squared screen
    /// distance is not below `threshold_sqr`. Equal distances go to the
    /// vertex nearer the camera.
    pub fn closest_vertex_screen(
        &self,
        view_proj: &Transform,
        threshold_sqr: f64,
        screen_point: &Point2d,
    ) -> Option<ScreenHit> {
        let mut best: Option<ScreenHit> = None;
        for (i, p) in self.positions.iter().enumerate() {
            let [x, y, z, w] = view_proj.transform_homogeneous(p);
            if w.is_nan() || w <= 0.0 {
                continue;
            }
            let (sx, sy, depth) = (x / w, y / w, z / w);
            if !(0.0..=1.0).contains(&depth) || sx.abs() > 1.0 || sy.abs() > 1.0 {
                continue;
            }
            let d2 = (sx - screen_point.x).powi(2) + (sy - screen_point.y).powi(2);
            if d2 >= threshold_sqr {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => d2 < b.distance_squared || (d2 == b.distance_squared && depth < b.depth),
            };
            if better {
                best = Some(ScreenHit {
                    id: VertexId::from_index(i),
                    distance_squared: d2,
                    depth,
                });
            }
        }
        best
    }

    /// Total triangle area, optionally after a per-axis scale. Triangles
    /// whose area is not a number are left out.
    pub fn surface_area(&self, scale: Option<Vec3>) -> f64 {
        self.live_triangles()
            .map(|(_, tri)| {
                let [p0, p1, p2] = self.corners(tri);
                let (e1, e2) = match scale {
                    Some(s) => ((p1 - p0).scale_by(&s), (p2 - p0).scale_by(&s)),
                    None => (p1 - p0, p2 - p0),
                };
                0.5 * e1.cross(&e2).length()
            })
            .filter(|a| !a.is_nan())
            .sum()
    }

    /// Area projected onto the YZ, XZ and XY planes, as `(x, y, z)`.
    pub fn surface_area_components(&self) -> Vec3 {
        let mut total = Vec3::ZERO;
        for (_, tri) in self.live_triangles() {
            let [p0, p1, p2] = self.corners(tri);
            let n = (p1 - p0).cross(&(p2 - p0)).abs() * 0.5;
            if n.is_finite() {
                total += n;
            }
        }
        total
    }

    /// Edge endpoints per unit of edge length: `2 * edges / total length`
    /// over the distinct edges. Zero for a mesh without edge length.
    pub fn vertex_density(&self) -> f64 {
        let edges = self.edge_set();
        let total: f64 = edges
            .iter()
            .map(|e| {
                let (a, b) = e.vertices();
                self.positions[a.index()].distance_to(&self.positions[b.index()])
            })
            .filter(|l| !l.is_nan())
            .sum();
        if total > 0.0 {
            (edges.len() * 2) as f64 / total
        } else {
            0.0
        }
    }

    /// Distinct unordered edges of the wireframe.
    pub fn edge_set(&self) -> HashSet<Edge> {
        self.wireframe.iter().map(|pair| Edge::from(*pair)).collect()
    }

    /// Tight bounds of every position; unseeded for an empty mesh.
    pub fn bounds(&self) -> AlignedBox {
        AlignedBox::from_points(&self.positions)
    }

    /// Live triangles overlapping `volume`.
    pub fn triangles_in_volume(&self, volume: &impl VolumeQuery) -> Vec<TriangleId> {
        self.live_triangles()
            .filter(|(_, tri)| {
                let [p0, p1, p2] = self.corners(tri);
                volume.intersects_triangle(&p0, &p1, &p2)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Vertices lying inside `volume`, in index order.
    pub fn vertices_in_volume(&self, volume: &impl VolumeQuery) -> Vec<VertexId> {
        self.positions
            .iter()
            .enumerate()
            .filter(|(_, p)| volume.intersects_point(p, 0.0))
            .map(|(i, _)| VertexId::from_index(i))
            .collect()
    }

    /// Wireframe edges with any part inside `volume`.
    pub fn edges_in_volume(&self, volume: &impl VolumeQuery) -> Vec<EdgeId> {
        self.edge_segments()
            .filter(|(_, seg)| volume.intersects_segment(&seg.start, &seg.end))
            .map(|(i, _)| EdgeId(i as u32))
            .collect()
    }

    /// Live triangles with an angle strictly above 90 degrees. Right
    /// triangles are not included.
    pub fn obtuse_triangles(&self) -> Vec<TriangleId> {
        self.live_triangles()
            .filter(|(_, tri)| {
                let [p0, p1, p2] = self.corners(tri);
                (p1 - p0).dot(&(p2 - p0)) < 0.0
                    || (p2 - p1).dot(&(p0 - p1)) < 0.0
                    || (p0 - p2).dot(&(p1 - p2)) < 0.0
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn edge_segments(&self) -> impl Iterator<Item = (usize, Segment)> + '_ {
        self.wireframe.iter().enumerate().map(|(i, [a, b])| {
            (
                i,
                Segment::new(self.positions[a.index()], self.positions[b.index()]),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{grid, quad};
    use super::*;
    use crate::geometry::frustum::Frustum;

    fn single_vertex() -> Mesh {
        Mesh::from_triangles(vec![Point3d::ORIGIN], &[]).unwrap()
    }

    fn z_sweep(radius: f64) -> SweptSphere {
        SweptSphere::new(Point3d::new(0.0, 0.0, -10.0), Vec3::Z, 20.0, radius).unwrap()
    }

    // ─── Nearest point ──────────────────────────────────────────────

    #[test]
    fn test_nearest_point_interior() {
        let (a, b, c) = (
            Point3d::ORIGIN,
            Point3d::new(4.0, 0.0, 0.0),
            Point3d::new(0.0, 4.0, 0.0),
        );
        let (q, inside) = nearest_point_in_triangle(&Point3d::new(1.0, 1.0, 0.0), &a, &b, &c);
        assert!(inside);
        assert!((q.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_point_snaps_to_edge_and_corner() {
        let (a, b, c) = (
            Point3d::ORIGIN,
            Point3d::new(4.0, 0.0, 0.0),
            Point3d::new(0.0, 4.0, 0.0),
        );
        let (q, inside) = nearest_point_in_triangle(&Point3d::new(2.0, -3.0, 0.0), &a, &b, &c);
        assert!(!inside);
        assert!((q.x - 2.0).abs() < 1e-12 && q.y.abs() < 1e-12);

        // Outside two edges at once: the corner region.
        let (q, _) = nearest_point_in_triangle(&Point3d::new(-1.0, -1.0, 0.0), &a, &b, &c);
        assert!(q.distance_to(&a) < 1e-12);

        // Left of the triangle, nearest an edge interior.
        let (q, _) = nearest_point_in_triangle(&Point3d::new(-1.0, 2.0, 0.0), &a, &b, &c);
        assert!((q.x).abs() < 1e-12 && (q.y - 2.0).abs() < 1e-12);
    }

    // ─── Static queries ─────────────────────────────────────────────

    #[test]
    fn test_closest_triangle_above_quad() {
        let mesh = quad();
        let hit = mesh.closest_triangle(&Point3d::new(0.8, 0.2, 0.5), 10.0).unwrap();
        assert_eq!(hit.id, TriangleId(0));
        assert!((hit.distance_squared - 0.25).abs() < 1e-12);
        assert!(mesh.closest_triangle(&Point3d::new(0.8, 0.2, 0.5), 0.4).is_none());
    }

    #[test]
    fn test_closest_triangle_outside_footprint() {
        let mesh = quad();
        let hit = mesh.closest_triangle(&Point3d::new(3.0, 0.5, 0.0), 10.0).unwrap();
        assert!((hit.distance_squared - 4.0).abs() < 1e-12);
        assert!((hit.point.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_closest_vertex_and_edge_in_sphere() {
        let mesh = quad();
        let v = mesh.closest_vertex_in_sphere(&Point3d::new(0.9, 0.9, 0.0), 0.5).unwrap();
        assert_eq!(v.id, VertexId(2));
        assert!(mesh.closest_vertex_in_sphere(&Point3d::new(0.5, 0.5, 0.0), 0.1).is_none());

        let e = mesh.closest_edge_in_sphere(&Point3d::new(0.5, 0.45, 0.0), 0.2).unwrap();
        let pair = mesh.edge(e.id).unwrap();
        assert_eq!(Edge::from(pair), Edge::new(VertexId(0), VertexId(2)));
    }

    // ─── Swept queries ──────────────────────────────────────────────

    #[test]
    fn test_swept_vertex_entry_parameter() {
        let hit = single_vertex().closest_vertex_swept(&z_sweep(0.5)).unwrap();
        assert_eq!(hit.id, VertexId(0));
        assert!((hit.t - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_swept_vertex_entry_near_sweep_end() {
        // The center stops short of the vertex but the sphere reaches it.
        let mesh = Mesh::from_triangles(vec![Point3d::new(0.0, 0.0, 10.4)], &[]).unwrap();
        let hit = mesh.closest_vertex_swept(&z_sweep(0.5)).unwrap();
        assert!((hit.t - 19.9).abs() < 1e-9);

        let beyond = Mesh::from_triangles(vec![Point3d::new(0.0, 0.0, 10.6)], &[]).unwrap();
        assert!(beyond.closest_vertex_swept(&z_sweep(0.5)).is_none());
    }

    #[test]
    fn test_swept_vertex_inside_at_start() {
        let mesh = Mesh::from_triangles(vec![Point3d::new(0.0, 0.1, -9.8)], &[]).unwrap();
        let hit = mesh.closest_vertex_swept(&z_sweep(0.5)).unwrap();
        assert_eq!(hit.t, 0.0);

        let behind = Mesh::from_triangles(vec![Point3d::new(0.0, 0.0, -10.6)], &[]).unwrap();
        assert!(behind.closest_vertex_swept(&z_sweep(0.5)).is_none());
    }

    #[test]
    fn test_swept_vertex_miss() {
        let mesh = Mesh::from_triangles(vec![Point3d::new(1.0, 0.0, 0.0)], &[]).unwrap();
        assert!(mesh.closest_vertex_swept(&z_sweep(0.5)).is_none());
    }

    #[test]
    fn test_swept_vertex_earliest_wins() {
        let mesh = Mesh::from_triangles(
            vec![Point3d::new(0.0, 0.0, 5.0), Point3d::new(0.1, 0.0, -2.0)],
            &[],
        )
        .unwrap();
        assert_eq!(mesh.closest_vertex_swept(&z_sweep(0.5)).unwrap().id, VertexId(1));
    }

    #[test]
    fn test_swept_edge() {
        let mut mesh = Mesh::from_triangles(
            vec![Point3d::new(-1.0, 0.2, 3.0), Point3d::new(1.0, 0.2, 3.0)],
            &[],
        )
        .unwrap();
        mesh.wireframe.push([VertexId(0), VertexId(1)]);
        let hit = mesh.closest_edge_swept(&z_sweep(0.5)).unwrap();
        assert_eq!(hit.id, EdgeId(0));
        assert!((hit.t - 13.0).abs() < 1e-9);
        assert!(mesh.closest_edge_swept(&z_sweep(0.1)).is_none());
    }

    #[test]
    fn test_swept_triangle_face_contact() {
        let mut mesh = grid(2);
        let t = Transform::rotation_x(-std::f64::consts::FRAC_PI_2);
        mesh.positions.iter_mut().for_each(|p| *p = t.transform_point(p));
        // Grid now lies in z = 0; the center path crosses it at t = 10.
        let sweep = SweptSphere::new(Point3d::new(0.3, 0.1, -10.0), Vec3::Z, 20.0, 0.5).unwrap();
        let hit = mesh.closest_triangle_swept(&sweep).unwrap();
        assert!((hit.t - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_swept_triangle_start_within_radius() {
        // Starts 0.3 above the quad, closer than the radius.
        let sweep = SweptSphere::new(
            Point3d::new(0.6, 0.3, 0.3),
            Vec3::new(0.0, 0.0, -1.0),
            20.0,
            0.5,
        )
        .unwrap();
        let hit = quad().closest_triangle_swept(&sweep).unwrap();
        assert_eq!(hit.id, TriangleId(0));
        assert!((hit.t - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_swept_triangle_moving_away() {
        let sweep = SweptSphere::new(Point3d::new(0.6, 0.3, 0.3), Vec3::Z, 20.0, 0.5).unwrap();
        assert!(quad().closest_triangle_swept(&sweep).is_none());
    }

    #[test]
    fn test_swept_triangle_parallel_skipped() {
        let mesh = quad();
        let sweep = SweptSphere::new(Point3d::new(-5.0, 0.5, 0.0), Vec3::X, 20.0, 0.5).unwrap();
        assert!(mesh.closest_triangle_swept(&sweep).is_none());
    }

    // ─── Screen query ───────────────────────────────────────────────

    #[test]
    fn test_screen_pick_prefers_nearer_depth() {
        let proj = Transform::perspective(std::f64::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
        let mesh = Mesh::from_triangles(
            vec![
                Point3d::new(0.0, 0.0, -50.0),
                Point3d::new(0.0, 0.0, -5.0),
                Point3d::new(0.0, 0.0, 5.0),
                Point3d::new(0.0, 0.0, -500.0),
            ],
            &[],
        )
        .unwrap();
        let hit = mesh.closest_vertex_screen(&proj, 0.01, &Point2d::ORIGIN).unwrap();
        assert_eq!(hit.id, VertexId(1));
        assert!(hit.distance_squared < 1e-18);
    }

    #[test]
    fn test_screen_pick_threshold() {
        let proj = Transform::perspective(std::f64::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
        let mesh = Mesh::from_triangles(vec![Point3d::new(5.0, 0.0, -10.0)], &[]).unwrap();
        // Projects to x = 0.5.
        assert!(mesh.closest_vertex_screen(&proj, 0.2, &Point2d::ORIGIN).is_none());
        assert!(mesh.closest_vertex_screen(&proj, 0.3, &Point2d::ORIGIN).is_some());
    }

    // ─── Diagnostics ────────────────────────────────────────────────

    #[test]
    fn test_surface_area() {
        let mesh = quad();
        assert!((mesh.surface_area(None) - 1.0).abs() < 1e-12);
        assert!((mesh.surface_area(Some(Vec3::new(2.0, 3.0, 1.0))) - 6.0).abs() < 1e-12);
        let c = mesh.surface_area_components();
        assert!((c.z - 1.0).abs() < 1e-12 && c.x.abs() < 1e-12);
    }

    #[test]
    fn test_vertex_density() {
        let mesh = quad();
        let expected = 10.0 / (4.0 + 2f64.sqrt());
        assert!((mesh.vertex_density() - expected).abs() < 1e-12);
        assert_eq!(Mesh::new().vertex_density(), 0.0);
    }

    #[test]
    fn test_bounds_and_volume_cull() {
        let mesh = grid(4);
        let b = mesh.bounds();
        assert!((b.min.x + 2.0).abs() < 1e-12 && (b.max.z - 2.0).abs() < 1e-12);

        let volume = AlignedBox::from_min_max(Point3d::new(0.2, -1.0, 0.2), Point3d::new(0.8, 1.0, 0.8));
        let hits = mesh.triangles_in_volume(&volume);
        assert_eq!(hits.len(), 2);

        let frustum = Frustum::from_box(&volume);
        assert_eq!(mesh.triangles_in_volume(&frustum), hits);
    }

    #[test]
    fn test_vertices_in_volume() {
        let mesh = grid(2);
        let volume = AlignedBox::from_min_max(Point3d::new(-0.5, -1.0, -0.5), Point3d::new(1.5, 1.0, 0.5));
        // Only the center and its +X neighbour fall inside.
        assert_eq!(mesh.vertices_in_volume(&volume), vec![VertexId(4), VertexId(5)]);

        let frustum = Frustum::from_box(&volume);
        assert_eq!(mesh.vertices_in_volume(&frustum), vec![VertexId(4), VertexId(5)]);
    }

    #[test]
    fn test_edges_in_volume() {
        let mut mesh = Mesh::from_triangles(
            vec![
                Point3d::new(-2.0, 0.0, 0.0),
                Point3d::new(2.0, 0.0, 0.0),
                Point3d::new(-2.0, 3.0, 0.0),
                Point3d::new(2.0, 3.0, 0.0),
            ],
            &[],
        )
        .unwrap();
        mesh.wireframe.push([VertexId(0), VertexId(1)]);
        mesh.wireframe.push([VertexId(2), VertexId(3)]);
        // The first edge crosses the box with both ends outside.
        let volume = AlignedBox::from_min_max(Point3d::new(-1.0, -1.0, -1.0), Point3d::new(1.0, 1.0, 1.0));
        assert_eq!(mesh.edges_in_volume(&volume), vec![EdgeId(0)]);
        assert_eq!(mesh.edges_in_volume(&Frustum::from_box(&volume)), vec![EdgeId(0)]);
    }

    #[test]
    fn test_obtuse_triangles() {
        let mut mesh = Mesh::from_triangles(
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
                Point3d::new(3.0, 0.2, 0.0),
                Point3d::new(0.5, 0.8, 0.0),
            ],
            &[[0, 1, 2], [0, 3, 4], [1, 3, 2]],
        )
        .unwrap();
        // Right triangle 0 is excluded; 1 and 2 each have a wide corner.
        assert_eq!(mesh.obtuse_triangles(), vec![TriangleId(1), TriangleId(2)]);

        mesh.mark_triangles(&[TriangleId(1)]).unwrap();
        assert_eq!(mesh.obtuse_triangles(), vec![TriangleId(2)]);
    }
}
