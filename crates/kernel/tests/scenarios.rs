//! End-to-end scenarios: editing, querying and cutting a mesh the way a
//! scene editor drives the kernel.

use scene_kernel::geometry::aabb::AlignedBox;
use scene_kernel::geometry::frustum::Frustum;
use scene_kernel::geometry::point::{Point2d, Point3d};
use scene_kernel::geometry::transform::Transform;
use scene_kernel::geometry::vector::Vec3;
use scene_kernel::mesh::{EdgeId, Mesh, MeshError, SweptSphere, TriangleId, VertexId};
use scene_kernel::validation::{ErrorCode, MeshValidator, ValidationConfig};
use scene_kernel::{DropAxis, VolumeQuery, tri_minus_poly};

/// `n` x `n` unit cells in the XZ plane, centered on the origin, facing +Y.
fn floor(n: u32) -> Mesh {
    let half = n as f64 / 2.0;
    let mut positions = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3d::new(i as f64 - half, 0.0, j as f64 - half));
        }
    }
    let row = n + 1;
    let mut tris = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            tris.push([a, a + row, a + 1]);
            tris.push([a + 1, a + row, a + row + 1]);
        }
    }
    Mesh::from_triangles(positions, &tris).unwrap()
}

fn unit_box() -> AlignedBox {
    AlignedBox::from_min_max(Point3d::new(-1.0, -1.0, -1.0), Point3d::new(1.0, 1.0, 1.0))
}

// ─── Editing ────────────────────────────────────────────────────────────

#[test]
fn weld_two_close_points() {
    let mut mesh = Mesh::from_triangles(
        vec![Point3d::new(0.0, 0.0, 0.0), Point3d::new(0.01, 0.0, 0.0)],
        &[],
    )
    .unwrap();
    let report = mesh.weld_vertices(0.02).unwrap();
    assert_eq!(report.unique, 1);
    assert_eq!(report.merged, 1);
    assert_eq!(report.remap, vec![VertexId(0), VertexId(0)]);
    assert_eq!(mesh.vertex_count(), 1);
}

#[test]
fn weld_stitches_split_seam() {
    // Two cells sharing an edge, built with their own copies of the seam.
    let mut mesh = Mesh::from_triangles(
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 1.0),
            Point3d::new(0.0, 0.0, 1.0),
        ],
        &[[0, 2, 1], [3, 5, 4]],
    )
    .unwrap();
    assert_eq!(mesh.edge_count(), 6);

    let report = mesh.weld_vertices(1e-4).unwrap();
    assert_eq!(report.merged, 2);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.edge_count(), 5);
    assert!(mesh.validate().valid);
}

#[test]
fn mark_then_compact_round() {
    let mut mesh = floor(3);
    let edge = mesh.edge_id_for_vertices(VertexId(0), VertexId(1)).unwrap();
    assert_eq!(mesh.mark_triangles_with_edges(&[edge]).unwrap(), 1);
    assert!(mesh.has_pending_removals());

    let pending = mesh.validate();
    assert!(pending.valid);
    assert_eq!(pending.warnings_of(ErrorCode::PendingRemoval).len(), 1);

    let compaction = mesh.compact();
    // The corner vertex belonged only to the removed triangle.
    assert_eq!(compaction.removed_triangles, 1);
    assert_eq!(compaction.removed_vertices, 1);
    assert_eq!(compaction.remap[0], None);
    assert_eq!(compaction.remap[1], Some(VertexId(0)));
    assert!(!mesh.has_pending_removals());
    assert_eq!(mesh.vertex_count(), 15);
    assert!(mesh.validate().valid);
}

#[test]
fn stale_ids_are_rejected() {
    let mut mesh = floor(1);
    let before = mesh.clone();
    assert_eq!(
        mesh.delete_triangles(&[TriangleId(0), TriangleId(7)]),
        Err(MeshError::TriangleOutOfRange { id: 7, count: 2 })
    );
    assert!(matches!(
        mesh.delete_edges(&[EdgeId(99)]),
        Err(MeshError::EdgeOutOfRange { id: 99, .. })
    ));
    assert_eq!(mesh, before);
}

#[test]
fn merge_corner_into_neighbour() {
    let mut mesh = floor(2);
    let merged = mesh.merge_vertex_into_nearest(VertexId(0)).unwrap();
    assert!(merged.is_some());
    assert_eq!(mesh.vertex_count(), 8);
    assert!(mesh.validate().valid);
}

#[test]
fn prune_drops_slivers_and_bad_positions() {
    let mut mesh = Mesh::from_triangles(
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(2.0, 1e-9, 0.0),
            Point3d::new(f64::NAN, 0.0, 0.0),
        ],
        &[[0, 1, 2], [0, 1, 3], [1, 2, 4]],
    )
    .unwrap();
    let full = MeshValidator::new(ValidationConfig::full()).validate(&mesh);
    assert!(!full.warnings_of(ErrorCode::DegenerateTriangle).is_empty());
    assert_eq!(full.warnings_of(ErrorCode::NonFiniteVertex).len(), 1);

    let compaction = mesh.prune_invalid_triangles();
    assert_eq!(compaction.removed_triangles, 2);
    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.vertex_count(), 3);
}

#[test]
fn marquee_select_then_raise() {
    let mut mesh = floor(4);
    let marquee = Frustum::from_box(&AlignedBox::from_min_max(
        Point3d::new(-0.5, -1.0, -0.5),
        Point3d::new(0.5, 1.0, 1.5),
    ));
    let picked = mesh.vertices_in_volume(&marquee);
    assert_eq!(picked, vec![VertexId(12), VertexId(17)]);
    assert!(!mesh.edges_in_volume(&marquee).is_empty());

    mesh.translate_vertices(&picked, Vec3::new(0.0, 2.0, 0.0)).unwrap();
    assert_eq!(mesh.positions()[12], Point3d::new(0.0, 2.0, 0.0));
    assert_eq!(mesh.positions()[17], Point3d::new(0.0, 2.0, 1.0));
    // Raised out of the marquee's slab.
    assert!(mesh.vertices_in_volume(&marquee).is_empty());
    assert!(mesh.validate().valid);
}

#[test]
fn dragging_a_vertex_makes_obtuse_cells() {
    let mut mesh = floor(4);
    assert!(mesh.obtuse_triangles().is_empty());

    mesh.set_position(VertexId(12), Point3d::new(0.9, 0.0, 0.9)).unwrap();
    let obtuse = mesh.obtuse_triangles();
    assert!(obtuse.contains(&TriangleId(20)));
    for id in obtuse {
        assert!(mesh.triangles()[id.index()].contains(&VertexId(12)));
    }
}

// ─── Queries ────────────────────────────────────────────────────────────

#[test]
fn swept_sphere_reaches_vertex() {
    let mesh = Mesh::from_triangles(vec![Point3d::ORIGIN], &[]).unwrap();
    let sweep = SweptSphere::new(Point3d::new(0.0, 0.0, -10.0), Vec3::Z, 20.0, 0.5).unwrap();
    let hit = mesh.closest_vertex_swept(&sweep).unwrap();
    assert_eq!(hit.id, VertexId(0));
    assert!((hit.t - 9.5).abs() < 1e-9);
}

#[test]
fn sphere_dropped_onto_floor() {
    let mesh = floor(4);
    let sweep = SweptSphere::new(Point3d::new(0.3, 5.0, 0.2), -Vec3::Y, 10.0, 0.25).unwrap();
    let hit = mesh.closest_triangle_swept(&sweep).unwrap();
    assert!((hit.t - 5.0).abs() < 1e-9);

    let short = SweptSphere::new(Point3d::new(0.3, 5.0, 0.2), -Vec3::Y, 4.0, 0.25).unwrap();
    assert!(mesh.closest_triangle_swept(&short).is_none());
}

#[test]
fn sweep_starting_inside_radius() {
    let mesh = floor(4);
    // The sphere already overlaps the floor and the nearest corner.
    let sweep = SweptSphere::new(Point3d::new(0.1, 0.1, 0.05), -Vec3::Y, 10.0, 0.25).unwrap();
    let tri = mesh.closest_triangle_swept(&sweep).unwrap();
    assert!((tri.t - 0.1).abs() < 1e-12);
    let vert = mesh.closest_vertex_swept(&sweep).unwrap();
    assert_eq!(vert.id, VertexId(12));
    assert_eq!(vert.t, 0.0);
}

#[test]
fn closest_triangle_under_cursor() {
    let mesh = floor(4);
    let hit = mesh.closest_triangle(&Point3d::new(0.25, 2.0, 0.6), 100.0).unwrap();
    assert!((hit.distance_squared - 4.0).abs() < 1e-12);
    assert!(hit.point.y.abs() < 1e-12);
    let [a, b, c] = mesh.triangle_positions(hit.id, None).unwrap();
    let (lo, hi) = (a.min(&b).min(&c), a.max(&b).max(&c));
    assert!(lo.x <= 0.25 && 0.25 <= hi.x && lo.z <= 0.6 && 0.6 <= hi.z);
}

#[test]
fn screen_pick_through_camera() {
    let mesh = floor(4);
    // Camera 10 units above the floor looking straight down.
    let view = Transform::rotation_x(std::f64::consts::FRAC_PI_2).then(&Transform::translation(0.0, 0.0, -10.0));
    let proj = Transform::perspective(std::f64::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
    let view_proj = view.then(&proj);

    let hit = mesh.closest_vertex_screen(&view_proj, 0.01, &Point2d::ORIGIN).unwrap();
    assert_eq!(mesh.position(hit.id), Some(Point3d::ORIGIN));
    assert!(hit.depth > 0.0 && hit.depth < 1.0);
}

#[test]
fn triangle_inside_unit_box_is_fully_cut() {
    let tri = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(0.1, 0.0, 0.0),
        Point3d::new(0.0, 0.1, 0.0),
    ];
    let square = [
        Point3d::new(-1.0, -1.0, 0.0),
        Point3d::new(1.0, -1.0, 0.0),
        Point3d::new(1.0, 1.0, 0.0),
        Point3d::new(-1.0, 1.0, 0.0),
    ];
    let cube = Frustum::from_box(&unit_box());
    assert!(cube.intersects_triangle(&tri[0], &tri[1], &tri[2]));
    assert!(tri_minus_poly(&tri, &square, DropAxis::Z).is_empty());
}

#[test]
fn segment_beyond_far_face_is_rejected() {
    let cube = Frustum::from_box(&unit_box());
    // Both ends past +Z share that outcode bit.
    let (a, b) = (Point3d::new(-5.0, 0.0, 5.0), Point3d::new(5.0, 0.0, 5.0));
    assert!(cube.clip_segment(&a, &b).is_none());

    let crossing = cube
        .clip_segment(&Point3d::new(-5.0, 0.0, 0.0), &Point3d::new(5.0, 0.0, 0.0))
        .unwrap();
    assert!((crossing.start.x + 1.0).abs() < 1e-9);
    assert!((crossing.end.x - 1.0).abs() < 1e-9);
}

#[test]
fn volume_culls_floor_cells() {
    let mesh = floor(4);
    let bb = AlignedBox::from_min_max(Point3d::new(0.2, -1.0, 0.2), Point3d::new(0.8, 1.0, 0.8));
    let by_box = mesh.triangles_in_volume(&bb);
    let by_frustum = mesh.triangles_in_volume(&Frustum::from_box(&bb));
    assert_eq!(by_box, by_frustum);
    assert_eq!(by_box.len(), 2);
    assert!(bb.intersects_box(&mesh.bounds()));
    assert!(!VolumeQuery::contains_box(&bb, &mesh.bounds()));
}

// ─── Hole cutting ───────────────────────────────────────────────────────

#[test]
fn cut_hole_through_textured_floor() {
    let mut mesh = floor(4);
    let uvs = mesh.positions().iter().map(|p| Point2d::new(p.x, p.z)).collect();
    mesh.set_uvs(uvs).unwrap();

    let cutter = Transform::uniform_scaling(0.5);
    let report = mesh.cut_box_hole(&cutter, 1e-6).unwrap();
    assert!(report.cut_triangles >= 6);
    assert!(report.added_triangles > 0);
    assert!((mesh.surface_area(None) - 15.0).abs() < 1e-6);
    assert!(mesh.validate().valid);

    // Nothing is left over the hole.
    let core = AlignedBox::from_min_max(Point3d::new(-0.4, -1.0, -0.4), Point3d::new(0.4, 1.0, 0.4));
    assert!(mesh.triangles_in_volume(&core).is_empty());

    let frames = mesh.compute_tangents_and_binormals().unwrap();
    assert!(frames.processed > 0);
    for (p, t) in mesh.positions().iter().zip(mesh.tangents()) {
        if p.x.abs().max(p.z.abs()) > 1.5 {
            assert!((t.x - 1.0).abs() < 1e-9, "tangent {t:?} at {p:?}");
        }
    }
}

#[test]
fn cut_hole_in_raised_moved_floor() {
    let mut mesh = floor(4);
    let lift = Transform::translation(10.0, 3.0, -4.0);
    let moved: Vec<Point3d> = mesh.positions().iter().map(|p| lift.transform_point(p)).collect();
    let tris: Vec<[u32; 3]> = mesh.triangles().iter().map(|t| t.map(|v| v.0)).collect();
    mesh = Mesh::from_triangles(moved, &tris).unwrap();

    let cutter = Transform::uniform_scaling(0.5).then(&lift);
    mesh.cut_box_hole(&cutter, 1e-6).unwrap();
    assert!((mesh.surface_area(None) - 15.0).abs() < 1e-6);
    for p in mesh.positions() {
        assert!((p.y - 3.0).abs() < 1e-9);
    }
}
