use std::collections::{BTreeMap, HashSet};

use tracing::{debug, instrument, warn};

use super::{EdgeId, Mesh, MeshError, TriangleId, VertexId, derive_wireframe};
use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::vector::Vec3;

/// Squared search radius of [`Mesh::merge_vertex_into_nearest`].
const MERGE_SEARCH_RADIUS_SQ: f64 = 10_000.0;

/// Quantization of the coordinate sum used to bucket weld candidates.
const WELD_BUCKET_SCALE: f64 = 100.0;

/// Outcome of a weld pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WeldReport {
    /// Positions left after the weld.
    pub unique: usize,
    /// Positions folded into an earlier representative.
    pub merged: usize,
    /// Old vertex index to new vertex id.
    pub remap: Vec<VertexId>,
}

/// Outcome of a compaction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compaction {
    pub removed_triangles: usize,
    pub removed_vertices: usize,
    /// Old vertex index to new vertex id; `None` for dropped vertices.
    pub remap: Vec<Option<VertexId>>,
}

impl Compaction {
    pub fn is_noop(&self) -> bool {
        self.removed_triangles == 0 && self.removed_vertices == 0
    }
}

fn weld_bucket(p: &Point3d) -> i64 {
    ((p.x + p.y + p.z) * WELD_BUCKET_SCALE).round() as i64
}

impl Mesh {
    /// Merge positions closer than `threshold` into one.
    ///
    /// Vertices are visited in index order. Each one either joins the first
    /// already-accepted position within `threshold` or becomes a new
    /// representative. The merge is greedy and order-dependent: a cluster
    /// takes the first-visited vertex as its representative, and later
    /// vertices join it even when they are not within `threshold` of each
    /// other. Reordering the vertex list can change the result.
    ///
    /// Candidates are bucketed by `round((x + y + z) * 100)` and looked up
    /// in the neighbouring buckets too, so thresholds up to about `0.005`
    /// are searched exhaustively.
    #[instrument(skip(self), fields(vertices = self.positions.len()))]
    pub fn weld_vertices(&mut self, threshold: f64) -> Result<WeldReport, MeshError> {
        if threshold.is_nan() || threshold < 0.0 {
            warn!(threshold, "weld rejected");
            return Err(MeshError::InvalidParameter {
                name: "weld threshold",
                value: threshold,
            });
        }

        let mut buckets: BTreeMap<i64, Vec<VertexId>> = BTreeMap::new();
        let mut unique: Vec<Point3d> = Vec::with_capacity(self.positions.len());
        let mut representatives: Vec<usize> = Vec::with_capacity(self.positions.len());
        let mut remap = Vec::with_capacity(self.positions.len());

        for (old, p) in self.positions.iter().enumerate() {
            let key = weld_bucket(p);
            let window = key.saturating_sub(1)..=key.saturating_add(1);
            let found = buckets
                .range(window)
                .flat_map(|(_, ids)| ids.iter().copied())
                .find(|id| unique[id.index()].distance_to(p) <= threshold);

            let id = match found {
                Some(id) => id,
                None => {
                    let id = VertexId::from_index(unique.len());
                    unique.push(*p);
                    representatives.push(old);
                    buckets.entry(key).or_default().push(id);
                    id
                }
            };
            remap.push(id);
        }

        let merged = self.positions.len() - unique.len();
        if merged > 0 {
            for tri in self.triangles.iter_mut().filter(|t| !t[0].is_sentinel()) {
                for v in tri.iter_mut() {
                    *v = remap[v.index()];
                }
            }
            if let Some(uvs) = &self.uvs {
                let kept: Vec<Point2d> = representatives.iter().map(|&i| uvs[i]).collect();
                self.uvs = Some(kept);
            }
            self.positions = unique;
            self.wireframe = derive_wireframe(&self.triangles);
            self.clear_frames();
        }

        debug!(merged, unique = self.positions.len(), "weld complete");
        Ok(WeldReport {
            unique: self.positions.len(),
            merged,
            remap,
        })
    }

    /// Tag triangles for removal. Array lengths are unchanged until
    /// [`compact`](Self::compact) runs. Returns the number newly tagged.
    pub fn mark_triangles(&mut self, ids: &[TriangleId]) -> Result<usize, MeshError> {
        for &id in ids {
            self.check_triangle(id)?;
        }
        let mut marked = 0;
        for &id in ids {
            marked += self.mark(id.index()) as usize;
        }
        Ok(marked)
    }

    /// Tag every triangle referencing any of `ids`.
    pub fn mark_triangles_with_vertices(&mut self, ids: &[VertexId]) -> Result<usize, MeshError> {
        for &id in ids {
            self.check_vertex(id)?;
        }
        let doomed: HashSet<VertexId> = ids.iter().copied().collect();
        let hits: Vec<usize> = self
            .live_triangles()
            .filter(|(_, tri)| tri.iter().any(|v| doomed.contains(v)))
            .map(|(id, _)| id.index())
            .collect();
        for &i in &hits {
            self.mark(i);
        }
        Ok(hits.len())
    }

    /// Tag every triangle containing both endpoints of any of the wireframe
    /// edges `ids`.
    pub fn mark_triangles_with_edges(&mut self, ids: &[EdgeId]) -> Result<usize, MeshError> {
        for &id in ids {
            self.check_edge(id)?;
        }
        let pairs: Vec<[VertexId; 2]> = ids.iter().map(|id| self.wireframe[id.index()]).collect();
        let hits: Vec<usize> = self
            .live_triangles()
            .filter(|(_, tri)| {
                pairs
                    .iter()
                    .any(|[a, b]| tri.contains(a) && tri.contains(b))
            })
            .map(|(id, _)| id.index())
            .collect();
        for &i in &hits {
            self.mark(i);
        }
        Ok(hits.len())
    }

    /// Drop tagged triangles and every vertex no surviving triangle
    /// references, renumbering survivors in their original order.
    #[instrument(skip(self), fields(vertices = self.positions.len(), triangles = self.triangles.len()))]
    pub fn compact(&mut self) -> Compaction {
        let mut referenced = vec![false; self.positions.len()];
        for (_, tri) in self.live_triangles() {
            for v in tri {
                referenced[v.index()] = true;
            }
        }

        let mut remap = Vec::with_capacity(self.positions.len());
        let mut next = 0usize;
        for &keep in &referenced {
            if keep {
                remap.push(Some(VertexId::from_index(next)));
                next += 1;
            } else {
                remap.push(None);
            }
        }

        let old_triangles = self.triangles.len();
        let old_vertices = self.positions.len();

        let mut slot = 0;
        self.positions.retain(|_| {
            slot += 1;
            referenced[slot - 1]
        });
        if let Some(uvs) = self.uvs.as_mut() {
            let mut slot = 0;
            uvs.retain(|_| {
                slot += 1;
                referenced[slot - 1]
            });
        }

        self.triangles.retain(|tri| !tri[0].is_sentinel());
        for tri in &mut self.triangles {
            for v in tri.iter_mut() {
                // Every id of a surviving triangle was marked referenced above.
                *v = remap[v.index()].unwrap_or(VertexId::SENTINEL);
            }
        }
        self.wireframe = derive_wireframe(&self.triangles);

        let compaction = Compaction {
            removed_triangles: old_triangles - self.triangles.len(),
            removed_vertices: old_vertices - self.positions.len(),
            remap,
        };
        if !compaction.is_noop() {
            self.clear_frames();
        }

        debug_assert!(self.validate().valid, "compaction broke mesh invariants");
        debug!(
            removed_triangles = compaction.removed_triangles,
            removed_vertices = compaction.removed_vertices,
            "compacted"
        );
        compaction
    }

    pub fn delete_triangles(&mut self, ids: &[TriangleId]) -> Result<Compaction, MeshError> {
        self.mark_triangles(ids)?;
        Ok(self.compact())
    }

    /// Remove every triangle touching any of `ids`, then every vertex left
    /// unreferenced.
    pub fn delete_vertices(&mut self, ids: &[VertexId]) -> Result<Compaction, MeshError> {
        self.mark_triangles_with_vertices(ids)?;
        Ok(self.compact())
    }

    /// Remove every triangle containing a deleted wireframe edge.
    pub fn delete_edges(&mut self, ids: &[EdgeId]) -> Result<Compaction, MeshError> {
        self.mark_triangles_with_edges(ids)?;
        Ok(self.compact())
    }

    /// Append a triangle. Each side joins the wireframe unless an entry
    /// already connects the same two vertices.
    pub fn add_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId) -> Result<TriangleId, MeshError> {
        for v in [a, b, c] {
            self.check_vertex(v)?;
        }
        let id = TriangleId(self.triangles.len() as u32);
        self.triangles.push([a, b, c]);
        for (p, q) in [(a, b), (b, c), (c, a)] {
            if self.edge_id_for_vertices(p, q).is_none() {
                self.wireframe.push([p, q]);
            }
        }
        self.clear_frames();
        Ok(id)
    }

    /// Append a position. A mesh carrying texture coordinates requires one
    /// for the new vertex; otherwise `uv` is ignored.
    pub fn add_vertex(&mut self, position: Point3d, uv: Option<Point2d>) -> Result<VertexId, MeshError> {
        if self.positions.len() + 1 >= u32::MAX as usize {
            return Err(MeshError::TooManyVertices {
                count: self.positions.len() + 1,
            });
        }
        if let Some(uvs) = self.uvs.as_mut() {
            uvs.push(uv.ok_or(MeshError::MissingTexCoords)?);
        }
        self.positions.push(position);
        self.clear_frames();
        Ok(VertexId::from_index(self.positions.len() - 1))
    }

    /// Move one vertex. Tangent frames are cleared since they no longer
    /// match the surface.
    pub fn set_position(&mut self, id: VertexId, position: Point3d) -> Result<(), MeshError> {
        self.check_vertex(id)?;
        self.positions[id.index()] = position;
        self.clear_frames();
        Ok(())
    }

    /// Add `offset` to each listed vertex once, even when an id repeats.
    /// Nothing moves unless every id is in range.
    pub fn translate_vertices(&mut self, ids: &[VertexId], offset: Vec3) -> Result<(), MeshError> {
        for &id in ids {
            self.check_vertex(id)?;
        }
        let unique: HashSet<VertexId> = ids.iter().copied().collect();
        for id in &unique {
            let p = &mut self.positions[id.index()];
            *p = *p + offset;
        }
        if !unique.is_empty() {
            self.clear_frames();
        }
        Ok(())
    }

    /// Remove triangles with (near-)zero area or with a corner that is not
    /// finite or lies beyond single-precision range.
    #[instrument(skip(self), fields(triangles = self.triangles.len()))]
    pub fn prune_invalid_triangles(&mut self) -> Compaction {
        let tol = crate::default_tolerance();
        let doomed: Vec<usize> = self
            .live_triangles()
            .filter(|(_, tri)| {
                let [p0, p1, p2] = self.corners(tri);
                if !(p0.is_valid() && p1.is_valid() && p2.is_valid()) {
                    return true;
                }
                tol.is_degenerate_area(0.5 * (p1 - p0).cross(&(p2 - p0)).length())
            })
            .map(|(id, _)| id.index())
            .collect();
        for &i in &doomed {
            self.mark(i);
        }
        debug!(invalid = doomed.len(), "pruning invalid triangles");
        self.compact()
    }

    /// Collapse `id` onto the nearest other position within a search radius
    /// of 100 units.
    ///
    /// Triangles using `id` are rewritten to the nearest vertex; those that
    /// already use both would collapse and are removed. Returns the merged
    /// vertex's id after compaction, or `None` when nothing is in range.
    #[instrument(skip(self))]
    pub fn merge_vertex_into_nearest(&mut self, id: VertexId) -> Result<Option<VertexId>, MeshError> {
        self.check_vertex(id)?;
        let origin = self.positions[id.index()];

        let mut best: Option<(VertexId, f64)> = None;
        for (i, p) in self.positions.iter().enumerate() {
            if i == id.index() {
                continue;
            }
            let d2 = origin.distance_squared_to(p);
            if d2 < MERGE_SEARCH_RADIUS_SQ && best.is_none_or(|(_, b)| d2 < b) {
                best = Some((VertexId::from_index(i), d2));
            }
        }
        let Some((nearest, _)) = best else {
            debug!("no vertex within merge radius");
            return Ok(None);
        };

        let mut collapsed = Vec::new();
        for (i, tri) in self.triangles.iter_mut().enumerate() {
            if tri[0].is_sentinel() || !tri.contains(&id) {
                continue;
            }
            if tri.contains(&nearest) {
                collapsed.push(i);
            } else {
                for v in tri.iter_mut().filter(|v| **v == id) {
                    *v = nearest;
                }
            }
        }
        for &i in &collapsed {
            self.mark(i);
        }

        let compaction = self.compact();
        debug!(?nearest, collapsed = collapsed.len(), "vertex merged");
        Ok(compaction.remap[nearest.index()])
    }

    /// Overwrite a triangle slot with the sentinel. Returns whether the slot
    /// was live.
    pub(crate) fn mark(&mut self, index: usize) -> bool {
        let tri = &mut self.triangles[index];
        let live = !tri[0].is_sentinel();
        *tri = [VertexId::SENTINEL; 3];
        live
    }
}
