//! Shared types for mesh validation.
//!
//! Defines error codes, severity levels, entity references, validation
//! errors, metrics and the `ValidationReport`.

use std::fmt;

use crate::mesh::{EdgeId, TriangleId, VertexId};

/// Which validation levels to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationLevel {
    /// Index ranges, wireframe consistency, texture coordinate count.
    Topology,
    /// Adds finite positions and triangle area checks.
    Geometry,
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Breaks a mesh invariant.
    Error,
    /// Legal mid-edit, or geometry that queries will skip.
    Warning,
}

/// The mesh element a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    Vertex(VertexId),
    Triangle(TriangleId),
    Edge(EdgeId),
    Mesh,
}

/// Enumeration of all validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // --- Topology ---
    /// A triangle references a vertex past the end of the position list.
    IndexOutOfRange,
    /// A wireframe entry references a missing vertex or no live triangle side.
    DanglingWireframe,
    /// Triangles are marked for removal and not yet compacted.
    PendingRemoval,
    /// Texture coordinate count differs from the vertex count.
    UvCountMismatch,
    /// A live triangle side has no wireframe entry.
    WireframeNotDerived,
    /// Two wireframe entries connect the same vertex pair.
    DuplicateWireframeEdge,

    // --- Geometry ---
    /// A position is not finite or exceeds single precision range.
    NonFiniteVertex,
    /// A triangle has (near-)zero area.
    DegenerateTriangle,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single validation finding (error or warning).
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub entity_id: EntityId,
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    pub severity: Severity,
    /// Measured value, e.g. a triangle area.
    pub numeric_value: Option<f64>,
    /// The threshold the measured value was held against.
    pub tolerance: Option<f64>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        write!(f, "[{}] {:?}: {} (code: {})", sev, self.entity_id, self.message, self.code)?;
        if let Some(val) = self.numeric_value {
            write!(f, " value={val:.2e}")?;
        }
        if let Some(tol) = self.tolerance {
            write!(f, " tol={tol:.2e}")?;
        }
        Ok(())
    }
}

/// Element counts of a mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityCounts {
    pub vertices: usize,
    pub triangles: usize,
    /// Triangles not marked for removal.
    pub live_triangles: usize,
    pub edges: usize,
    /// Vertices no live triangle references.
    pub unreferenced_vertices: usize,
}

/// Aggregate metrics computed during validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationMetrics {
    pub entity_counts: EntityCounts,
    /// Smallest live triangle area seen by the geometry level.
    pub min_triangle_area: Option<f64>,
}

/// The report produced by `MeshValidator`.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the mesh passed all checks at the requested level.
    pub valid: bool,
    /// The highest level that was actually run.
    pub level_completed: ValidationLevel,
    /// All errors (severity = Error).
    pub errors: Vec<ValidationError>,
    /// All warnings (severity = Warning).
    pub warnings: Vec<ValidationError>,
    pub metrics: ValidationMetrics,
}

impl ValidationReport {
    /// Filter errors by a specific error code.
    pub fn errors_of(&self, code: ErrorCode) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.code == code).collect()
    }

    pub fn warnings_of(&self, code: ErrorCode) -> Vec<&ValidationError> {
        self.warnings.iter().filter(|e| e.code == code).collect()
    }

    /// Check that no errors of a specific code exist.
    pub fn no_errors_of(&self, code: ErrorCode) -> bool {
        !self.errors.iter().any(|e| e.code == code)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ValidationReport: valid={}, level={:?}, errors={}, warnings={}",
            self.valid,
            self.level_completed,
            self.errors.len(),
            self.warnings.len()
        )?;
        for e in &self.errors {
            writeln!(f, "  {e}")?;
        }
        for w in &self.warnings {
            writeln!(f, "  {w}")?;
        }
        Ok(())
    }
}
