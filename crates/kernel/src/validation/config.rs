//! Configuration for mesh validation.

use super::types::ValidationLevel;

/// Thresholds for the geometry checks.
#[derive(Debug, Clone, Copy)]
pub struct ToleranceConfig {
    /// Triangles with a smaller area are reported as degenerate.
    pub degenerate_area: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            degenerate_area: crate::default_tolerance().degenerate_area,
        }
    }
}

/// Configuration controlling which checks are run and their parameters.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// The maximum validation level to run.
    pub level: ValidationLevel,
    pub tolerance: ToleranceConfig,
    /// Whether to compare the wireframe against the triangle sides.
    pub check_wireframe: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::topology()
    }
}

impl ValidationConfig {
    /// Invariant checks only; what every compaction asserts in debug builds.
    pub fn topology() -> Self {
        Self {
            level: ValidationLevel::Topology,
            tolerance: ToleranceConfig::default(),
            check_wireframe: true,
        }
    }

    /// Topology plus finite-position and triangle-area checks.
    pub fn full() -> Self {
        Self {
            level: ValidationLevel::Geometry,
            ..Self::topology()
        }
    }
}
