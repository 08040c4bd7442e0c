//! Planar Boolean helpers used by mesh edits.

pub mod polygon;

pub use polygon::{DropAxis, tri_minus_poly};
