pub mod point;
pub mod vector;
pub mod transform;
pub mod plane;
pub mod aabb;
pub mod segment;
pub mod frustum;
