//! Force-directed 3-D layout on the unit sphere.

pub mod engine;
pub mod vector;

pub use engine::{anneal_speed, pair_factor, ForceLayout, Group, PairKind, Vertex};
pub use vector::Vec3;
