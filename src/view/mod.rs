//! View transform, projection and the drawable scene.

pub mod color;
pub mod matrix;
pub mod projection;
pub mod scene;
pub mod state;

pub use matrix::Mat4;
pub use projection::{depth_order, Projection, ViewTransform};
pub use scene::{Circle, GroupLabel, RelationMode, Scene, SceneOptions, Segment, SelectionInfo};
pub use state::ViewState;
