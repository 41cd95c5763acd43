//! Scene module - 3D scene description, camera and viewer state

pub mod builder;
pub mod camera;
mod state;

pub use builder::Scene;
pub use camera::{OrbitCamera, Viewport};
pub use state::{RefreshEvent, ViewerState};
