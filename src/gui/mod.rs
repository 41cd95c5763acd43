//! GUI module - User interface components

mod app;
mod control_panel;
mod scene_viewer;

pub use app::LoanViewerApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use scene_viewer::SceneViewer;
