//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{to_color32, LoanPlotter};
pub use renderer::StaticPlotRenderer;
