//! Chart Plotter Module
//! Interactive 2D scatter of the loan file using egui_plot.

use crate::data::{LoanRecord, LoanStatus};
use crate::scene::builder::{status_color, Rgb};
use egui::Color32;
use egui_plot::{Legend, Plot, PlotPoints, Points};

/// Convert a unit-range RGB triple to an egui color.
pub fn to_color32(rgb: Rgb) -> Color32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
}

/// `[term, balance]` points for one status.
pub fn term_balance_points(records: &[LoanRecord], status: LoanStatus) -> Vec<[f64; 2]> {
    records
        .iter()
        .filter(|r| r.status == status)
        .map(|r| [r.term_or_age_months, r.balance])
        .collect()
}

pub struct LoanPlotter;

impl LoanPlotter {
    /// Balance against term, one series per added/removed status.
    pub fn draw_term_balance_scatter(ui: &mut egui::Ui, records: &[LoanRecord]) {
        Plot::new("term_balance_scatter")
            .legend(Legend::default())
            .x_axis_label("Term (Months)")
            .y_axis_label("Balance ($)")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (status, name) in [(LoanStatus::Added, "Added"), (LoanStatus::Removed, "Removed")] {
                    let points: PlotPoints = term_balance_points(records, status).into();
                    plot_ui.points(
                        Points::new(points)
                            .radius(3.0)
                            .color(to_color32(status_color(status)).gamma_multiply(0.7))
                            .name(name),
                    );
                }
            });
    }
}
