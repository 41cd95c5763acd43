//! Control Panel Widget
//! Left side panel with the data source, portfolio summary, view options and actions.

use crate::data::PortfolioSummary;
use egui::{Color32, RichText};
use std::path::Path;
use std::time::Instant;

/// Left side control panel.
pub struct ControlPanel {
    pub show_sphere_labels: bool,
    pub status: String,
    last_reload: Option<Instant>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            show_sphere_labels: true,
            status: "Ready".to_string(),
            last_reload: None,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    pub fn mark_reloaded(&mut self) {
        self.last_reload = Some(Instant::now());
    }

    /// Draw the control panel
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        csv_path: &Path,
        summary: &PortfolioSummary,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🏦 Loan Portfolio")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new("3D Viewer").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let file_name = csv_path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| csv_path.display().to_string());
                    ui.label(RichText::new(file_name).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Summary Section =====
        ui.label(RichText::new("📋 Portfolio").size(14.0).strong());
        ui.add_space(5.0);

        egui::Grid::new("summary_grid")
            .num_columns(2)
            .spacing([20.0, 4.0])
            .show(ui, |ui| {
                ui.label("Loans:");
                ui.label(summary.total.to_string());
                ui.end_row();

                ui.label(RichText::new("Added:").color(Color32::from_rgb(40, 167, 69)));
                ui.label(summary.added.to_string());
                ui.end_row();

                ui.label(RichText::new("Removed:").color(Color32::from_rgb(220, 53, 69)));
                ui.label(summary.removed.to_string());
                ui.end_row();

                if let Some((min, max)) = summary.balance_range {
                    ui.label("Balance:");
                    ui.label(format!("{:.2} – {:.2}", min, max));
                    ui.end_row();
                }
                if let Some((min, max)) = summary.rate_range {
                    ui.label("Rate:");
                    ui.label(format!("{:.2} – {:.2}", min, max));
                    ui.end_row();
                }
                if let Some((min, max)) = summary.term_range {
                    ui.label("Term/Age:");
                    ui.label(format!("{:.0} – {:.0}", min, max));
                    ui.end_row();
                }
            });

        if summary.clusters.len() > 1 || summary.clusters.keys().any(|&k| k != 0) {
            ui.add_space(5.0);
            ui.collapsing("Clusters", |ui| {
                for (cluster, count) in &summary.clusters {
                    ui.label(format!("Cluster {}: {}", cluster, count));
                }
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== View Section =====
        ui.label(RichText::new("🎥 View").size(14.0).strong());
        ui.add_space(5.0);
        ui.checkbox(&mut self.show_sphere_labels, "Show loan numbers");
        ui.label(
            RichText::new("Drag to orbit · right-drag to pan · scroll to zoom")
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(5.0);
        if ui.button("⟲ Reset Camera").clicked() {
            action = ControlPanelAction::ResetCamera;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            let reload = egui::Button::new(RichText::new("🔄 Reload Now").size(16.0))
                .min_size(egui::vec2(200.0, 35.0));
            if ui.add(reload).clicked() {
                action = ControlPanelAction::ReloadNow;
            }

            ui.add_space(8.0);

            let export = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                .min_size(egui::vec2(150.0, 30.0));
            if ui.add_enabled(summary.total > 0, export).clicked() {
                action = ControlPanelAction::ExportPng;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        if let Some(at) = self.last_reload {
            ui.label(
                RichText::new(format!("Last reload {}s ago", at.elapsed().as_secs()))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        }

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Reloaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    ReloadNow,
    ResetCamera,
    ExportPng,
}
