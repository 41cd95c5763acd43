//! Loan Viewer Main Application
//! Main window with control panel and scene viewer; polls the CSV file every frame.

use crate::charts::StaticPlotRenderer;
use crate::config::ViewerConfig;
use crate::data::load_loans;
use crate::gui::{ControlPanel, ControlPanelAction, SceneViewer};
use crate::scene::{RefreshEvent, ViewerState};
use egui::SidePanel;
use log::{info, warn};
use std::time::{Duration, Instant};

/// Repaint cadence; the file itself is only checked every `poll_interval_secs`.
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

const EXPORT_WIDTH: u32 = 1000;
const EXPORT_HEIGHT: u32 = 700;

/// Main application window.
pub struct LoanViewerApp {
    config: ViewerConfig,
    state: ViewerState,
    control_panel: ControlPanel,
    scene_viewer: SceneViewer,
}

impl LoanViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, state: ViewerState, config: ViewerConfig) -> Self {
        let mut control_panel = ControlPanel::new();
        control_panel.set_status(&format!("Loaded {} records", state.summary.total));

        Self {
            scene_viewer: SceneViewer::new(config.min_sphere_pixels),
            config,
            state,
            control_panel,
        }
    }

    /// Check the file and rebuild the scene if it changed.
    fn poll_file(&mut self) {
        match self.state.refresh(Instant::now()) {
            Ok(event) => self.report_refresh(event),
            Err(e) => {
                warn!("Reload of {} failed: {}", self.state.path().display(), e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    fn handle_reload_now(&mut self) {
        match self.state.force_refresh() {
            Ok(RefreshEvent::Idle) => {
                self.control_panel.mark_reloaded();
                self.control_panel.set_status("No changes");
            }
            Ok(event) => self.report_refresh(event),
            Err(e) => {
                warn!("Reload of {} failed: {}", self.state.path().display(), e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    fn report_refresh(&mut self, event: RefreshEvent) {
        if let RefreshEvent::Rebuilt { records } = event {
            self.control_panel.mark_reloaded();
            self.control_panel
                .set_status(&format!("Reloaded {} records", records));
        }
    }

    /// Switch to another CSV file. The old file stays on screen if the new one fails to load.
    fn handle_browse_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        match load_loans(&path) {
            Ok(records) => {
                info!("Switched to {}", path.display());
                self.state = ViewerState::new(&path, records, &self.config);
                self.control_panel.mark_reloaded();
                self.control_panel
                    .set_status(&format!("Loaded {} records", self.state.summary.total));
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    /// Render the static cluster plot and open it with the system viewer.
    fn handle_export_png(&mut self) {
        let Some(output_path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("loan_clusters.png")
            .save_file()
        else {
            return;
        };

        match StaticPlotRenderer::render_cluster_scatter_png(
            self.state.records(),
            &output_path,
            EXPORT_WIDTH,
            EXPORT_HEIGHT,
        ) {
            Ok(()) => {
                self.control_panel
                    .set_status(&format!("Exported {}", output_path.display()));
                if let Err(e) = open::that(&output_path) {
                    warn!("Could not open {}: {}", output_path.display(), e);
                }
            }
            Err(e) => {
                self.control_panel
                    .set_status(&format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for LoanViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_file();

        // Keep polling while the window is idle
        ctx.request_repaint_after(FRAME_INTERVAL);

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action =
                        self.control_panel
                            .show(ui, self.state.path(), &self.state.summary);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::ReloadNow => self.handle_reload_now(),
                        ControlPanelAction::ResetCamera => self.state.camera.reset(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Scene Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            let show_labels = self.control_panel.show_sphere_labels;
            self.scene_viewer.show(ui, &mut self.state, show_labels);
        });
    }
}
