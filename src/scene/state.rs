//! Viewer state: the current records, their scene, the camera and the file watcher.

use crate::config::ViewerConfig;
use crate::data::{CsvWatcher, LoanRecord, LoaderError, PollOutcome, PortfolioSummary};
use crate::scene::builder::{build_scene, Scene, SceneConfig};
use crate::scene::camera::OrbitCamera;
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

/// What a refresh did to the displayed scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    Idle,
    Rebuilt { records: usize },
}

pub struct ViewerState {
    pub scene: Scene,
    pub camera: OrbitCamera,
    pub summary: PortfolioSummary,
    scene_config: SceneConfig,
    watcher: CsvWatcher,
}

impl ViewerState {
    pub fn new(path: &Path, records: Vec<LoanRecord>, config: &ViewerConfig) -> Self {
        let scene_config = SceneConfig::from(config);
        let scene = build_scene(&records, &scene_config);
        let summary = PortfolioSummary::from_records(&records);
        info!(
            "Built scene with {} spheres from {}",
            scene.spheres.len(),
            path.display()
        );

        Self {
            scene,
            camera: OrbitCamera::for_grid(config.grid_size),
            summary,
            scene_config,
            watcher: CsvWatcher::new(path, config.poll_interval(), records),
        }
    }

    pub fn path(&self) -> &Path {
        self.watcher.path()
    }

    pub fn records(&self) -> &[LoanRecord] {
        self.watcher.snapshot()
    }

    /// Poll the file and rebuild the scene if its content changed.
    pub fn refresh(&mut self, now: Instant) -> Result<RefreshEvent, LoaderError> {
        let outcome = self.watcher.poll(now)?;
        Ok(self.apply(outcome))
    }

    /// Reload immediately regardless of interval or modification time.
    pub fn force_refresh(&mut self) -> Result<RefreshEvent, LoaderError> {
        let outcome = self.watcher.force_reload()?;
        Ok(self.apply(outcome))
    }

    fn apply(&mut self, outcome: PollOutcome) -> RefreshEvent {
        match outcome {
            PollOutcome::Changed(records) => {
                // Only the scene is replaced; the camera keeps its pose.
                self.scene = build_scene(&records, &self.scene_config);
                self.summary = PortfolioSummary::from_records(&records);
                info!(
                    "Reloaded {}: {} records",
                    self.watcher.path().display(),
                    records.len()
                );
                RefreshEvent::Rebuilt {
                    records: records.len(),
                }
            }
            // Polled every frame; only due checks are worth a log line.
            PollOutcome::NotDue => RefreshEvent::Idle,
            other => {
                debug!("Poll outcome: {:?}", other);
                RefreshEvent::Idle
            }
        }
    }
}
