//! Scene Viewer Widget
//! Central panel drawing the 3D loan scene with the egui painter, plus the 2D plot tab.

use crate::charts::{to_color32, LoanPlotter};
use crate::scene::builder::Sphere;
use crate::scene::camera::Projected;
use crate::scene::{OrbitCamera, Scene, ViewerState, Viewport};
use egui::{Align2, Color32, FontId, PointerButton, Pos2, RichText, Sense, Shape, Stroke};
use log::debug;
use nalgebra::Point3;
use std::f64::consts::{PI, TAU};

const BACKGROUND: Color32 = Color32::from_gray(45);
const ZOOM_SPEED: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTab {
    Scene3d,
    Plot2d,
}

pub struct SceneViewer {
    pub tab: ViewTab,
    min_sphere_pixels: f32,
}

impl SceneViewer {
    pub fn new(min_sphere_pixels: f32) -> Self {
        Self {
            tab: ViewTab::Scene3d,
            min_sphere_pixels,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut ViewerState, show_labels: bool) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, ViewTab::Scene3d, RichText::new("🧊 3D View").size(14.0));
            ui.selectable_value(&mut self.tab, ViewTab::Plot2d, RichText::new("📈 2D Plot").size(14.0));
        });
        ui.separator();

        match self.tab {
            ViewTab::Scene3d => self.show_scene(ui, state, show_labels),
            ViewTab::Plot2d => LoanPlotter::draw_term_balance_scatter(ui, state.records()),
        }
    }

    fn show_scene(&self, ui: &mut egui::Ui, state: &mut ViewerState, show_labels: bool) {
        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;

        Self::handle_input(ui, &response, &mut state.camera);

        let viewport = Viewport {
            left: rect.left() as f64,
            top: rect.top() as f64,
            width: rect.width() as f64,
            height: rect.height() as f64,
        };

        painter.rect_filled(rect, 0.0, BACKGROUND);
        self.paint_scene(&painter, &state.scene, &state.camera, &viewport, show_labels);
    }

    fn handle_input(ui: &egui::Ui, response: &egui::Response, camera: &mut OrbitCamera) {
        let rect = response.rect;
        let delta = response.drag_delta();

        if response.dragged_by(PointerButton::Primary) {
            let d_yaw = -(delta.x as f64) / rect.width().max(1.0) as f64 * TAU;
            let d_pitch = delta.y as f64 / rect.height().max(1.0) as f64 * PI;
            debug!("Orbiting camera: {:?}", delta);
            camera.orbit(d_yaw, d_pitch);
        } else if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            debug!("Panning camera: {:?}", delta);
            camera.pan(delta.x as f64, delta.y as f64, rect.height() as f64);
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                debug!("Zooming camera: {}", scroll);
                camera.zoom(scroll as f64 * ZOOM_SPEED);
            }
        }
    }

    fn paint_scene(
        &self,
        painter: &egui::Painter,
        scene: &Scene,
        camera: &OrbitCamera,
        viewport: &Viewport,
        show_labels: bool,
    ) {
        let project = |p: &Point3<f64>| camera.project(p, viewport);

        // Walls first so everything else sits on top of them.
        for wall in &scene.walls {
            let corners: Option<Vec<Pos2>> = wall
                .face()
                .iter()
                .map(|c| project(c).map(|p| to_pos(&p)))
                .collect();
            if let Some(corners) = corners {
                painter.add(Shape::convex_polygon(corners, to_color32(wall.color), Stroke::NONE));
            }
        }

        for grid in &scene.grids {
            let stroke = Stroke::new(1.0, to_color32(grid.color).gamma_multiply(0.6));
            for (a, b) in grid.segments() {
                if let (Some(a), Some(b)) = (project(&a), project(&b)) {
                    painter.line_segment([to_pos(&a), to_pos(&b)], stroke);
                }
            }
        }

        if let Some(origin) = project(&scene.axis_frame.origin) {
            for (end, color) in scene.axis_frame.arms() {
                if let Some(end) = project(&end) {
                    painter.line_segment(
                        [to_pos(&origin), to_pos(&end)],
                        Stroke::new(2.5, to_color32(color)),
                    );
                }
            }
        }

        let (marks, sphere_labels) =
            sphere_layers(&scene.spheres, camera, viewport, self.min_sphere_pixels, show_labels);
        for mark in &marks {
            let outline = Stroke::new(0.5, mark.fill.gamma_multiply(0.5));
            painter.circle(mark.center, mark.radius, mark.fill, outline);
        }

        for (pos, label) in sphere_labels {
            painter.text(
                pos,
                Align2::LEFT_BOTTOM,
                label.to_string(),
                FontId::proportional(10.0),
                Color32::from_gray(220),
            );
        }

        for label in &scene.labels {
            if let Some(p) = project(&label.position) {
                let font_size = ((label.scale * p.pixels_per_unit) as f32).clamp(10.0, 28.0);
                painter.text(
                    to_pos(&p),
                    Align2::LEFT_BOTTOM,
                    &label.text,
                    FontId::proportional(font_size),
                    to_color32(label.color),
                );
            }
        }
    }
}

/// A sphere as a screen circle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SphereMark {
    center: Pos2,
    radius: f32,
    fill: Color32,
}

/// Project spheres into circles sorted back to front, plus the index labels to
/// draw once every circle is down.
fn sphere_layers(
    spheres: &[Sphere],
    camera: &OrbitCamera,
    viewport: &Viewport,
    min_pixels: f32,
    show_labels: bool,
) -> (Vec<SphereMark>, Vec<(Pos2, usize)>) {
    let mut visible: Vec<(&Sphere, Projected)> = spheres
        .iter()
        .filter_map(|s| camera.project(&s.center, viewport).map(|p| (s, p)))
        .collect();
    visible.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));

    let mut marks = Vec::with_capacity(visible.len());
    let mut labels = Vec::new();
    for (sphere, projected) in visible {
        let radius = ((sphere.radius * projected.pixels_per_unit) as f32).max(min_pixels);
        let center = to_pos(&projected);
        marks.push(SphereMark {
            center,
            radius,
            fill: to_color32(sphere.color),
        });

        if show_labels {
            if let Some(label) = sphere.label {
                labels.push((center + egui::vec2(radius + 2.0, -radius - 2.0), label));
            }
        }
    }
    (marks, labels)
}

fn to_pos(p: &Projected) -> Pos2 {
    Pos2::new(p.screen[0] as f32, p.screen[1] as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::builder::{ADDED_COLOR, REMOVED_COLOR};

    fn sphere(x: f64, label: Option<usize>, color: [f32; 3]) -> Sphere {
        Sphere {
            center: Point3::new(x, 0.0, 0.0),
            radius: 0.01,
            color,
            label,
        }
    }

    fn viewport() -> Viewport {
        Viewport {
            left: 0.0,
            top: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn test_spheres_sorted_far_to_near() {
        let camera = OrbitCamera::new(Point3::origin());
        let eye_x = camera.eye().x;
        // Listed near first; the far one must be drawn first.
        let spheres = vec![
            sphere(eye_x * 0.5, Some(1), ADDED_COLOR),
            sphere(-eye_x * 0.5, Some(2), REMOVED_COLOR),
        ];

        let (marks, labels) = sphere_layers(&spheres, &camera, &viewport(), 1.5, true);
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].fill, to_color32(REMOVED_COLOR));
        assert_eq!(marks[1].fill, to_color32(ADDED_COLOR));
        assert!(marks[1].radius > marks[0].radius);
        assert_eq!(labels.iter().map(|(_, l)| *l).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_labels_hidden_and_radius_floor() {
        let camera = OrbitCamera::new(Point3::origin());
        let spheres = vec![sphere(0.0, Some(1), ADDED_COLOR), sphere(0.1, None, ADDED_COLOR)];

        let (marks, labels) = sphere_layers(&spheres, &camera, &viewport(), 40.0, false);
        assert!(labels.is_empty());
        assert!(marks.iter().all(|m| m.radius == 40.0));
    }
}
