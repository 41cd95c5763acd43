//! Orbit camera with a simple perspective projection.
//! Lives outside the scene so it survives scene rebuilds.

use nalgebra::{Point3, Vector3};
use std::f64::consts::{FRAC_PI_3, FRAC_PI_4};

const NEAR: f64 = 0.01;
const MIN_DISTANCE: f64 = 0.05;
const MAX_PITCH: f64 = 89.0 * std::f64::consts::PI / 180.0;

/// Screen rectangle the scene is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn center(&self) -> [f64; 2] {
        [self.left + self.width / 2.0, self.top + self.height / 2.0]
    }
}

/// A projected point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub screen: [f64; 2],
    /// Distance along the view direction.
    pub depth: f64,
    /// Screen pixels per scene unit at this depth.
    pub pixels_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// The point the camera orbits around.
    pub target: Point3<f64>,
    pub yaw: f64,
    pub pitch: f64,
    pub distance: f64,
    pub fov_y: f64,
    home: Point3<f64>,
}

impl OrbitCamera {
    pub const DEFAULT_YAW: f64 = FRAC_PI_4;
    pub const DEFAULT_PITCH: f64 = 0.5;
    pub const DEFAULT_DISTANCE: f64 = 2.5;
    pub const DEFAULT_FOV_Y: f64 = FRAC_PI_3;

    pub fn new(target: Point3<f64>) -> Self {
        Self {
            target,
            yaw: Self::DEFAULT_YAW,
            pitch: Self::DEFAULT_PITCH,
            distance: Self::DEFAULT_DISTANCE,
            fov_y: Self::DEFAULT_FOV_Y,
            home: target,
        }
    }

    /// Camera looking at the middle of a positive grid of the given size.
    pub fn for_grid(grid_size: f64) -> Self {
        let half = grid_size / 2.0;
        Self::new(Point3::new(half, half, half))
    }

    pub fn eye(&self) -> Point3<f64> {
        let offset = Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + offset * self.distance
    }

    /// Forward, right and up unit vectors.
    fn basis(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(&Vector3::y()).normalize();
        let up = right.cross(&forward);
        (forward, right, up)
    }

    fn focal(&self) -> f64 {
        1.0 / (self.fov_y / 2.0).tan()
    }

    /// Project a scene point into the viewport. Points behind the near plane yield `None`.
    pub fn project(&self, point: &Point3<f64>, viewport: &Viewport) -> Option<Projected> {
        let (forward, right, up) = self.basis();
        let d = point - self.eye();
        let depth = d.dot(&forward);
        if depth < NEAR {
            return None;
        }

        let pixels_per_unit = self.focal() * (viewport.height / 2.0) / depth;
        let [cx, cy] = viewport.center();
        Some(Projected {
            screen: [
                cx + d.dot(&right) * pixels_per_unit,
                cy - d.dot(&up) * pixels_per_unit,
            ],
            depth,
            pixels_per_unit,
        })
    }

    /// Rotate around the target by the given angles in radians.
    pub fn orbit(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw = (self.yaw + d_yaw) % std::f64::consts::TAU;
        self.pitch = (self.pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move the target in the view plane so content follows a drag of (dx, dy) pixels.
    pub fn pan(&mut self, dx: f64, dy: f64, viewport_height: f64) {
        if viewport_height <= 0.0 {
            return;
        }
        let (_, right, up) = self.basis();
        let units_per_pixel = self.distance * 2.0 * (self.fov_y / 2.0).tan() / viewport_height;
        self.target += (right * -dx + up * dy) * units_per_pixel;
    }

    /// Scroll towards (positive) or away from (negative) the target.
    pub fn zoom(&mut self, scroll: f64) {
        self.distance -= scroll * self.distance * 0.01;
        self.distance = self.distance.max(MIN_DISTANCE);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.home);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn viewport() -> Viewport {
        Viewport {
            left: 100.0,
            top: 50.0,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = OrbitCamera::for_grid(1.1);
        let projected = camera.project(&camera.target, &viewport()).unwrap();
        assert_relative_eq!(projected.screen[0], 500.0, epsilon = 1e-9);
        assert_relative_eq!(projected.screen[1], 350.0, epsilon = 1e-9);
        assert_relative_eq!(projected.depth, camera.distance, epsilon = 1e-9);
    }

    #[test]
    fn test_point_behind_camera_is_hidden() {
        let camera = OrbitCamera::for_grid(1.0);
        let eye = camera.eye();
        let behind = eye + (eye - camera.target);
        assert!(camera.project(&behind, &viewport()).is_none());
    }

    #[test]
    fn test_up_is_up_on_screen() {
        let camera = OrbitCamera::new(Point3::origin());
        let above = camera
            .project(&Point3::new(0.0, 0.1, 0.0), &viewport())
            .unwrap();
        assert!(above.screen[1] < viewport().center()[1]);
    }

    #[test]
    fn test_closer_points_are_larger() {
        let camera = OrbitCamera::new(Point3::origin());
        let far = camera.project(&Point3::origin(), &viewport()).unwrap();
        let near = camera.project(&(camera.eye() * 0.5), &viewport()).unwrap();
        assert!(near.pixels_per_unit > far.pixels_per_unit);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = OrbitCamera::for_grid(1.0);
        camera.orbit(0.0, 10.0);
        assert_relative_eq!(camera.pitch, MAX_PITCH);
        camera.orbit(0.0, -20.0);
        assert_relative_eq!(camera.pitch, -MAX_PITCH);
    }

    #[test]
    fn test_zoom_floor() {
        let mut camera = OrbitCamera::for_grid(1.0);
        for _ in 0..1000 {
            camera.zoom(50.0);
        }
        assert_relative_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-10.0);
        assert!(camera.distance > MIN_DISTANCE);
    }

    #[test]
    fn test_pan_moves_target_and_reset_restores() {
        let mut camera = OrbitCamera::for_grid(1.0);
        let home = camera.target;
        camera.pan(40.0, -25.0, 600.0);
        assert_ne!(camera.target, home);
        camera.orbit(1.0, 0.3);
        camera.zoom(20.0);

        camera.reset();
        assert_eq!(camera, OrbitCamera::for_grid(1.0));
    }

    #[test]
    fn test_pan_keeps_dragged_point_under_cursor() {
        let mut camera = OrbitCamera::for_grid(1.0);
        let vp = viewport();
        let anchor = camera.target;
        camera.pan(30.0, 0.0, vp.height);
        let moved = camera.project(&anchor, &vp).unwrap();
        assert_relative_eq!(moved.screen[0], vp.center()[0] + 30.0, epsilon = 1e-6);
    }
}
