//! Scene Builder
//! Turns loan records into a drawable description: spheres, grids, walls and labels.

use crate::config::ViewerConfig;
use crate::data::processor::{balance_radius, column_bounds, feature_points, scale_features};
use crate::data::{LoanRecord, LoanStatus};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::str::FromStr;
use thiserror::Error;

pub type Rgb = [f32; 3];

pub const ADDED_COLOR: Rgb = [0.0, 1.0, 0.0];
pub const REMOVED_COLOR: Rgb = [1.0, 0.0, 0.0];
pub const GRID_COLOR: Rgb = [0.7, 0.7, 0.7];
pub const WALL_COLOR: Rgb = [0.1, 0.1, 0.1];
pub const TEXT_COLOR: Rgb = [1.0, 1.0, 1.0];

const WALL_THICKNESS: f64 = 0.001;
const AXIS_FRAME_SIZE: f64 = 0.2;

#[derive(Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("plane must be 'xy', 'xz', or 'yz', got '{0}'")]
    InvalidPlane(String),
}

/// One of the three principal planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Xy,
    Xz,
    Yz,
}

impl FromStr for Plane {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xy" => Ok(Plane::Xy),
            "xz" => Ok(Plane::Xz),
            "yz" => Ok(Plane::Yz),
            _ => Err(SceneError::InvalidPlane(s.to_string())),
        }
    }
}

impl Plane {
    /// Map in-plane coordinates (a, b) to a 3D point.
    fn point(&self, a: f64, b: f64) -> Point3<f64> {
        match self {
            Plane::Xy => Point3::new(a, b, 0.0),
            Plane::Xz => Point3::new(a, 0.0, b),
            Plane::Yz => Point3::new(0.0, a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Point3<f64>,
    pub radius: f64,
    pub color: Rgb,
    /// 1-based index shown next to the sphere, if any.
    pub label: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSet {
    pub points: Vec<Point3<f64>>,
    pub lines: Vec<[usize; 2]>,
    pub color: Rgb,
}

impl LineSet {
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        self.lines
            .iter()
            .map(move |[a, b]| (self.points[*a], self.points[*b]))
    }
}

/// Axis-aligned box starting at `origin` and extending by `size`.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub origin: Point3<f64>,
    pub size: Vector3<f64>,
    pub color: Rgb,
}

impl Wall {
    /// The face of the box with the largest area, as four corners in winding order.
    pub fn face(&self) -> [Point3<f64>; 4] {
        let o = self.origin;
        let s = self.size;
        if s.z <= s.x && s.z <= s.y {
            [
                o,
                o + Vector3::new(s.x, 0.0, 0.0),
                o + Vector3::new(s.x, s.y, 0.0),
                o + Vector3::new(0.0, s.y, 0.0),
            ]
        } else if s.y <= s.x && s.y <= s.z {
            [
                o,
                o + Vector3::new(s.x, 0.0, 0.0),
                o + Vector3::new(s.x, 0.0, s.z),
                o + Vector3::new(0.0, 0.0, s.z),
            ]
        } else {
            [
                o,
                o + Vector3::new(0.0, s.y, 0.0),
                o + Vector3::new(0.0, s.y, s.z),
                o + Vector3::new(0.0, 0.0, s.z),
            ]
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub position: Point3<f64>,
    /// Relative text size.
    pub scale: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisFrame {
    pub origin: Point3<f64>,
    pub size: f64,
}

impl AxisFrame {
    /// x, y and z arms with their conventional red, green, blue colors.
    pub fn arms(&self) -> [(Point3<f64>, Rgb); 3] {
        [
            (self.origin + Vector3::x() * self.size, [1.0, 0.0, 0.0]),
            (self.origin + Vector3::y() * self.size, [0.0, 1.0, 0.0]),
            (self.origin + Vector3::z() * self.size, [0.0, 0.0, 1.0]),
        ]
    }
}

/// Everything that gets drawn for one snapshot of the loan file.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub grids: Vec<LineSet>,
    pub walls: Vec<Wall>,
    pub labels: Vec<TextLabel>,
    pub axis_frame: AxisFrame,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub grid_size: f64,
    pub grid_divisions: usize,
    pub label_limit: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for SceneConfig {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            grid_divisions: config.grid_divisions,
            label_limit: config.label_limit,
        }
    }
}

pub fn status_color(status: LoanStatus) -> Rgb {
    match status {
        LoanStatus::Added => ADDED_COLOR,
        LoanStatus::Removed => REMOVED_COLOR,
    }
}

/// One sphere per record, positioned by scaled (term, balance, rate).
pub fn loans_to_spheres(records: &[LoanRecord], label_limit: usize) -> Vec<Sphere> {
    let points = feature_points(records);
    let scaled = scale_features(&points);
    let Some(bounds) = column_bounds(&points) else {
        return Vec::new();
    };
    let (min_balance, max_balance) = bounds[1];

    records
        .par_iter()
        .zip(scaled.par_iter())
        .enumerate()
        .map(|(idx, (record, p))| Sphere {
            center: Point3::new(p[0], p[1], p[2]),
            radius: balance_radius(record.balance, min_balance, max_balance),
            color: status_color(record.status),
            label: (idx < label_limit).then_some(idx + 1),
        })
        .collect()
}

/// A faint square grid in one of the principal planes.
pub fn create_grid(size: f64, divisions: usize, plane: Plane, positive_only: bool) -> LineSet {
    let step = size / divisions as f64;
    let origin = if positive_only { 0.0 } else { -size / 2.0 };

    let mut points = Vec::with_capacity(4 * (divisions + 1));
    let mut lines = Vec::with_capacity(2 * (divisions + 1));

    // Lines parallel to the first in-plane axis, then to the second.
    for i in 0..=divisions {
        let offset = origin + i as f64 * step;
        points.push(plane.point(origin, offset));
        points.push(plane.point(origin + size, offset));
        lines.push([points.len() - 2, points.len() - 1]);
    }
    for i in 0..=divisions {
        let offset = origin + i as f64 * step;
        points.push(plane.point(offset, origin));
        points.push(plane.point(offset, origin + size));
        lines.push([points.len() - 2, points.len() - 1]);
    }

    LineSet {
        points,
        lines,
        color: GRID_COLOR,
    }
}

/// Thin dark boxes sitting just behind each positive grid.
pub fn background_walls(grid_size: f64) -> Vec<Wall> {
    let g = grid_size;
    let t = WALL_THICKNESS;
    vec![
        Wall {
            origin: Point3::new(0.0, 0.0, -t),
            size: Vector3::new(g, g, t),
            color: WALL_COLOR,
        },
        Wall {
            origin: Point3::new(0.0, -t, 0.0),
            size: Vector3::new(g, t, g),
            color: WALL_COLOR,
        },
        Wall {
            origin: Point3::new(-t, 0.0, 0.0),
            size: Vector3::new(t, g, g),
            color: WALL_COLOR,
        },
    ]
}

/// One title per positive-axis face of the grid.
pub fn face_titles(grid_size: f64) -> Vec<TextLabel> {
    let eps = 0.03 * grid_size;
    let half = 0.5 * grid_size;

    [
        ("Term/Age", Point3::new(half, -eps, 0.0)),
        ("Balance", Point3::new(-eps, half, 0.0)),
        ("Rate", Point3::new(-eps, -eps, half)),
    ]
    .into_iter()
    .map(|(text, position)| TextLabel {
        text: text.to_string(),
        position,
        scale: 0.07,
        color: TEXT_COLOR,
    })
    .collect()
}

pub fn wall_title(grid_size: f64) -> TextLabel {
    TextLabel {
        text: "Loan Portfolio".to_string(),
        position: Point3::new(0.05 * grid_size, 0.05 * grid_size, -0.0005),
        scale: 0.08,
        color: TEXT_COLOR,
    }
}

/// Build the complete scene for a set of records.
pub fn build_scene(records: &[LoanRecord], config: &SceneConfig) -> Scene {
    let size = config.grid_size;
    let divisions = config.grid_divisions;

    let mut labels = vec![wall_title(size)];
    labels.extend(face_titles(size));

    Scene {
        spheres: loans_to_spheres(records, config.label_limit),
        grids: [Plane::Xy, Plane::Xz, Plane::Yz]
            .into_iter()
            .map(|plane| create_grid(size, divisions, plane, true))
            .collect(),
        walls: background_walls(size),
        labels,
        axis_frame: AxisFrame {
            origin: Point3::origin(),
            size: AXIS_FRAME_SIZE,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(balance: f64, rate: f64, term: f64, status: LoanStatus) -> LoanRecord {
        LoanRecord {
            balance,
            rate,
            term_or_age_months: term,
            status,
            cluster: None,
        }
    }

    #[test]
    fn test_plane_parsing() {
        assert_eq!("XY".parse::<Plane>(), Ok(Plane::Xy));
        assert_eq!("xz".parse::<Plane>(), Ok(Plane::Xz));
        assert_eq!(
            "ab".parse::<Plane>(),
            Err(SceneError::InvalidPlane("ab".to_string()))
        );
    }

    #[test]
    fn test_positive_grid_shape() {
        for plane in [Plane::Xy, Plane::Xz, Plane::Yz] {
            let grid = create_grid(1.1, 10, plane, true);
            assert_eq!(grid.lines.len(), 22);
            assert_eq!(grid.points.len(), 44);
            for p in &grid.points {
                for v in p.iter() {
                    assert!(*v >= 0.0 && *v <= 1.1 + 1e-12);
                }
            }
        }

        let xy = create_grid(1.0, 4, Plane::Xy, true);
        assert!(xy.points.iter().all(|p| p.z == 0.0));
        let yz = create_grid(1.0, 4, Plane::Yz, true);
        assert!(yz.points.iter().all(|p| p.x == 0.0));
    }

    #[test]
    fn test_centered_grid() {
        let grid = create_grid(2.0, 2, Plane::Xz, false);
        let (first_start, first_end) = grid.segments().next().unwrap();
        assert_relative_eq!(first_start.x, -1.0);
        assert_relative_eq!(first_end.x, 1.0);
        assert_relative_eq!(first_start.z, -1.0);
        assert!(grid.points.iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn test_spheres_follow_records() {
        let records = vec![
            record(1000.0, 4.0, 12.0, LoanStatus::Added),
            record(3000.0, 12.0, 180.0, LoanStatus::Removed),
        ];
        let spheres = loans_to_spheres(&records, 99);

        assert_eq!(spheres.len(), 2);
        assert_eq!(spheres[0].center, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(spheres[1].center, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(spheres[0].color, ADDED_COLOR);
        assert_eq!(spheres[1].color, REMOVED_COLOR);
        assert_relative_eq!(spheres[0].radius, 0.002);
        assert_relative_eq!(spheres[1].radius, 0.004);
        assert_eq!(spheres[0].label, Some(1));
        assert_eq!(spheres[1].label, Some(2));
    }

    #[test]
    fn test_label_limit() {
        let records: Vec<LoanRecord> = (0..150)
            .map(|i| record(1000.0 + i as f64, 5.0, 24.0, LoanStatus::Added))
            .collect();
        let spheres = loans_to_spheres(&records, 99);
        assert_eq!(spheres.len(), 150);
        assert_eq!(spheres.iter().filter(|s| s.label.is_some()).count(), 99);
        assert_eq!(spheres[98].label, Some(99));
        assert_eq!(spheres[99].label, None);
    }

    #[test]
    fn test_build_scene() {
        let records = vec![record(1000.0, 4.0, 12.0, LoanStatus::Added)];
        let scene = build_scene(&records, &SceneConfig::default());

        assert_eq!(scene.spheres.len(), 1);
        assert_eq!(scene.grids.len(), 3);
        assert_eq!(scene.walls.len(), 3);
        assert_eq!(scene.labels.len(), 4);
        assert_eq!(scene.labels[0].text, "Loan Portfolio");
        assert_relative_eq!(scene.axis_frame.size, 0.2);
    }

    #[test]
    fn test_empty_records_still_draw_frame() {
        let scene = build_scene(&[], &SceneConfig::default());
        assert!(scene.spheres.is_empty());
        assert_eq!(scene.grids.len(), 3);
    }

    #[test]
    fn test_wall_faces_lie_on_planes() {
        let walls = background_walls(1.0);
        assert!(walls[0].face().iter().all(|p| p.z == -WALL_THICKNESS));
        assert!(walls[1].face().iter().all(|p| p.y == -WALL_THICKNESS));
        assert!(walls[2].face().iter().all(|p| p.x == -WALL_THICKNESS));
    }
}
