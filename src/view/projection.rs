//! Perspective projection of layout positions onto the viewport.

use serde::Serialize;
use std::cmp::Ordering;

use super::matrix::Mat4;
use crate::graph::ModuleId;
use crate::layout::{ForceLayout, Vec3};

/// Fraction of the smaller viewport side covered by the unit sphere at
/// zoom 1, before perspective.
pub const FIT: f64 = 0.45;
/// Distance the camera backs away from the sphere centre.
pub const CAMERA_DISTANCE: f64 = 2.0;

/// Where a point lands on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Screen position, or `None` when the point is too close to or behind
    /// the camera to divide by its depth.
    pub position: Option<[f64; 2]>,
    pub depth: f64,
}

impl Projection {
    pub fn is_projectable(&self) -> bool {
        self.position.is_some()
    }
}

/// The composed view matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    matrix: Mat4,
}

impl ViewTransform {
    /// `T(w/2, h/2, 0) · H · S(s, s, 1, 1) · T(0, 0, 2) · R` with
    /// `s = min(w, h) · 0.45 · zoom`.
    pub fn compose(width: f64, height: f64, zoom: f64, rotation: &Mat4) -> Self {
        let s = width.min(height) * FIT * zoom;
        let matrix = Mat4::translate(width / 2.0, height / 2.0, 0.0)
            * Mat4::homogeneous()
            * Mat4::scale(s, s, 1.0, 1.0)
            * Mat4::translate(0.0, 0.0, CAMERA_DISTANCE)
            * *rotation;
        Self { matrix }
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn project(&self, point: Vec3) -> Projection {
        let [x, y, z, w] = self.matrix.transform([point.x, point.y, point.z, 1.0]);
        let position = (z >= 1.0).then(|| [x / z, y / z]);
        Projection { position, depth: w }
    }

    /// Project every vertex of `layout`, in layout order.
    pub fn project_all(&self, layout: &ForceLayout) -> Vec<(ModuleId, Projection)> {
        layout
            .vertices()
            .iter()
            .map(|v| (v.id.clone(), self.project(v.position)))
            .collect()
    }
}

/// Projectable entries ordered far to near, for painting back to front.
pub fn depth_order(projected: &[(ModuleId, Projection)]) -> Vec<&ModuleId> {
    let mut visible: Vec<_> = projected
        .iter()
        .filter(|(_, p)| p.is_projectable())
        .collect();
    visible.sort_by(|(_, a), (_, b)| b.depth.partial_cmp(&a.depth).unwrap_or(Ordering::Equal));
    visible.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewTransform {
        ViewTransform::compose(100.0, 100.0, 1.0, &Mat4::IDENTITY)
    }

    #[test]
    fn test_centre_maps_to_viewport_centre() {
        let p = view().project(Vec3::ZERO);
        assert_eq!(p.position, Some([50.0, 50.0]));
        assert_eq!(p.depth, 2.0);
    }

    #[test]
    fn test_perspective_divide() {
        let view = view();
        let point = Vec3::new(0.5, 0.0, 1.0);
        let [raw_x, raw_y, _, depth] = view.matrix().transform([0.5, 0.0, 1.0, 1.0]);
        let p = view.project(point);
        assert_eq!(p.depth, depth);
        assert_eq!(p.position, Some([raw_x / depth, raw_y / depth]));
        let [x, y] = p.position.unwrap();
        assert!((x - 57.5).abs() < 1e-9);
        assert!((y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_behind_camera_is_unprojectable() {
        let p = view().project(Vec3::new(0.0, 0.0, -1.5));
        assert!(!p.is_projectable());
        assert!(p.depth < 1.0);

        // Depth exactly 1 still projects.
        assert!(view().project(Vec3::new(0.0, 0.0, -1.0)).is_projectable());
    }

    #[test]
    fn test_zoom_scales_offsets() {
        let near = ViewTransform::compose(100.0, 200.0, 2.0, &Mat4::IDENTITY);
        let [x, y] = near.project(Vec3::new(1.0, 0.0, 0.0)).position.unwrap();
        // s = 100 · 0.45 · 2 = 90, depth 2.
        assert!((x - (50.0 + 45.0)).abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_order_far_to_near() {
        let view = view();
        let projected = vec![
            (ModuleId::from("mid"), view.project(Vec3::new(0.0, 0.0, 0.0))),
            (ModuleId::from("far"), view.project(Vec3::new(0.0, 0.0, 1.0))),
            (ModuleId::from("gone"), view.project(Vec3::new(0.0, 0.0, -3.0))),
            (ModuleId::from("near"), view.project(Vec3::new(0.0, 0.0, -0.5))),
        ];
        let order: Vec<&str> = depth_order(&projected).into_iter().map(|id| id.as_str()).collect();
        assert_eq!(order, vec!["far", "mid", "near"]);
    }
}
