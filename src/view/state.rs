//! Interactive view state: rotation, zoom, viewport and selection.
//!
//! A renderer feeds pointer drags, scroll steps, resizes and clicks in;
//! the state hands back a fresh [`ViewTransform`] on demand.

use std::f64::consts::TAU;
use tracing::debug;

use super::matrix::Mat4;
use super::projection::ViewTransform;
use super::scene::Scene;
use crate::config::ViewConfig;
use crate::graph::ModuleId;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    width: f64,
    height: f64,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
    rotation: Mat4,
    selected: Option<ModuleId>,
}

impl ViewState {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            zoom: config.zoom.clamp(config.min_zoom, config.max_zoom),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
            rotation: Mat4::IDENTITY,
            selected: None,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> &Mat4 {
        &self.rotation
    }

    pub fn selected(&self) -> Option<&ModuleId> {
        self.selected.as_ref()
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform::compose(self.width, self.height, self.zoom, &self.rotation)
    }

    /// Rotate by a pointer drag of (`dx`, `dy`) pixels. A full viewport
    /// height of vertical drag turns once about the x axis; a full width of
    /// horizontal drag turns once about the y axis.
    pub fn drag(&mut self, dx: f64, dy: f64) {
        let about_x = dy / self.height * TAU;
        let about_y = -dx / self.width * TAU;
        self.rotation = Mat4::rotate_xy(about_x, about_y) * self.rotation;
    }

    /// Apply scroll steps: positive zooms in, negative zooms out. Each step
    /// multiplies or divides by the zoom step and clamps.
    pub fn scroll(&mut self, steps: i32) {
        for _ in 0..steps.unsigned_abs() {
            self.zoom = if steps > 0 {
                (self.zoom * self.zoom_step).min(self.max_zoom)
            } else {
                (self.zoom / self.zoom_step).max(self.min_zoom)
            };
        }
        debug!(zoom = self.zoom, "zoom changed");
    }

    /// Adopt a new viewport size. Degenerate sizes are ignored.
    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
    }

    pub fn select(&mut self, id: Option<ModuleId>) {
        self.selected = id;
    }

    /// Select the nearest circle of `scene` under (`x`, `y`), or clear the
    /// selection when nothing is hit.
    pub fn select_at(&mut self, scene: &Scene, x: f64, y: f64) -> Option<&ModuleId> {
        self.selected = scene.hit_test(x, y).map(|circle| circle.id.clone());
        self.selected.as_ref()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&ViewConfig::default())
    }
}
