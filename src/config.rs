//! Configuration loaded from a TOML file.
//!
//! ```toml
//! [layout]
//! steps = 40
//! seed = 7
//!
//! [view]
//! width = 724
//! height = 768
//! ```
//!
//! Every key is optional; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ModsphereError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModsphereConfig {
    pub layout: LayoutConfig,
    pub view: ViewConfig,
}

/// Force-directed layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of simulation steps. Always run in full.
    pub steps: usize,
    /// Time step applied to forces and integration.
    pub dt: f64,
    /// Annealing constant `k` in `speed(i) = 1 / (1 + i / k)`.
    pub anneal: f64,
    /// Seed for the initial placement.
    pub seed: u64,
    /// Same-group pairs closer than this push apart.
    pub near_threshold: f64,
    /// Same-group pairs farther than this pull together.
    pub far_threshold: f64,
    /// Pairs across groups (or involving externals) closer than this push apart.
    pub cross_threshold: f64,
    pub near_push: f64,
    pub far_pull: f64,
    pub cross_push: f64,
    pub external_push: f64,
    /// Per-axis jitter around a group anchor at initialization.
    pub jitter: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            steps: 40,
            dt: 0.25,
            anneal: 4.0,
            seed: 0,
            near_threshold: 0.2,
            far_threshold: 0.6,
            cross_threshold: 0.4,
            near_push: 1.9,
            far_pull: 0.05,
            cross_push: 0.1,
            external_push: 0.3,
            jitter: 1e-2,
        }
    }
}

/// Viewport and drawing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplicative zoom change per scroll step.
    pub zoom_step: f64,
    /// Extra factor applied to every circle radius.
    pub circle_scale: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 724.0,
            height: 768.0,
            zoom: 1.0,
            min_zoom: 0.5,
            max_zoom: 5.0,
            zoom_step: 1.1,
            circle_scale: 1.0,
        }
    }
}

impl ModsphereConfig {
    /// Load config from `path`, falling back to defaults if the file is
    /// missing or invalid.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    warn!(path = %path.display(), error = %e, "ignoring invalid config");
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                }
                Self::default()
            }
        }
    }

    /// Load config from `path`, reporting read and parse failures.
    pub fn try_load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ModsphereError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.anneal <= 0.0 {
            return Err(ModsphereError::Config("layout.anneal must be positive".into()));
        }
        if layout.near_threshold > layout.far_threshold {
            return Err(ModsphereError::Config(
                "layout.near_threshold must not exceed layout.far_threshold".into(),
            ));
        }
        if !(layout.jitter.is_finite() && layout.jitter >= 0.0) {
            return Err(ModsphereError::Config(
                "layout.jitter must be a finite, non-negative number".into(),
            ));
        }
        let view = &self.view;
        if view.width <= 0.0 || view.height <= 0.0 {
            return Err(ModsphereError::Config("view size must be positive".into()));
        }
        if ![view.zoom, view.min_zoom, view.max_zoom].iter().all(|z| z.is_finite()) {
            return Err(ModsphereError::Config("view zoom values must be finite".into()));
        }
        if view.min_zoom <= 0.0 || view.min_zoom > view.max_zoom {
            return Err(ModsphereError::Config("view zoom bounds are inverted".into()));
        }
        Ok(())
    }
}
