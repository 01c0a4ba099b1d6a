//! Drawable scene: what a renderer paints for one frame.
//!
//! Circles come far to near so a painter can draw them in order. Relation
//! segments and group labels are derived from the same projection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::color::hsv_to_rgb8;
use super::projection::{depth_order, Projection};
use super::state::ViewState;
use crate::graph::{ExportedGraph, ModuleId, EXTERNAL_SCHEME};
use crate::layout::ForceLayout;

/// Circles with a radius at or below this are not drawn.
const MIN_RADIUS: u32 = 2;
const BASE_VALUE: f64 = 0.75;
const DEPTH_VALUE: f64 = 0.25;
const LABEL_SATURATION: f64 = 0.15;
/// Short scheme shown for external modules in import listings.
const SHORT_EXTERNAL_SCHEME: &str = "ext://";

/// Which relations are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RelationMode {
    /// Every relation when nothing is selected; otherwise relations
    /// touching the selected module's group.
    #[default]
    All,
    /// No relations when nothing is selected; otherwise as `All`.
    Hidden,
    /// Only relations of the selected module itself.
    Narrowed,
}

impl RelationMode {
    /// Whether the relation between `a` and `b` is drawn given the current
    /// selection and its group.
    fn shows(self, a: &Circle, b: &Circle, selection: Option<(&ModuleId, &str)>) -> bool {
        match (self, selection) {
            (RelationMode::Narrowed, Some((id, _))) => a.id == *id || b.id == *id,
            (RelationMode::Narrowed, None) => false,
            (_, Some((_, group))) => a.top_dir == group || b.top_dir == group,
            (RelationMode::All, None) => true,
            (RelationMode::Hidden, None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneOptions {
    pub circle_scale: f64,
    pub relations: RelationMode,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            circle_scale: 1.0,
            relations: RelationMode::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub id: ModuleId,
    pub label: String,
    pub top_dir: String,
    pub external: bool,
    pub position: [i32; 2],
    pub radius: u32,
    pub color: [u8; 3],
    pub depth: f64,
}

impl Circle {
    fn contains(&self, x: f64, y: f64) -> bool {
        let dx = self.position[0] as f64 - x;
        let dy = self.position[1] as f64 - y;
        (dx * dx + dy * dy).sqrt() <= self.radius as f64
    }
}

/// A drawn relation from an internal importer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub from: ModuleId,
    pub to: ModuleId,
    pub start: [i32; 2],
    pub end: [i32; 2],
    pub color: [u8; 3],
}

/// A group name placed at the median of its near-side members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupLabel {
    pub text: String,
    pub position: [f64; 2],
    pub color: [u8; 3],
}

/// Details shown for the selected module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionInfo {
    pub id: ModuleId,
    pub title: String,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub circles: Vec<Circle>,
    pub segments: Vec<Segment>,
    pub groups: Vec<GroupLabel>,
    pub selection: Option<SelectionInfo>,
}

impl Scene {
    pub fn build(
        graph: &ExportedGraph,
        layout: &ForceLayout,
        view: &ViewState,
        options: &SceneOptions,
    ) -> Self {
        let projected = view.transform().project_all(layout);
        let by_id: HashMap<&ModuleId, Projection> = projected.iter().map(|(id, p)| (id, *p)).collect();
        let mut circles = Vec::new();
        for id in depth_order(&projected) {
            let (Some(vertex), Some(module)) = (layout.vertex(id), graph.get(id)) else {
                continue;
            };
            let Some(Projection { position: Some([x, y]), depth }) = by_id.get(id).copied() else {
                continue;
            };
            let radius = (vertex.size * view.zoom() / depth * options.circle_scale).ceil();
            if radius <= MIN_RADIUS as f64 {
                continue;
            }
            let value = vertex
                .fixed_value
                .unwrap_or(BASE_VALUE + DEPTH_VALUE / depth);
            circles.push(Circle {
                id: vertex.id.clone(),
                label: module.label().to_string(),
                top_dir: module.top_dir.clone(),
                external: vertex.external,
                position: [x as i32, y as i32],
                radius: radius as u32,
                color: hsv_to_rgb8(vertex.hue, vertex.saturation, value),
                depth,
            });
        }

        let selection = view
            .selected()
            .and_then(|id| graph.get(id).map(|module| (id, module)));

        let segments = {
            let at: HashMap<&ModuleId, &Circle> = circles.iter().map(|c| (&c.id, c)).collect();
            let filter = selection.map(|(id, module)| (id, module.top_dir.as_str()));
            let mut segments = Vec::new();
            for a in circles.iter().filter(|c| !c.external) {
                let (Some(module), Some(vertex)) = (graph.get(&a.id), layout.vertex(&a.id)) else {
                    continue;
                };
                for to in &module.imports {
                    let Some(b) = at.get(to) else { continue };
                    if a.id == b.id || !options.relations.shows(a, b, filter) {
                        continue;
                    }
                    segments.push(Segment {
                        from: a.id.clone(),
                        to: b.id.clone(),
                        start: a.position,
                        end: b.position,
                        color: hsv_to_rgb8(vertex.hue, vertex.saturation, 1.0),
                    });
                }
            }
            segments
        };

        let groups = group_labels(&circles, layout, view);

        let selection = selection.map(|(id, module)| {
            let mut imports: Vec<String> = module
                .imports
                .iter()
                .filter_map(|to| graph.get(to))
                .map(|m| m.abs_path.replace(EXTERNAL_SCHEME, SHORT_EXTERNAL_SCHEME))
                .collect();
            imports.sort();
            SelectionInfo {
                id: id.clone(),
                title: module.mod_path.clone(),
                imports,
            }
        });

        Self {
            circles,
            segments,
            groups,
            selection,
        }
    }

    pub fn circle(&self, id: &ModuleId) -> Option<&Circle> {
        self.circles.iter().find(|c| &c.id == id)
    }

    /// The nearest circle containing (`x`, `y`).
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Circle> {
        self.circles.iter().rev().find(|c| c.contains(x, y))
    }
}

/// Labels for groups with more than one circle on the near half of the
/// scene, placed at the median position when that lies inside the viewport.
fn group_labels(circles: &[Circle], layout: &ForceLayout, view: &ViewState) -> Vec<GroupLabel> {
    if circles.is_empty() {
        return Vec::new();
    }
    let average = circles.iter().map(|c| c.depth).sum::<f64>() / circles.len() as f64;

    let mut members: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for circle in circles.iter().filter(|c| !c.external && c.depth < average) {
        let (xs, ys) = members.entry(circle.top_dir.as_str()).or_default();
        xs.push(circle.position[0] as f64);
        ys.push(circle.position[1] as f64);
    }

    members
        .into_iter()
        .filter(|(_, (xs, _))| xs.len() > 1)
        .filter_map(|(name, (xs, ys))| {
            let x = median(xs);
            let y = median(ys);
            let inside = 0.0 < x && x < view.width() && 0.0 < y && y < view.height();
            let hue = layout.group_hue(name)?;
            inside.then(|| GroupLabel {
                text: name.to_uppercase(),
                position: [x, y],
                color: hsv_to_rgb8(hue, LABEL_SATURATION, 1.0),
            })
        })
        .collect()
}

/// Median of a non-empty sample; the mean of the middle pair for even sizes.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
