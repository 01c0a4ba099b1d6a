//! Force-directed placement of modules on the unit sphere.
//!
//! Each step accumulates pairwise forces into velocities, integrates
//! positions with an annealed speed, then projects every position back
//! onto the sphere. The projection is a separate pass: the force law alone
//! does not keep vertices on the sphere and does not conserve energy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::vector::Vec3;
use crate::config::LayoutConfig;
use crate::graph::{ExportedGraph, ModuleId};

/// Base circle size before degree contributions.
const BASE_SIZE: f64 = 7.0;
/// Size added per incident relation, in either direction.
const DEGREE_SIZE: f64 = 2.0;
const INTERNAL_SATURATION: f64 = 0.8;
const EXTERNAL_VALUE: f64 = 0.75;

/// Layout state of one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
    pub id: ModuleId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub hue: f64,
    pub saturation: f64,
    /// Brightness that ignores depth; set for external modules.
    pub fixed_value: Option<f64>,
    pub size: f64,
    pub group: String,
    pub external: bool,
}

/// How two vertices interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    /// Same group, both internal: banded attraction and repulsion.
    Sibling,
    /// Different groups: short-range repulsion only.
    Foreign,
    /// Either endpoint external: stronger short-range repulsion.
    External,
}

impl PairKind {
    pub fn classify(a: &Vertex, b: &Vertex) -> Self {
        if a.external || b.external {
            PairKind::External
        } else if a.group == b.group {
            PairKind::Sibling
        } else {
            PairKind::Foreign
        }
    }
}

/// The force law. Returns the factor applied along `pos_b - pos_a`, or
/// `None` when the pair does not interact at this distance. Positive
/// factors attract, negative ones repel.
pub fn pair_factor(config: &LayoutConfig, kind: PairKind, distance: f64) -> Option<f64> {
    match kind {
        PairKind::Sibling if distance > config.far_threshold => {
            Some(config.far_pull * (distance - config.far_threshold))
        }
        PairKind::Sibling if distance < config.near_threshold => {
            Some(-config.near_push * (config.near_threshold - distance))
        }
        PairKind::Sibling => None,
        PairKind::Foreign if distance < config.cross_threshold => Some(-config.cross_push),
        PairKind::External if distance < config.cross_threshold => Some(-config.external_push),
        PairKind::Foreign | PairKind::External => None,
    }
}

/// Step multiplier `1 / (1 + step / anneal)`.
pub fn anneal_speed(step: usize, anneal: f64) -> f64 {
    1.0 / (1.0 + step as f64 / anneal)
}

/// A group of internal modules sharing a hue and an initial anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub name: String,
    pub hue: f64,
}

pub struct ForceLayout {
    vertices: Vec<Vertex>,
    index: HashMap<ModuleId, usize>,
    groups: Vec<Group>,
    config: LayoutConfig,
    steps_run: usize,
}

impl ForceLayout {
    /// Seed vertices for every module of `graph`.
    ///
    /// Groups are taken in order of first appearance with modules visited
    /// by id, so a fixed seed and graph always give the same start.
    pub fn new(graph: &ExportedGraph, config: &LayoutConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut group_names: Vec<&str> = Vec::new();
        for module in graph.modules.values().filter(|m| !m.is_external()) {
            if !group_names.contains(&module.top_dir.as_str()) {
                group_names.push(&module.top_dir);
            }
        }
        let group_count = group_names.len() as f64;
        let anchors: HashMap<&str, (Vec3, f64)> = group_names
            .iter()
            .enumerate()
            .map(|(k, name)| (*name, (random_point(&mut rng), k as f64 / group_count)))
            .collect();

        let mut vertices = Vec::with_capacity(graph.len());
        for (id, module) in &graph.modules {
            let degree = module.imports.len() + graph.importer_count(id);
            let size = BASE_SIZE + DEGREE_SIZE * degree as f64;
            let vertex = match anchors.get(module.top_dir.as_str()) {
                Some(&(anchor, hue)) if !module.is_external() => {
                    let jitter = Vec3::new(
                        rng.gen_range(-config.jitter..=config.jitter),
                        rng.gen_range(-config.jitter..=config.jitter),
                        rng.gen_range(-config.jitter..=config.jitter),
                    );
                    let position = (anchor + jitter)
                        .normalized()
                        .unwrap_or_else(|| random_direction(&mut rng));
                    Vertex {
                        id: id.clone(),
                        position,
                        velocity: Vec3::ZERO,
                        hue,
                        saturation: INTERNAL_SATURATION,
                        fixed_value: None,
                        size,
                        group: module.top_dir.clone(),
                        external: false,
                    }
                }
                _ => Vertex {
                    id: id.clone(),
                    position: random_direction(&mut rng),
                    velocity: Vec3::ZERO,
                    hue: 0.0,
                    saturation: 0.0,
                    fixed_value: Some(EXTERNAL_VALUE),
                    size,
                    group: module.top_dir.clone(),
                    external: true,
                },
            };
            vertices.push(vertex);
        }

        let index = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect();
        let groups = group_names
            .iter()
            .map(|name| Group {
                name: name.to_string(),
                hue: anchors[name].1,
            })
            .collect();

        debug!(vertices = graph.len(), groups = group_names.len(), seed = config.seed, "layout seeded");
        Self {
            vertices,
            index,
            groups,
            config: config.clone(),
            steps_run: 0,
        }
    }

    // ─── Simulation ─────────────────────────────────────────────

    /// Run the configured number of steps.
    pub fn run(&mut self) {
        self.run_with(|_, _| {});
    }

    /// Run every step, calling `observe(step, layout)` after each one.
    pub fn run_with(&mut self, mut observe: impl FnMut(usize, &ForceLayout)) {
        for step in 0..self.config.steps {
            self.step(step);
            observe(step, self);
        }
        info!(steps = self.config.steps, vertices = self.vertices.len(), "layout finished");
    }

    /// One simulation step at annealing index `step`.
    pub fn step(&mut self, step: usize) {
        let speed = anneal_speed(step, self.config.anneal);
        self.accumulate_forces();
        let previous = self.integrate(speed);
        self.renormalize(&previous);
        self.steps_run += 1;
    }

    /// Add every ordered pair's contribution to both velocities. Forces are
    /// computed from the positions at the start of the step.
    fn accumulate_forces(&mut self) {
        let dt = self.config.dt;
        for a in 0..self.vertices.len() {
            for b in 0..self.vertices.len() {
                if a == b {
                    continue;
                }
                let kind = PairKind::classify(&self.vertices[a], &self.vertices[b]);
                let d = self.vertices[b].position - self.vertices[a].position;
                if let Some(factor) = pair_factor(&self.config, kind, d.norm()) {
                    let push = d * (dt * factor);
                    self.vertices[a].velocity += push;
                    self.vertices[b].velocity -= push;
                }
            }
        }
    }

    /// Move every vertex along its velocity. Returns the positions held
    /// before the move.
    fn integrate(&mut self, speed: f64) -> Vec<Vec3> {
        let scale = self.config.dt * speed;
        self.vertices
            .iter_mut()
            .map(|vertex| {
                let before = vertex.position;
                vertex.position += vertex.velocity * scale;
                before
            })
            .collect()
    }

    /// Put every vertex back on the unit sphere. A vertex pushed onto the
    /// origin keeps the direction it had before integration.
    fn renormalize(&mut self, previous: &[Vec3]) {
        for (vertex, before) in self.vertices.iter_mut().zip(previous) {
            vertex.position = vertex.position.normalized().unwrap_or(*before);
        }
    }

    // ─── Queries ────────────────────────────────────────────────

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex(&self, id: &ModuleId) -> Option<&Vertex> {
        self.index.get(id).map(|&i| &self.vertices[i])
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_hue(&self, name: &str) -> Option<f64> {
        self.groups.iter().find(|g| g.name == name).map(|g| g.hue)
    }

    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }
}

/// A uniformly random point of the cube [-1, 1]³.
fn random_point(rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
    )
}

/// A random cube point projected onto the sphere, redrawn if degenerate.
fn random_direction(rng: &mut StdRng) -> Vec3 {
    loop {
        if let Some(direction) = random_point(rng).normalized() {
            return direction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ExportedModule;
    use std::collections::{BTreeMap, BTreeSet};

    fn module(top_dir: &str, mod_path: &str, imports: &[&str]) -> ExportedModule {
        ExportedModule {
            top_dir: top_dir.to_string(),
            mod_name: mod_path.rsplit('.').next().unwrap().to_string(),
            mod_path: mod_path.to_string(),
            abs_path: format!("/p/{}.py", mod_path.replace('.', "/")),
            imports: imports.iter().map(|&i| ModuleId::from(i)).collect::<BTreeSet<_>>(),
        }
    }

    fn sample_graph() -> ExportedGraph {
        let mut modules = BTreeMap::new();
        modules.insert(ModuleId::from("a1"), module("app", "app.main", &["a2", "x1"]));
        modules.insert(ModuleId::from("a2"), module("app", "app.util", &["x1"]));
        modules.insert(ModuleId::from("a3"), module("app", "app.cli", &["a1"]));
        modules.insert(ModuleId::from("l1"), module("lib", "lib.core", &["x2"]));
        modules.insert(ModuleId::from("l2"), module("lib", "lib.io", &["l1"]));
        let mut os = module(crate::graph::EXTERNAL_GROUP, "os", &[]);
        os.abs_path = "external://os".to_string();
        modules.insert(ModuleId::from("x1"), os);
        let mut json = module(crate::graph::EXTERNAL_GROUP, "json", &[]);
        json.abs_path = "external://json".to_string();
        modules.insert(ModuleId::from("x2"), json);
        ExportedGraph { modules }
    }

    fn vertex(id: &str, group: &str, external: bool, position: Vec3) -> Vertex {
        Vertex {
            id: ModuleId::from(id),
            position,
            velocity: Vec3::ZERO,
            hue: 0.0,
            saturation: 0.0,
            fixed_value: None,
            size: BASE_SIZE,
            group: group.to_string(),
            external,
        }
    }

    fn layout_of(vertices: Vec<Vertex>) -> ForceLayout {
        let index = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect();
        ForceLayout {
            vertices,
            index,
            groups: Vec::new(),
            config: LayoutConfig::default(),
            steps_run: 0,
        }
    }

    #[test]
    fn test_anneal_speed() {
        assert_eq!(anneal_speed(0, 4.0), 1.0);
        assert_eq!(anneal_speed(4, 4.0), 0.5);
        assert_eq!(anneal_speed(12, 4.0), 0.25);
    }

    #[test]
    fn test_force_regimes() {
        let config = LayoutConfig::default();

        // Sibling band: nothing between the thresholds.
        assert_eq!(pair_factor(&config, PairKind::Sibling, 0.4), None);
        let near = pair_factor(&config, PairKind::Sibling, 0.1).unwrap();
        assert!((near - (-1.9 * 0.1)).abs() < 1e-12);
        let far = pair_factor(&config, PairKind::Sibling, 1.0).unwrap();
        assert!(far > 0.0);

        assert_eq!(pair_factor(&config, PairKind::Foreign, 0.3), Some(-0.1));
        assert_eq!(pair_factor(&config, PairKind::Foreign, 0.5), None);
        assert_eq!(pair_factor(&config, PairKind::External, 0.3), Some(-0.3));
        assert_eq!(pair_factor(&config, PairKind::External, 0.5), None);
    }

    #[test]
    fn test_pair_classification() {
        let a = vertex("a", "app", false, Vec3::new(1.0, 0.0, 0.0));
        let b = vertex("b", "app", false, Vec3::new(0.0, 1.0, 0.0));
        let c = vertex("c", "lib", false, Vec3::new(0.0, 0.0, 1.0));
        let x = vertex("x", crate::graph::EXTERNAL_GROUP, true, Vec3::new(-1.0, 0.0, 0.0));
        let y = vertex("y", crate::graph::EXTERNAL_GROUP, true, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(PairKind::classify(&a, &b), PairKind::Sibling);
        assert_eq!(PairKind::classify(&a, &c), PairKind::Foreign);
        assert_eq!(PairKind::classify(&a, &x), PairKind::External);
        assert_eq!(PairKind::classify(&x, &y), PairKind::External);
    }

    #[test]
    fn test_close_foreign_pair_separates() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.1, 0.0).normalized().unwrap();
        let mut layout = layout_of(vec![vertex("a", "app", false, a), vertex("b", "lib", false, b)]);
        let before = a.distance(b);

        layout.step(0);

        let after = layout.vertices()[0].position.distance(layout.vertices()[1].position);
        assert!(after > before, "{after} <= {before}");
    }

    #[test]
    fn test_velocities_are_equal_and_opposite() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.05, 0.0).normalized().unwrap();
        let mut layout = layout_of(vec![vertex("a", "app", false, a), vertex("b", "app", false, b)]);
        layout.accumulate_forces();
        let sum = layout.vertices()[0].velocity + layout.vertices()[1].velocity;
        assert!(sum.norm() < 1e-12);
        assert!(layout.vertices()[0].velocity.norm() > 0.0);
    }

    #[test]
    fn test_collapsed_vertex_keeps_direction() {
        let start = Vec3::new(0.0, 0.0, 1.0);
        let mut layout = layout_of(vec![vertex("a", "app", false, start)]);
        layout.vertices[0].velocity = Vec3::new(0.0, 0.0, -1.0) * (1.0 / layout.config.dt);

        layout.step(0);

        assert_eq!(layout.vertices()[0].position, start);
    }

    #[test]
    fn test_unit_norm_after_every_step() {
        let graph = sample_graph();
        let mut layout = ForceLayout::new(&graph, &LayoutConfig::default());
        for vertex in layout.vertices() {
            assert!((vertex.position.norm() - 1.0).abs() < 1e-9);
        }

        let mut observed = 0;
        layout.run_with(|_, layout| {
            observed += 1;
            for vertex in layout.vertices() {
                assert!((vertex.position.norm() - 1.0).abs() < 1e-9);
            }
        });
        assert_eq!(observed, 40);
        assert_eq!(layout.steps_run(), 40);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let graph = sample_graph();
        let config = LayoutConfig {
            seed: 42,
            ..LayoutConfig::default()
        };
        let mut first = ForceLayout::new(&graph, &config);
        let mut second = ForceLayout::new(&graph, &config);
        first.run();
        second.run();
        assert_eq!(first.vertices(), second.vertices());

        let mut other = ForceLayout::new(
            &graph,
            &LayoutConfig {
                seed: 43,
                ..config
            },
        );
        other.run();
        assert_ne!(first.vertices(), other.vertices());
    }

    #[test]
    fn test_visual_attributes() {
        let graph = sample_graph();
        let layout = ForceLayout::new(&graph, &LayoutConfig::default());

        // a1 imports a2 and x1 and is imported by a3.
        let main = layout.vertex(&ModuleId::from("a1")).unwrap();
        assert_eq!(main.size, 7.0 + 2.0 * 3.0);
        assert_eq!(main.saturation, 0.8);
        assert_eq!(main.fixed_value, None);

        // x1 is imported by a1 and a2.
        let os = layout.vertex(&ModuleId::from("x1")).unwrap();
        assert!(os.external);
        assert_eq!(os.size, 7.0 + 2.0 * 2.0);
        assert_eq!((os.hue, os.saturation), (0.0, 0.0));
        assert_eq!(os.fixed_value, Some(0.75));

        assert_eq!(layout.groups().len(), 2);
        assert_eq!(layout.group_hue("app"), Some(0.0));
        assert_eq!(layout.group_hue("lib"), Some(0.5));
        assert_eq!(layout.vertex(&ModuleId::from("l2")).unwrap().hue, 0.5);
    }

    #[test]
    fn test_empty_graph() {
        let mut layout = ForceLayout::new(&ExportedGraph::default(), &LayoutConfig::default());
        layout.run();
        assert!(layout.vertices().is_empty());
        assert!(layout.groups().is_empty());
    }
}
