//! Command-line front ends.
//!
//! - `modsphere-analyze <PROJECT_DIR> <OUTPUT_FILE>`: build and save a graph
//! - `modsphere-view <INPUT_FILE>`: lay out a saved graph and print the scene

use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::ModsphereConfig;
use crate::error::Result;
use crate::graph::{build_graph, ExportedGraph, GraphStats};
use crate::layout::ForceLayout;
use crate::view::{RelationMode, Scene, SceneOptions, ViewState};

#[derive(Parser, Debug)]
#[command(name = "modsphere-analyze")]
#[command(about = "Extract the module dependency graph of a Python project")]
pub struct AnalyzeArgs {
    /// Project root to scan
    pub project_dir: PathBuf,

    /// Where to write the graph literal
    pub output: PathBuf,

    /// Also write the graph as JSON next to the output (`<OUTPUT>.json`)
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    pub fn json_path(&self) -> PathBuf {
        let mut name = self.output.clone().into_os_string();
        name.push(".json");
        PathBuf::from(name)
    }
}

#[derive(Parser, Debug)]
#[command(name = "modsphere-view")]
#[command(about = "Lay out a module graph on a sphere and print the projected scene")]
pub struct ViewArgs {
    /// Graph file written by modsphere-analyze
    pub input: PathBuf,

    /// TOML config with [layout] and [view] tables
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for the initial placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of layout steps
    #[arg(long)]
    pub steps: Option<usize>,

    #[arg(long)]
    pub width: Option<f64>,

    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long)]
    pub zoom: Option<f64>,

    /// Which relations to draw
    #[arg(long, value_enum, default_value_t = RelationMode::All)]
    pub relations: RelationMode,

    /// Select a module by package path
    #[arg(long)]
    pub select: Option<String>,

    /// Print the scene as JSON
    #[arg(long)]
    pub json: bool,
}

impl ViewArgs {
    /// The config file (or defaults) with command-line overrides applied.
    pub fn resolve_config(&self) -> ModsphereConfig {
        let mut config = match &self.config {
            Some(path) => ModsphereConfig::load(path),
            None => ModsphereConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.layout.seed = seed;
        }
        if let Some(steps) = self.steps {
            config.layout.steps = steps;
        }
        if let Some(width) = self.width {
            config.view.width = width;
        }
        if let Some(height) = self.height {
            config.view.height = height;
        }
        if let Some(zoom) = self.zoom {
            config.view.zoom = zoom;
        }
        config
    }
}

/// Build the graph of `args.project_dir` and save it.
pub fn analyze(args: &AnalyzeArgs) -> Result<GraphStats> {
    info!(root = %args.project_dir.display(), "analyzing project");
    let graph = build_graph(&args.project_dir)?;
    let exported = graph.export();
    exported.save(&args.output)?;
    if args.json {
        let path = args.json_path();
        exported.save_json(&path)?;
        info!(path = %path.display(), "JSON graph written");
    }
    Ok(graph.stats())
}

/// Load, lay out and project the graph named by `args`.
pub fn view(args: &ViewArgs) -> Result<Scene> {
    let config = args.resolve_config();
    let graph = ExportedGraph::load(&args.input)?;

    info!(modules = graph.len(), steps = config.layout.steps, "preparing layout");
    let mut layout = ForceLayout::new(&graph, &config.layout);
    layout.run();

    let mut state = ViewState::new(&config.view);
    if let Some(path) = &args.select {
        let found = graph
            .modules
            .iter()
            .find(|(_, m)| &m.mod_path == path)
            .map(|(id, _)| id.clone());
        if found.is_none() {
            warn!(module = %path, "no module with this package path");
        }
        state.select(found);
    }

    let options = SceneOptions {
        circle_scale: config.view.circle_scale,
        relations: args.relations,
    };
    Ok(Scene::build(&graph, &layout, &state, &options))
}

/// Plain-text rendering of a scene, back to front.
pub fn render_text(scene: &Scene) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} circles, {} relations, {} group labels",
        scene.circles.len(),
        scene.segments.len(),
        scene.groups.len()
    );
    for circle in &scene.circles {
        let [r, g, b] = circle.color;
        let _ = writeln!(
            out,
            "  {:>7.3}  r={:<3} ({:>5}, {:>5})  #{:02x}{:02x}{:02x}  {}",
            circle.depth, circle.radius, circle.position[0], circle.position[1], r, g, b, circle.label
        );
    }
    for label in &scene.groups {
        let _ = writeln!(
            out,
            "  [{}] at ({:.0}, {:.0})",
            label.text, label.position[0], label.position[1]
        );
    }
    if let Some(selection) = &scene.selection {
        let _ = writeln!(out, "{}", selection.title);
        let _ = writeln!(out, "imports {} modules", selection.imports.len());
        for import in &selection.imports {
            let _ = writeln!(out, "  {import}");
        }
    }
    out
}
