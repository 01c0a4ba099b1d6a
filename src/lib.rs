//! # Modsphere
//!
//! Python module dependency graphs, laid out on a sphere.
//!
//! Modsphere scans a Python project, extracts its import statements with
//! permissive pattern matching, resolves them into a graph of internal and
//! external modules, and places that graph on the unit sphere with a small
//! force simulation. A perspective view turns the sphere into a 2-D scene
//! that any renderer can paint.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modsphere::{build_graph, ForceLayout, LayoutConfig, Scene, SceneOptions, ViewState};
//! use std::path::Path;
//!
//! let graph = build_graph(Path::new("my_project"))?.export();
//!
//! let mut layout = ForceLayout::new(&graph, &LayoutConfig::default());
//! layout.run();
//!
//! let view = ViewState::default();
//! let scene = Scene::build(&graph, &layout, &view, &SceneOptions::default());
//! println!("{} circles", scene.circles.len());
//! # Ok::<(), modsphere::ModsphereError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod literal;
pub mod parser;
pub mod view;

// Re-exports for convenience
pub use config::{LayoutConfig, ModsphereConfig, ViewConfig};
pub use error::{ModsphereError, Result};

pub use graph::{
    build_graph, ExportedGraph, ExportedModule, GraphStats, Module, ModuleGraph, ModuleId,
};
pub use layout::{ForceLayout, Vec3, Vertex};
pub use parser::{extract_imports, SourceFile};
pub use view::{Projection, RelationMode, Scene, SceneOptions, ViewState, ViewTransform};
