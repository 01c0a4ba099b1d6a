//! Module graph: registration, resolution, assembly and persistence.

pub mod builder;
pub mod engine;
pub mod persistence;
pub mod registry;
pub mod types;

pub use builder::{build_from_extractions, build_graph, extract_all};
pub use engine::{GraphStats, ModuleGraph};
pub use registry::{PackageTable, Registry, Resolver, Target};
pub use types::{
    ExportedGraph, ExportedModule, FileExtraction, ImportStatement, Module, ModuleId, ModuleKind,
    EXTERNAL_GROUP, EXTERNAL_SCHEME, PACKAGE_MARKER,
};
