//! Graph builder: scans a directory and builds the module graph.
//!
//! Walks Python files respecting .gitignore, extracts imports from each in
//! parallel, then registers and resolves them sequentially.

use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::info;

use super::engine::ModuleGraph;
use super::registry::Registry;
use super::types::FileExtraction;
use crate::error::{ModsphereError, Result};
use crate::parser::{collect_sources, extract_file, SourceFile};

/// Build the module graph for every Python file under `root`.
///
/// Any unreadable file or unresolvable relative import aborts the build.
pub fn build_graph(root: &Path) -> Result<ModuleGraph> {
    let sources = collect_sources(root)?;
    info!(root = %root.display(), files = sources.len(), "extracting imports");
    let extractions = extract_all(sources)?;
    build_from_extractions(extractions)
}

/// Read and extract each file. Extraction shares no state, so it runs in
/// parallel; the result keeps the input order.
pub fn extract_all(sources: Vec<SourceFile>) -> Result<Vec<FileExtraction>> {
    sources
        .into_par_iter()
        .map(|source| {
            let text = fs::read_to_string(&source.abs_path).map_err(|e| ModsphereError::ReadSource {
                path: source.abs_path.clone(),
                source: e,
            })?;
            Ok(extract_file(source, &text))
        })
        .collect()
}

/// Register every extraction, then resolve. Registration of all modules
/// completes before the first import is resolved.
pub fn build_from_extractions(extractions: Vec<FileExtraction>) -> Result<ModuleGraph> {
    let mut registry = Registry::new();
    for extraction in extractions {
        registry.register(extraction);
    }
    let graph = registry.freeze().into_graph()?;
    info!(stats = %graph.stats(), "module graph built");
    Ok(graph)
}
