//! The module graph.
//!
//! Uses petgraph to store modules and their import relations. Relations
//! have set semantics: adding the same pair twice leaves one edge.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use super::types::*;

/// Modules and the deduplicated relations between them.
pub struct ModuleGraph {
    /// The directed graph: an edge `a -> b` means `a` imports `b`.
    graph: DiGraph<Module, ()>,
    /// Index: module id -> node index.
    index: HashMap<ModuleId, NodeIndex>,
    /// Index: qualified external name -> node index.
    external_index: HashMap<String, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            external_index: HashMap::new(),
        }
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Add a module. Adding an id that is already present is a no-op.
    pub fn add_module(&mut self, module: Module) -> NodeIndex {
        if let Some(&idx) = self.index.get(&module.id) {
            return idx;
        }
        let id = module.id.clone();
        let qualified = module.is_external().then(|| module.package_path.clone());
        let idx = self.graph.add_node(module);
        self.index.insert(id, idx);
        if let Some(qualified) = qualified {
            self.external_index.insert(qualified, idx);
        }
        idx
    }

    /// The placeholder module for `qualified`, created on first use.
    pub fn external(&mut self, qualified: &str) -> ModuleId {
        if let Some(&idx) = self.external_index.get(qualified) {
            return self.graph[idx].id.clone();
        }
        debug!(name = qualified, "adding external module");
        let idx = self.add_module(Module::external(qualified));
        self.graph[idx].id.clone()
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Record that `from` imports `to`. Returns `false` if either id is
    /// unknown. Repeated calls keep a single relation.
    pub fn add_relation(&mut self, from: &ModuleId, to: &ModuleId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => {
                self.graph.update_edge(a, b, ());
                true
            }
            _ => false,
        }
    }

    // ─── Queries ────────────────────────────────────────────────

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Look up an internal module by package path or an external one by
    /// qualified name.
    pub fn find_by_path(&self, package_path: &str) -> Option<&Module> {
        self.graph
            .node_weights()
            .find(|m| m.package_path == package_path)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.graph.node_weights()
    }

    /// Ids imported by `id`.
    pub fn imports(&self, id: &ModuleId) -> BTreeSet<ModuleId> {
        let Some(&idx) = self.index.get(id) else {
            return BTreeSet::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| self.graph[e.target()].id.clone())
            .collect()
    }

    /// Ids of modules importing `id`.
    pub fn importers(&self, id: &ModuleId) -> BTreeSet<ModuleId> {
        let Some(&idx) = self.index.get(id) else {
            return BTreeSet::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| self.graph[e.source()].id.clone())
            .collect()
    }

    /// All relations as (importer, imported) pairs.
    pub fn relations(&self) -> Vec<(&ModuleId, &ModuleId)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()].id, &self.graph[e.target()].id))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let external_modules = self.external_index.len();
        GraphStats {
            internal_modules: self.graph.node_count() - external_modules,
            external_modules,
            relations: self.graph.edge_count(),
        }
    }

    // ─── Export ─────────────────────────────────────────────────

    /// The graph-file form: one record per module, keyed by id.
    pub fn export(&self) -> ExportedGraph {
        let modules: BTreeMap<ModuleId, ExportedModule> = self
            .graph
            .node_indices()
            .map(|idx| {
                let module = &self.graph[idx];
                let imports = self
                    .graph
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| self.graph[e.target()].id.clone())
                    .collect();
                let record = ExportedModule {
                    top_dir: module.top_dir.clone(),
                    mod_name: module.name.clone(),
                    mod_path: module.package_path.clone(),
                    abs_path: module.locator.clone(),
                    imports,
                };
                (module.id.clone(), record)
            })
            .collect();
        ExportedGraph { modules }
    }
}

impl Default for ModuleGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub internal_modules: usize,
    pub external_modules: usize,
    pub relations: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modules ({} internal, {} external), {} relations",
            self.internal_modules + self.external_modules,
            self.internal_modules,
            self.external_modules,
            self.relations
        )
    }
}
