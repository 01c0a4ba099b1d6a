//! Core types for the module graph.
//!
//! Defines module identities, the raw import descriptors produced by the
//! extractor, and the exported record shape written to graph files.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::parser::SourceFile;

/// Top-level group shared by every external module.
pub const EXTERNAL_GROUP: &str = "__external__";
/// Locator prefix for external modules.
pub const EXTERNAL_SCHEME: &str = "external://";
/// Base name of a file that makes its directory importable.
pub const PACKAGE_MARKER: &str = "__init__";
/// Source extension handled by the extractor.
pub const SOURCE_EXTENSION: &str = "py";

/// Opaque module identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// A fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a module is backed by a project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// A project file. `package_marker` is set for `__init__.py`.
    Internal { package_marker: bool },
    /// A name the project imports but does not contain.
    External,
}

/// A node of the module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub kind: ModuleKind,
    /// Short name: file stem, directory name for package markers, or the
    /// last dotted segment of an external name.
    pub name: String,
    /// Dotted package path (`pkg.sub.mod`), or the qualified name for
    /// external modules.
    pub package_path: String,
    /// First segment of the project-relative path, or [`EXTERNAL_GROUP`].
    pub top_dir: String,
    /// Absolute file path, or `external://<name>`.
    pub locator: String,
}

impl Module {
    /// Placeholder module for an unresolved qualified name.
    pub fn external(qualified: &str) -> Self {
        let name = qualified.rsplit('.').next().unwrap_or(qualified).to_string();
        Self {
            id: ModuleId::generate(),
            kind: ModuleKind::External,
            name,
            package_path: qualified.to_string(),
            top_dir: EXTERNAL_GROUP.to_string(),
            locator: format!("{EXTERNAL_SCHEME}{qualified}"),
        }
    }

    pub fn is_external(&self) -> bool {
        self.kind == ModuleKind::External
    }

    /// Dotted segments of the directory this module lives in.
    ///
    /// Derived from the package path: a package marker *is* its directory,
    /// any other module sits one segment below it.
    pub fn package_dir(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self
            .package_path
            .split('.')
            .filter(|s| !s.is_empty())
            .collect();
        if !matches!(self.kind, ModuleKind::Internal { package_marker: true }) {
            segments.pop();
        }
        segments
    }
}

/// One name pulled out of an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Module after `from`, with any leading level markers kept verbatim.
    pub from: Option<String>,
    /// Imported name, or `*`.
    pub name: String,
    pub alias: Option<String>,
    /// Line the statement starts on (1-indexed).
    pub line: usize,
}

impl ImportStatement {
    /// Number of leading level markers (`.`) on the `from` path.
    pub fn level(&self) -> usize {
        self.from
            .as_deref()
            .map(|f| f.chars().take_while(|&c| c == '.').count())
            .unwrap_or(0)
    }

    pub fn is_relative(&self) -> bool {
        self.level() > 0
    }

    /// The `from` path with level markers removed, for relative imports.
    pub fn relative_remainder(&self) -> Option<&str> {
        let from = self.from.as_deref()?;
        if self.is_relative() {
            Some(from.trim_start_matches('.'))
        } else {
            None
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

/// Everything pulled out of a single source file.
#[derive(Debug, Clone)]
pub struct FileExtraction {
    pub source: SourceFile,
    pub imports: Vec<ImportStatement>,
}

/// One module record of a graph file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedModule {
    pub top_dir: String,
    pub mod_name: String,
    pub mod_path: String,
    pub abs_path: String,
    pub imports: BTreeSet<ModuleId>,
}

impl ExportedModule {
    pub fn is_external(&self) -> bool {
        self.top_dir == EXTERNAL_GROUP
    }

    /// Display label: the package path below its group, or the qualified
    /// name for external modules.
    pub fn label(&self) -> &str {
        if self.is_external() {
            return self
                .abs_path
                .strip_prefix(EXTERNAL_SCHEME)
                .unwrap_or(&self.mod_path);
        }
        self.mod_path
            .strip_prefix(self.top_dir.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(&self.mod_path)
    }
}

/// The serialized form of a module graph: id → record, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportedGraph {
    pub modules: BTreeMap<ModuleId, ExportedModule>,
}

impl ExportedGraph {
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ExportedModule> {
        self.modules.get(id)
    }

    /// Every (importer, imported) pair.
    pub fn relations(&self) -> impl Iterator<Item = (&ModuleId, &ModuleId)> {
        self.modules
            .iter()
            .flat_map(|(id, module)| module.imports.iter().map(move |to| (id, to)))
    }

    /// Number of modules importing `id`.
    pub fn importer_count(&self, id: &ModuleId) -> usize {
        self.modules
            .values()
            .filter(|module| module.imports.contains(id))
            .count()
    }
}
