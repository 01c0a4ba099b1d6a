//! Module registration and import resolution.
//!
//! Resolution is split into two phases with a hard barrier between them:
//! a [`Registry`] accepts every internal module and builds the
//! [`PackageTable`]; [`Registry::freeze`] turns it into a read-only
//! [`Resolver`] which links each import descriptor to its target.

use std::collections::HashMap;
use std::path::{Component, Path};
use tracing::{debug, warn};

use super::engine::ModuleGraph;
use super::types::*;
use crate::error::{ModsphereError, Result};

/// Dotted package path → internal module id.
#[derive(Debug, Clone, Default)]
pub struct PackageTable {
    paths: HashMap<String, ModuleId>,
}

impl PackageTable {
    pub fn get(&self, package_path: &str) -> Option<&ModuleId> {
        self.paths.get(package_path)
    }

    pub fn contains(&self, package_path: &str) -> bool {
        self.paths.contains_key(package_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn insert(&mut self, package_path: String, id: ModuleId) -> Option<ModuleId> {
        self.paths.insert(package_path, id)
    }
}

/// Where an import descriptor points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Internal(ModuleId),
    /// Qualified name of a module outside the project.
    External(String),
}

/// Phase 1: collects internal modules.
#[derive(Debug, Default)]
pub struct Registry {
    modules: Vec<Module>,
    imports: Vec<Vec<ImportStatement>>,
    packages: PackageTable,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one project file and its extracted imports.
    pub fn register(&mut self, extraction: FileExtraction) -> ModuleId {
        let module = internal_module(&extraction.source.rel_path, &extraction.source.abs_path);
        let id = module.id.clone();

        if let Some(previous) = self
            .packages
            .insert(module.package_path.clone(), id.clone())
        {
            warn!(
                package = %module.package_path,
                %previous,
                "package path registered twice, keeping the later module"
            );
        }
        debug!(package = %module.package_path, imports = extraction.imports.len(), "registered module");

        self.modules.push(module);
        self.imports.push(extraction.imports);
        id
    }

    pub fn package_table(&self) -> &PackageTable {
        &self.packages
    }

    /// End registration. No module can be added afterwards.
    pub fn freeze(self) -> Resolver {
        Resolver {
            modules: self.modules,
            imports: self.imports,
            packages: self.packages,
        }
    }
}

/// Phase 2: resolves descriptors against the frozen package table.
#[derive(Debug)]
pub struct Resolver {
    modules: Vec<Module>,
    imports: Vec<Vec<ImportStatement>>,
    packages: PackageTable,
}

impl Resolver {
    pub fn package_table(&self) -> &PackageTable {
        &self.packages
    }

    /// Resolve a single descriptor on behalf of `importer`.
    pub fn resolve(&self, importer: &Module, statement: &ImportStatement) -> Result<Target> {
        if statement.is_relative() {
            return self.resolve_relative(importer, statement).map(Target::Internal);
        }

        match statement.from.as_deref() {
            Some(from) => {
                if let Some(id) = self.packages.get(from) {
                    return Ok(Target::Internal(id.clone()));
                }
                if statement.is_wildcard() {
                    return Ok(Target::External(from.to_string()));
                }
                let qualified = format!("{from}.{}", statement.name);
                match self.packages.get(&qualified) {
                    Some(id) => Ok(Target::Internal(id.clone())),
                    None => Ok(Target::External(qualified)),
                }
            }
            None => match self.packages.get(&statement.name) {
                Some(id) => Ok(Target::Internal(id.clone())),
                None => Ok(Target::External(statement.name.clone())),
            },
        }
    }

    /// Relative lookup: start in the importer's directory, climb one
    /// directory per extra level marker, then look for the target there.
    /// A miss retries in each enclosing directory up to the project root.
    fn resolve_relative(&self, importer: &Module, statement: &ImportStatement) -> Result<ModuleId> {
        let remainder = statement.relative_remainder().unwrap_or_default();
        let mut base = importer.package_dir();
        let climb = statement.level() - 1;

        let wanted = if remainder.is_empty() {
            statement.name.as_str()
        } else {
            remainder
        };
        let failure = |base: &[&str]| ModsphereError::Resolution {
            importer: importer.package_path.clone(),
            target: join_path(base, wanted, ""),
        };

        if climb > base.len() {
            return Err(failure(&[]));
        }
        base.truncate(base.len() - climb);

        for depth in (0..=base.len()).rev() {
            let prefix = &base[..depth];
            // The root package only answers bare dots written at the root.
            let package_fallback = depth > 0 || base.is_empty();
            for candidate in candidates(prefix, remainder, statement, package_fallback) {
                if let Some(id) = self.packages.get(&candidate) {
                    return Ok(id.clone());
                }
            }
        }

        Err(failure(&base))
    }

    /// Resolve everything and assemble the module graph.
    ///
    /// Fails on the first relative import that cannot be resolved; no
    /// partial graph is returned.
    pub fn into_graph(self) -> Result<ModuleGraph> {
        let mut graph = ModuleGraph::new();
        for module in &self.modules {
            graph.add_module(module.clone());
        }

        let mut pending_external: Vec<(String, ModuleId)> = Vec::new();
        for (module, statements) in self.modules.iter().zip(&self.imports) {
            for statement in statements {
                match self.resolve(module, statement)? {
                    Target::Internal(target) => {
                        graph.add_relation(&module.id, &target);
                    }
                    Target::External(qualified) => {
                        pending_external.push((qualified, module.id.clone()));
                    }
                }
            }
        }

        for (qualified, importer) in pending_external {
            let target = graph.external(&qualified);
            graph.add_relation(&importer, &target);
        }

        let stats = graph.stats();
        debug!(
            internal = stats.internal_modules,
            external = stats.external_modules,
            relations = stats.relations,
            "resolution complete"
        );
        Ok(graph)
    }
}

/// Package paths to try, in order, for a relative import below `prefix`.
fn candidates(
    prefix: &[&str],
    remainder: &str,
    statement: &ImportStatement,
    package_fallback: bool,
) -> Vec<String> {
    let mut out = Vec::with_capacity(2);
    if remainder.is_empty() {
        if !statement.is_wildcard() {
            out.push(join_path(prefix, &statement.name, ""));
        }
        if package_fallback {
            out.push(prefix.join("."));
        }
    } else {
        out.push(join_path(prefix, remainder, ""));
        // `from .pkg import mod` where `pkg` has no package marker.
        if !statement.is_wildcard() {
            out.push(join_path(prefix, remainder, &statement.name));
        }
    }
    out
}

fn join_path(prefix: &[&str], first: &str, second: &str) -> String {
    prefix
        .iter()
        .copied()
        .chain([first, second])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Build the registry record for a project file.
fn internal_module(rel_path: &Path, abs_path: &Path) -> Module {
    let mut segments: Vec<String> = rel_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    let top_dir = segments.first().cloned().unwrap_or_default();

    let stem = rel_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    segments.pop();

    let package_marker = stem == PACKAGE_MARKER;
    let (name, package_path) = if package_marker {
        match segments.last() {
            Some(dir) => (dir.clone(), segments.join(".")),
            None => (stem.clone(), String::new()),
        }
    } else {
        let name = stem.clone();
        segments.push(stem);
        (name, segments.join("."))
    };

    Module {
        id: ModuleId::generate(),
        kind: ModuleKind::Internal { package_marker },
        name,
        package_path,
        top_dir,
        locator: abs_path.to_string_lossy().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{extract_file, SourceFile};

    fn extraction(rel: &str, source: &str) -> FileExtraction {
        extract_file(SourceFile::new(rel, format!("/project/{rel}")), source)
    }

    fn resolver(files: &[(&str, &str)]) -> Resolver {
        let mut registry = Registry::new();
        for (rel, source) in files {
            registry.register(extraction(rel, source));
        }
        registry.freeze()
    }

    fn module_at<'a>(resolver: &'a Resolver, package_path: &str) -> &'a Module {
        resolver
            .modules
            .iter()
            .find(|m| m.package_path == package_path)
            .unwrap()
    }

    fn resolve_first(resolver: &Resolver, importer: &str) -> Result<Target> {
        let index = resolver
            .modules
            .iter()
            .position(|m| m.package_path == importer)
            .unwrap();
        resolver.resolve(&resolver.modules[index], &resolver.imports[index][0])
    }

    fn internal(resolver: &Resolver, package_path: &str) -> Target {
        Target::Internal(module_at(resolver, package_path).id.clone())
    }

    #[test]
    fn test_registration_paths() {
        let resolver = resolver(&[
            ("pkg/sub/b.py", ""),
            ("pkg/__init__.py", ""),
            ("main.py", ""),
        ]);
        let b = module_at(&resolver, "pkg.sub.b");
        assert_eq!(b.name, "b");
        assert_eq!(b.top_dir, "pkg");
        assert_eq!(b.locator, "/project/pkg/sub/b.py");

        let marker = module_at(&resolver, "pkg");
        assert_eq!(marker.name, "pkg");
        assert_eq!(marker.kind, ModuleKind::Internal { package_marker: true });

        let main = module_at(&resolver, "main");
        assert_eq!(main.top_dir, "main.py");
        assert_eq!(resolver.package_table().len(), 3);
    }

    #[test]
    fn test_absolute_from_links_directly() {
        let resolver = resolver(&[
            ("pkg/a.py", ""),
            ("main.py", "from pkg.a import thing\n"),
        ]);
        assert_eq!(resolve_first(&resolver, "main").unwrap(), internal(&resolver, "pkg.a"));
    }

    #[test]
    fn test_absolute_from_with_module_name() {
        let resolver = resolver(&[("pkg/a.py", ""), ("main.py", "from pkg import a\n")]);
        assert_eq!(resolve_first(&resolver, "main").unwrap(), internal(&resolver, "pkg.a"));
    }

    #[test]
    fn test_plain_import_of_internal_module() {
        let resolver = resolver(&[("util.py", ""), ("main.py", "import util\n")]);
        assert_eq!(resolve_first(&resolver, "main").unwrap(), internal(&resolver, "util"));
    }

    #[test]
    fn test_unresolved_names_are_external() {
        let resolver = resolver(&[
            ("a.py", "import os\n"),
            ("b.py", "from os import path\n"),
            ("c.py", "from os.path import *\n"),
        ]);
        assert_eq!(resolve_first(&resolver, "a").unwrap(), Target::External("os".into()));
        assert_eq!(resolve_first(&resolver, "b").unwrap(), Target::External("os.path".into()));
        assert_eq!(resolve_first(&resolver, "c").unwrap(), Target::External("os.path".into()));
    }

    #[test]
    fn test_single_marker_sibling_lookup() {
        let resolver = resolver(&[
            ("pkg/sub/a.py", ""),
            ("pkg/a.py", ""),
            ("pkg/sub/b.py", "from .a import x\n"),
        ]);
        assert_eq!(
            resolve_first(&resolver, "pkg.sub.b").unwrap(),
            internal(&resolver, "pkg.sub.a")
        );
    }

    #[test]
    fn test_single_marker_falls_back_to_enclosing_package() {
        let resolver = resolver(&[("pkg/a.py", ""), ("pkg/sub/b.py", "from .a import x\n")]);
        assert_eq!(
            resolve_first(&resolver, "pkg.sub.b").unwrap(),
            internal(&resolver, "pkg.a")
        );
    }

    #[test]
    fn test_double_marker_climbs_one_directory() {
        let resolver = resolver(&[
            ("pkg/a.py", ""),
            ("pkg/sub/a.py", ""),
            ("pkg/sub/deep/c.py", "from ..a import x\n"),
        ]);
        assert_eq!(
            resolve_first(&resolver, "pkg.sub.deep.c").unwrap(),
            internal(&resolver, "pkg.sub.a")
        );
    }

    #[test]
    fn test_triple_marker_climbs_per_level() {
        let resolver = resolver(&[
            ("pkg/a.py", ""),
            ("pkg/sub/a.py", ""),
            ("pkg/sub/deep/c.py", "from ...a import x\n"),
        ]);
        assert_eq!(
            resolve_first(&resolver, "pkg.sub.deep.c").unwrap(),
            internal(&resolver, "pkg.a")
        );
    }

    #[test]
    fn test_bare_dot_imports_sibling_module() {
        let resolver = resolver(&[
            ("pkg/__init__.py", ""),
            ("pkg/helper.py", ""),
            ("pkg/main.py", "from . import helper\n"),
        ]);
        assert_eq!(
            resolve_first(&resolver, "pkg.main").unwrap(),
            internal(&resolver, "pkg.helper")
        );
    }

    #[test]
    fn test_bare_dot_falls_back_to_package() {
        let resolver = resolver(&[
            ("pkg/__init__.py", "VERSION = 1\n"),
            ("pkg/main.py", "from . import VERSION\n"),
        ]);
        assert_eq!(
            resolve_first(&resolver, "pkg.main").unwrap(),
            internal(&resolver, "pkg")
        );
    }

    #[test]
    fn test_bare_dot_does_not_reach_root_package() {
        let resolver = resolver(&[
            ("__init__.py", ""),
            ("pkg/sub/m.py", "from . import nothing\n"),
        ]);
        assert!(matches!(
            resolve_first(&resolver, "pkg.sub.m"),
            Err(ModsphereError::Resolution { .. })
        ));
    }

    #[test]
    fn test_bare_dot_at_root_uses_root_package() {
        let resolver = resolver(&[
            ("__init__.py", "VERSION = 1\n"),
            ("main.py", "from . import VERSION\n"),
        ]);
        assert_eq!(resolve_first(&resolver, "main").unwrap(), internal(&resolver, ""));
    }

    #[test]
    fn test_relative_from_directory_without_marker() {
        let resolver = resolver(&[
            ("app/util.py", "from ..lib import tools\n"),
            ("lib/tools.py", ""),
        ]);
        assert_eq!(
            resolve_first(&resolver, "app.util").unwrap(),
            internal(&resolver, "lib.tools")
        );
    }

    #[test]
    fn test_package_marker_resolves_inside_its_directory() {
        let resolver = resolver(&[
            ("pkg/sub/__init__.py", "from .impl import run\n"),
            ("pkg/sub/impl.py", ""),
        ]);
        assert_eq!(
            resolve_first(&resolver, "pkg.sub").unwrap(),
            internal(&resolver, "pkg.sub.impl")
        );
    }

    #[test]
    fn test_missing_relative_target_is_fatal() {
        let resolver = resolver(&[("pkg/b.py", "from .missing import x\n")]);
        match resolve_first(&resolver, "pkg.b") {
            Err(ModsphereError::Resolution { importer, target }) => {
                assert_eq!(importer, "pkg.b");
                assert_eq!(target, "pkg.missing");
            }
            other => panic!("expected resolution failure, got {other:?}"),
        }
    }

    #[test]
    fn test_climbing_above_root_is_fatal() {
        let resolver = resolver(&[("pkg/b.py", "from ...a import x\n"), ("a.py", "")]);
        assert!(matches!(
            resolve_first(&resolver, "pkg.b"),
            Err(ModsphereError::Resolution { .. })
        ));
    }

    #[test]
    fn test_into_graph_aborts_without_partial_result() {
        let resolver = resolver(&[
            ("a.py", "import os\n"),
            ("pkg/b.py", "from .nope import x\n"),
        ]);
        assert!(resolver.into_graph().is_err());
    }
}
