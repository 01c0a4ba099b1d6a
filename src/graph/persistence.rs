//! Reading and writing graph files.
//!
//! The native format is one literal mapping module id to
//! `{'top_dir', 'mod_name', 'mod_path', 'abs_path', 'imports'}` where
//! `imports` is a set of ids. A JSON rendering is available for tooling.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::info;

use super::types::{ExportedGraph, ExportedModule, ModuleId};
use crate::error::{ModsphereError, Result};
use crate::literal::{self, Literal};

const FIELDS: [&str; 4] = ["top_dir", "mod_name", "mod_path", "abs_path"];

impl ExportedGraph {
    pub fn to_literal(&self) -> Literal {
        let entries = self
            .modules
            .iter()
            .map(|(id, module)| {
                let imports = module
                    .imports
                    .iter()
                    .map(|to| Literal::Str(to.to_string()))
                    .collect();
                let record = Literal::Dict(vec![
                    (str_lit("top_dir"), str_lit(&module.top_dir)),
                    (str_lit("mod_name"), str_lit(&module.mod_name)),
                    (str_lit("mod_path"), str_lit(&module.mod_path)),
                    (str_lit("abs_path"), str_lit(&module.abs_path)),
                    (str_lit("imports"), Literal::Set(imports)),
                ]);
                (Literal::Str(id.to_string()), record)
            })
            .collect();
        Literal::Dict(entries)
    }

    /// Decode and validate a graph literal.
    ///
    /// Every record must carry the four string fields and an `imports`
    /// collection of strings, and every import must name a module present
    /// in the same literal.
    pub fn from_literal(value: &Literal) -> Result<Self> {
        let entries = value
            .as_dict()
            .ok_or_else(|| malformed(format!("expected a dict at top level, found {}", value.kind())))?;

        let mut modules = BTreeMap::new();
        for (key, record) in entries {
            let id = key
                .as_str()
                .map(ModuleId::from)
                .ok_or_else(|| malformed(format!("module id must be a string, found {}", key.kind())))?;
            let module = decode_record(&id, record)?;
            if modules.insert(id.clone(), module).is_some() {
                return Err(malformed(format!("duplicate module id `{id}`")));
            }
        }

        for (id, module) in &modules {
            if let Some(dangling) = module.imports.iter().find(|to| !modules.contains_key(*to)) {
                return Err(malformed(format!("`{id}` imports unknown module `{dangling}`")));
            }
        }

        Ok(Self { modules })
    }

    pub fn to_literal_string(&self) -> String {
        self.to_literal().to_string()
    }

    pub fn from_literal_str(text: &str) -> Result<Self> {
        Self::from_literal(&literal::parse(text)?)
    }

    /// Write the graph literal to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_literal_string())?;
        info!(path = %path.display(), modules = self.len(), "graph saved");
        Ok(())
    }

    /// Read a graph literal from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let graph = Self::from_literal_str(&text)?;
        info!(path = %path.display(), modules = graph.len(), "graph loaded");
        Ok(graph)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn decode_record(id: &ModuleId, record: &Literal) -> Result<ExportedModule> {
    if record.as_dict().is_none() {
        return Err(malformed(format!("record `{id}` must be a dict, found {}", record.kind())));
    }
    let field = |name: &str| -> Result<String> {
        record
            .get(name)
            .and_then(Literal::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed(format!("record `{id}` is missing string field `{name}`")))
    };
    let [top_dir, mod_name, mod_path, abs_path] = [
        field(FIELDS[0])?,
        field(FIELDS[1])?,
        field(FIELDS[2])?,
        field(FIELDS[3])?,
    ];

    let items = record
        .get("imports")
        .and_then(Literal::as_items)
        .ok_or_else(|| malformed(format!("record `{id}` has no `imports` collection")))?;
    let imports = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(ModuleId::from)
                .ok_or_else(|| malformed(format!("record `{id}` has a non-string import")))
        })
        .collect::<Result<BTreeSet<_>>>()?;

    Ok(ExportedModule {
        top_dir,
        mod_name,
        mod_path,
        abs_path,
        imports,
    })
}

fn str_lit(s: &str) -> Literal {
    Literal::Str(s.to_string())
}

fn malformed(message: String) -> ModsphereError {
    ModsphereError::MalformedGraph(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "{'m1': {'top_dir': 'pkg', 'mod_name': 'a', 'mod_path': 'pkg.a', \
        'abs_path': '/p/pkg/a.py', 'imports': {'m2'}}, \
        'm2': {'top_dir': '__external__', 'mod_name': 'os', 'mod_path': 'os', \
        'abs_path': 'external://os', 'imports': set()}}";

    #[test]
    fn test_decode_sample() {
        let graph = ExportedGraph::from_literal_str(SAMPLE).unwrap();
        assert_eq!(graph.len(), 2);
        let a = graph.get(&ModuleId::from("m1")).unwrap();
        assert_eq!(a.mod_path, "pkg.a");
        assert!(a.imports.contains(&ModuleId::from("m2")));
        assert!(graph.get(&ModuleId::from("m2")).unwrap().is_external());
    }

    #[test]
    fn test_encoded_text_is_stable() {
        let graph = ExportedGraph::from_literal_str(SAMPLE).unwrap();
        let text = graph.to_literal_string();
        assert!(text.contains("'imports': {'m2'}"));
        assert!(text.contains("'imports': set()"));
        assert_eq!(ExportedGraph::from_literal_str(&text).unwrap(), graph);
    }

    #[test]
    fn test_imports_may_be_a_list() {
        let text = "{'m1': {'top_dir': 't', 'mod_name': 'n', 'mod_path': 't.n', \
            'abs_path': '/t/n.py', 'imports': []}}";
        assert!(ExportedGraph::from_literal_str(text).is_ok());
    }

    #[test]
    fn test_dangling_import_is_rejected() {
        let text = "{'m1': {'top_dir': 't', 'mod_name': 'n', 'mod_path': 't.n', \
            'abs_path': '/t/n.py', 'imports': {'ghost'}}}";
        assert!(matches!(
            ExportedGraph::from_literal_str(text),
            Err(ModsphereError::MalformedGraph(_))
        ));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let text = "{'m1': {'top_dir': 't', 'imports': set()}}";
        assert!(matches!(
            ExportedGraph::from_literal_str(text),
            Err(ModsphereError::MalformedGraph(_))
        ));
        assert!(matches!(
            ExportedGraph::from_literal_str("['not', 'a', 'dict']"),
            Err(ModsphereError::MalformedGraph(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.txt");
        let graph = ExportedGraph::from_literal_str(SAMPLE).unwrap();
        graph.save(&path).unwrap();
        assert_eq!(ExportedGraph::load(&path).unwrap(), graph);

        let json_path = dir.path().join("graph.json");
        graph.save_json(&json_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["m1"]["imports"][0], "m2");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ExportedGraph::load(Path::new("/no/such/graph.txt")),
            Err(ModsphereError::Io(_))
        ));
    }
}
