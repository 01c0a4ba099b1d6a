//! Source file discovery.
//!
//! Walks a project directory respecting `.gitignore` and returns the Python
//! files the analyzer should register.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ModsphereError, Result};
use crate::graph::types::SOURCE_EXTENSION;

/// A source file as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the project root.
    pub rel_path: PathBuf,
    /// Absolute path, used for reading and as the module locator.
    pub abs_path: PathBuf,
}

impl SourceFile {
    pub fn new(rel_path: impl Into<PathBuf>, abs_path: impl Into<PathBuf>) -> Self {
        Self {
            rel_path: rel_path.into(),
            abs_path: abs_path.into(),
        }
    }
}

/// Whether the extractor handles this file.
pub fn is_python_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Collect every Python file under `root`, sorted by relative path.
///
/// Hidden entries (including `.git`) and anything matched by ignore files
/// are skipped. `.gitignore` is honored even outside a git checkout.
pub fn collect_sources(root: &Path) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(ModsphereError::ProjectNotFound(root.to_path_buf()));
    }
    let root = root.canonicalize()?;

    let mut files: Vec<SourceFile> = WalkBuilder::new(&root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| is_python_source(entry.path()))
        .filter_map(|entry| {
            let abs_path = entry.into_path();
            let rel_path = abs_path.strip_prefix(&root).ok()?.to_path_buf();
            Some(SourceFile { rel_path, abs_path })
        })
        .collect();

    files.sort();
    debug!(root = %root.display(), count = files.len(), "collected sources");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_respects_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("pkg/a.py"), "import os\n").unwrap();
        fs::write(root.join("pkg/notes.txt"), "not python").unwrap();
        fs::write(root.join("build/gen.py"), "").unwrap();
        fs::write(root.join(".git/hook.py"), "").unwrap();
        fs::write(root.join("main.py"), "").unwrap();
        fs::write(root.join(".gitignore"), "# generated\nbuild\n").unwrap();

        let files = collect_sources(root).unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.rel_path.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("main.py"), PathBuf::from("pkg/a.py")]);
        assert!(files.iter().all(|f| f.abs_path.is_absolute()));
    }

    #[test]
    fn test_missing_root() {
        let result = collect_sources(Path::new("/no/such/project/dir"));
        assert!(matches!(result, Err(ModsphereError::ProjectNotFound(_))));
    }

    #[test]
    fn test_is_python_source() {
        assert!(is_python_source(Path::new("a/b.py")));
        assert!(!is_python_source(Path::new("a/b.pyc")));
        assert!(!is_python_source(Path::new("Makefile")));
    }
}
