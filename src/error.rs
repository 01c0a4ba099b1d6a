//! Error types for modsphere.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an analysis or a layout run.
///
/// Undecomposable import statements are not errors: the extractor drops them.
#[derive(Debug, Error)]
pub enum ModsphereError {
    /// A relative import points at a module that is not part of the project.
    #[error("cannot resolve relative import `{target}` from `{importer}`")]
    Resolution { importer: String, target: String },

    #[error("project directory not found: {}", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The graph file is not a well-formed literal.
    #[error("literal syntax error at offset {position}: {message}")]
    Literal { position: usize, message: String },

    /// The graph file parsed, but does not describe a closed module graph.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModsphereError>;
