//! Source discovery and import extraction.

pub mod imports;
pub mod scan;

pub use imports::extract_imports;
pub use scan::{collect_sources, is_python_source, SourceFile};

use crate::graph::types::FileExtraction;

/// Pair a source file with the imports found in its text.
pub fn extract_file(source: SourceFile, text: &str) -> FileExtraction {
    FileExtraction {
        imports: extract_imports(text),
        source,
    }
}
