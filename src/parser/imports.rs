//! Pattern-based extraction of Python import statements.
//!
//! This is deliberately not a parser: statements are recognized by a single
//! line-anchored pattern and anything that does not decompose cleanly is
//! dropped. Indented imports (inside functions, `try` blocks) are not seen.

use regex::Regex;
use std::sync::LazyLock;

use crate::graph::types::ImportStatement;

const MODULE: &str = r"([._a-zA-Z][\w.]*)";
const NAME: &str = r"([_a-zA-Z][\w.]*)";
/// One or more spaces or backslash line continuations.
const HARD: &str = r"(?: |\\\n)+";
const SOFT: &str = r"(?: |\\\n)*";
/// Inside parentheses newlines are free.
const HARD_NL: &str = r"[ \n]+";
const SOFT_NL: &str = r"[ \n]*";

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    let plain = format!(
        r"{NAME}(?:{HARD}as{HARD}{NAME})?(?:{SOFT},{SOFT}{NAME}(?:{HARD}as{HARD}{NAME})?)*"
    );
    let parenthesized = format!(
        r"\({SOFT_NL}{NAME}(?:{HARD}as{HARD}{NAME})?(?:{SOFT_NL},{SOFT_NL}{NAME}(?:{HARD_NL}as{HARD}{NAME})?)*(?:{SOFT_NL},)?{SOFT_NL}\)"
    );
    let pattern =
        format!(r"(?m)^(?:from{HARD}{MODULE}{HARD})?import{HARD}(?:{plain}|{parenthesized}|\*)");
    Regex::new(&pattern).unwrap()
});

static FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^from{HARD}{MODULE}{HARD}import")).unwrap());

static ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([_a-zA-Z][\w.]*|\*)(?:\s+as\s+([_a-zA-Z][\w.]*))?$").unwrap());

/// Extract every import descriptor from one file's text, in source order.
///
/// Never fails: statements that match only partially are skipped.
pub fn extract_imports(source: &str) -> Vec<ImportStatement> {
    let source = source.replace("\r\n", "\n");
    let mut imports = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    for statement in IMPORT.find_iter(&source) {
        line += source[scanned..statement.start()].matches('\n').count();
        scanned = statement.start();
        decompose(statement.as_str(), line, &mut imports);
    }

    imports
}

/// Split one matched statement into descriptors.
fn decompose(statement: &str, line: usize, out: &mut Vec<ImportStatement>) {
    let (from, names) = match FROM.captures(statement) {
        Some(caps) => {
            let (Some(whole), Some(module)) = (caps.get(0), caps.get(1)) else {
                return;
            };
            (Some(module.as_str().to_string()), &statement[whole.end()..])
        }
        None => match statement.strip_prefix("import") {
            Some(rest) => (None, rest),
            None => return,
        },
    };

    let names = names
        .replace("\\\n", " ")
        .replace(['(', ')', '\n'], " ");

    for element in names.split(',') {
        let element = element.split_whitespace().collect::<Vec<_>>().join(" ");
        if element.is_empty() {
            continue;
        }
        let Some(caps) = ELEMENT.captures(&element) else {
            continue;
        };
        let Some(name) = caps.get(1) else {
            continue;
        };
        out.push(ImportStatement {
            from: from.clone(),
            name: name.as_str().to_string(),
            alias: caps.get(2).map(|a| a.as_str().to_string()),
            line,
        });
    }
}
