//! A small `Result`-facing error type for the few genuinely exceptional
//! conditions the core surfaces to a caller, kept separate from
//! [`crate::diagnostics`], which carries the in-band, non-fatal findings
//! (directive defects, cycles, planner lookup failures, destructive
//! operations). Mirrors the `error::Error` / `format_custom_error` shape
//! this codebase has used elsewhere; the variant set here is deliberately
//! small because `build -> diff -> plan` almost never fails outright —
//! most malformed input degrades into a diagnostic instead.

use std::fmt;

#[derive(Debug)]
pub enum SchemaForgeError {
    /// A `CompareOptions` extension name failed validation (e.g. contained
    /// whitespace) — the only input-construction failure the core rejects
    /// outright rather than degrading.
    InvalidExtensionName(String),
}

impl fmt::Display for SchemaForgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaForgeError::InvalidExtensionName(name) => {
                write!(f, "invalid extension name: {:?}", name)
            }
        }
    }
}

impl std::error::Error for SchemaForgeError {}

pub fn format_custom_error(title: &str, body: &str) -> String {
    format!("{}\n{}\n\n{}", title, "-".repeat(title.len()), body)
}
