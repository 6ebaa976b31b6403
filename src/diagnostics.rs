//! In-band diagnostics.
//!
//! The core never fails on malformed input: directive defects, reference
//! defects, cycles, and destructive operations are all reported by
//! appending to a `DiagnosticLog` rather than by returning `Err`. This
//! mirrors the shape of the `error::Error` / `ErrorType` pair used
//! elsewhere in this codebase, scoped down to the non-fatal taxonomy this
//! core actually needs, and rendered through a hand-rolled ANSI-color
//! helper rather than a terminal crate, since the core has no I/O of its
//! own to gate a TTY check on.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Render with ANSI color codes when `color` is true, plain otherwise.
    pub fn render(&self, color: bool) -> String {
        let label = match self.severity {
            Severity::Info => paint(color, "36", "info"),
            Severity::Warning => paint(color, "33", "warning"),
            Severity::Error => paint(color, "31", "error"),
        };
        format!("{}: {}", label, self.message)
    }
}

fn paint(enabled: bool, ansi_code: &str, text: &str) -> String {
    if enabled {
        format!("\x1b[{}m{}\x1b[0m", ansi_code, text)
    } else {
        text.to_string()
    }
}

/// Accumulates diagnostics across a single `build -> diff -> plan`
/// invocation. Each stage appends its own findings; nothing is ever
/// dropped or aborts the pipeline.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::info(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::error(message));
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    pub fn extend(&mut self, other: DiagnosticLog) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Display for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry.render(false))?;
        }
        Ok(())
    }
}
