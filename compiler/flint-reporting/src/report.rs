//! Flint diagnostic report data structures.

use std::fmt;
use std::io::IsTerminal;

use crate::highlight::{highlight, Colour};

/// Enumeration describing the kind of [Report]; either being a warning,
/// info or an error.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum ReportKind {
    /// The report is an error.
    Error,
    /// The report is an informational diagnostic (likely for internal
    /// purposes).
    Info,
    /// The report is a warning.
    Warning,
}

impl ReportKind {
    /// Get the [Colour] of the label associated with the [ReportKind].
    fn as_colour(&self) -> Colour {
        match self {
            ReportKind::Error => Colour::Red,
            ReportKind::Info => Colour::Blue,
            ReportKind::Warning => Colour::Yellow,
        }
    }

    /// Get the string label associated with the [ReportKind].
    fn message(&self) -> &'static str {
        match self {
            ReportKind::Error => "error",
            ReportKind::Info => "info",
            ReportKind::Warning => "warn",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if std::io::stderr().is_terminal() {
            write!(f, "{}", highlight(self.as_colour(), self.message()))
        } else {
            write!(f, "{}", self.message())
        }
    }
}

/// A single diagnostic: a kind, a primary message, and any number of
/// additional notes rendered below it.
#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub message: String,
    pub notes: Vec<String>,
}

impl Report {
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: ReportKind::Error, message: message.into(), notes: Vec::new() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: ReportKind::Warning, message: message.into(), notes: Vec::new() }
    }

    /// Attach an additional note to the report.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

/// Collects reports for a compilation session. Errors are sticky: once one
/// has been emitted, [`Reporter::has_errors`] stays true and code
/// generation for the module is suppressed.
#[derive(Debug, Default)]
pub struct Reporter {
    error_count: usize,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `report` to standard error, recording whether it was an
    /// error.
    pub fn emit(&mut self, report: Report) {
        if report.kind == ReportKind::Error {
            self.error_count += 1;
        }
        eprintln!("{report}");
    }

    /// Whether any error report has been emitted so far.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }
}
