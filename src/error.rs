//! Error types for the logic simulator.
//!
//! This module provides a unified error type [`LogsimError`] for failures that
//! stop an operation (unreadable files, oscillating networks, bad runtime
//! lookups), and the [`Diagnostic`] records the parser accumulates while it
//! recovers from malformed circuit descriptions.

use std::fmt;

use thiserror::Error;

use crate::simulator::MonitorError;

/// Result type alias using [`LogsimError`].
pub type Result<T> = std::result::Result<T, LogsimError>;

/// Unified error type for all simulator operations.
#[derive(Error, Debug)]
pub enum LogsimError {
    // ============ Loading Errors ============
    /// The circuit file could not be opened or read
    #[error("Failed to read circuit file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A string was rejected by the name table
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Parsing finished with one or more reported errors
    #[error("Circuit description contains {} error(s)", .0.len())]
    InvalidCircuit(Diagnostics),

    // ============ Simulation Errors ============
    /// The network did not reach a fixed point within the iteration bound
    #[error("Network is oscillating: no stable state after {iterations} iterations")]
    Oscillation { iterations: usize },

    /// No device carries the requested name
    #[error("Device '{device}' does not exist")]
    DeviceAbsent { device: String },

    /// Switch operation applied to a device of another kind
    #[error("Device '{device}' is not a SWITCH")]
    NotASwitch { device: String },

    /// A signal name did not resolve to a device output
    #[error("Unknown signal '{signal}'")]
    UnknownSignal { signal: String },

    /// A monitor could not be added at runtime
    #[error("Cannot monitor '{signal}': {source}")]
    MonitorRefused {
        signal: String,
        #[source]
        source: MonitorError,
    },
}

impl LogsimError {
    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Create a device absent error
    pub fn device_absent(device: impl Into<String>) -> Self {
        Self::DeviceAbsent {
            device: device.into(),
        }
    }
}

/// Category of a parse-time diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed token sequence
    Syntax,
    /// Well-formed but meaningless statement
    Semantic,
    /// Malformed numeric range
    Value,
    /// Anything that fits none of the above
    Unclassed,
}

impl DiagnosticKind {
    /// Label used in rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::Semantic => "SemanticError",
            Self::Value => "ValueError",
            Self::Unclassed => "UnclassedError",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reported problem, with enough context to point at the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Text of the offending source line
    pub line_text: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        message: impl Into<String>,
        line: usize,
        column: usize,
        line_text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
            line_text: line_text.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error on line {}:", self.line)?;
        writeln!(f, "    {}", self.line_text)?;
        writeln!(f, "    {}^", " ".repeat(self.column.saturating_sub(1)))?;
        writeln!(f, "{}: {}", self.kind, self.message)?;
        writeln!(f, "{}", "-".repeat(30))
    }
}

/// Ordered log of diagnostics produced by one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.0.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No errors found.");
        }
        for diagnostic in &self.0 {
            write!(f, "{}", diagnostic)?;
        }
        writeln!(f, "{} error(s) found.", self.0.len())
    }
}
