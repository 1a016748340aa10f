//! Diagnostic model shared by both sides of the worker boundary.
//!
//! Pure data: the endpoint produces diagnostics, the host renders them.
//! Sequences preserve detection order and are stable for identical input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte span into the original source, half-open (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Where a diagnostic points in the source.
///
/// `WholeFile` is the explicit "no precise location" form used for
/// pre-parse and internal failures. An error genuinely at offset zero is
/// `Span(Span { start: 0, .. })`, so the two never get conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLocation {
    /// The problem applies to the file as a whole.
    WholeFile,
    /// The problem points at a specific byte range.
    Span(Span),
}

impl DiagnosticLocation {
    pub fn span(start: u32, end: u32) -> Self {
        Self::Span(Span::new(start, end))
    }

    pub fn is_precise(&self) -> bool {
        matches!(self, Self::Span(_))
    }
}

impl fmt::Display for DiagnosticLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WholeFile => write!(f, "whole file"),
            Self::Span(span) => write!(f, "{span}"),
        }
    }
}

/// Which stage of the compiler reported the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Syntax,
    Type,
    Internal,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Type => write!(f, "type"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Severity of a diagnostic. Ordered so `Error` is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One reported compile-time problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub location: DiagnosticLocation,
    /// Optional remediation hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        message: impl Into<String>,
        location: DiagnosticLocation,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            location,
            help: None,
        }
    }

    /// Error diagnostic at a location.
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, location: DiagnosticLocation) -> Self {
        Self::new(kind, Severity::Error, message, location)
    }

    /// Warning diagnostic at a location.
    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: DiagnosticLocation,
    ) -> Self {
        Self::new(kind, Severity::Warning, message, location)
    }

    /// Internal failure with no precise location.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(DiagnosticKind::Internal, message, DiagnosticLocation::WholeFile)
    }

    /// Attach a remediation hint.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {} ({})",
            self.severity, self.kind, self.message, self.location
        )?;
        if let Some(ref help) = self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

/// Whether any diagnostic in the sequence is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
