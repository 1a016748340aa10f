//! Seam to the native compiler core.
//!
//! The real core (parser, type checker, codegen) is an external
//! collaborator. The endpoint only ever talks to it through these traits,
//! so the whole orchestration layer can be exercised with test doubles
//! and the core swapped in later without touching the protocol.

use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::options::{CompileOptions, CompileResult};

/// Failure reported by the core seam, both at construction and per call.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct CompilerFailure {
    pub reason: String,
}

impl CompilerFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The invocation surface of the native compiler core.
pub trait CompilerCore: Send {
    /// Compile one source file under the given options.
    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompileResult, CompilerFailure>;

    /// Type-check one source file, returning only diagnostics.
    fn type_check(&self, source: &str) -> Result<Vec<Diagnostic>, CompilerFailure>;
}

/// Constructs the core instance during endpoint initialization.
///
/// Called exactly once per successful init; idempotent re-init must not
/// invoke it again.
pub trait CompilerFactory: Send {
    fn create(&self) -> Result<Box<dyn CompilerCore>, CompilerFailure>;
}

/// Stand-in core used by the host binary until the native core is linked.
///
/// Emits the source prefixed with a banner, an empty (literal `{}`) source
/// map when one is requested, and no diagnostics.
pub struct PassthroughCompiler;

impl CompilerCore for PassthroughCompiler {
    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompileResult, CompilerFailure> {
        Ok(CompileResult {
            code: format!("// Compiled from TypeScript\n{source}"),
            source_map: options.source_map.then(|| "{}".to_string()),
            diagnostics: Vec::new(),
        })
    }

    fn type_check(&self, _source: &str) -> Result<Vec<Diagnostic>, CompilerFailure> {
        Ok(Vec::new())
    }
}

/// Factory producing [`PassthroughCompiler`] instances.
pub struct PassthroughFactory;

impl CompilerFactory for PassthroughFactory {
    fn create(&self) -> Result<Box<dyn CompilerCore>, CompilerFailure> {
        Ok(Box::new(PassthroughCompiler))
    }
}
