//! Compile options and results crossing the worker boundary.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{has_errors, Diagnostic};

/// Default output dialect when the editor configuration is silent.
pub const DEFAULT_TARGET: &str = "es2020";
/// Default module format when the editor configuration is silent.
pub const DEFAULT_MODULE: &str = "es2020";
/// File identifier used when the host did not supply one.
pub const UNKNOWN_FILE: &str = "unknown.ts";

/// Immutable description of one compile request.
///
/// Constructed fresh per request from editor configuration plus file
/// identity; never shared or mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Target output dialect, e.g. `es2020`.
    pub target: String,
    /// Module format, e.g. `es2020` or `commonjs`.
    pub module: String,
    /// Strict type-checking.
    pub strict: bool,
    /// Whether a source map should be emitted.
    pub source_map: bool,
    /// Originating file identifier.
    pub file_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            module: DEFAULT_MODULE.to_string(),
            strict: true,
            source_map: false,
            file_name: UNKNOWN_FILE.to_string(),
        }
    }
}

impl CompileOptions {
    /// Merge partial editor configuration over the defaults.
    pub fn normalized(overrides: CompileOptionsOverrides) -> Self {
        let defaults = Self::default();
        Self {
            target: overrides.target.unwrap_or(defaults.target),
            module: overrides.module.unwrap_or(defaults.module),
            strict: overrides.strict.unwrap_or(defaults.strict),
            source_map: overrides.source_map.unwrap_or(defaults.source_map),
            file_name: overrides.file_name.unwrap_or(defaults.file_name),
        }
    }
}

/// Partial options as they arrive from the editor configuration surface.
///
/// Every field is optional; missing fields fall back to the defaults in
/// [`CompileOptions::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptionsOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Output of a successful compile.
///
/// `diagnostics` is always present (possibly empty) and warnings do not
/// fail a compile. `source_map` is present iff the request asked for one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResult {
    /// Generated JavaScript.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    /// Whether the compile produced no error-severity diagnostics.
    pub fn is_clean(&self) -> bool {
        !has_errors(&self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, DiagnosticLocation};

    #[test]
    fn test_defaults() {
        let opts = CompileOptions::default();
        assert_eq!(opts.target, "es2020");
        assert_eq!(opts.module, "es2020");
        assert!(opts.strict);
        assert!(!opts.source_map);
        assert_eq!(opts.file_name, "unknown.ts");
    }

    #[test]
    fn test_normalized_merges_over_defaults() {
        let overrides = CompileOptionsOverrides {
            target: Some("es2015".into()),
            source_map: Some(true),
            file_name: Some("src/app.ts".into()),
            ..Default::default()
        };
        let opts = CompileOptions::normalized(overrides);
        assert_eq!(opts.target, "es2015");
        assert_eq!(opts.module, "es2020"); // default kept
        assert!(opts.strict); // default kept
        assert!(opts.source_map);
        assert_eq!(opts.file_name, "src/app.ts");
    }

    #[test]
    fn test_normalized_empty_overrides_is_default() {
        assert_eq!(
            CompileOptions::normalized(CompileOptionsOverrides::default()),
            CompileOptions::default()
        );
    }

    #[test]
    fn test_result_is_clean_with_warnings() {
        let result = CompileResult {
            code: "var x = 1;".into(),
            source_map: None,
            diagnostics: vec![Diagnostic::warning(
                DiagnosticKind::Type,
                "unused variable `x`",
                DiagnosticLocation::span(4, 5),
            )],
        };
        // Warnings never fail a compile
        assert!(result.is_clean());
    }

    #[test]
    fn test_source_map_omitted_from_wire_when_absent() {
        let result = CompileResult {
            code: "var x = 1;".into(),
            source_map: None,
            diagnostics: vec![],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("source_map"));

        let with_map = CompileResult {
            source_map: Some("{}".into()),
            ..result
        };
        let json = serde_json::to_string(&with_map).unwrap();
        assert!(json.contains("source_map"));
    }

    #[test]
    fn test_result_diagnostics_default_on_decode() {
        // Older producers may omit the field entirely
        let result: CompileResult = serde_json::from_str(r#"{"code":"var x;"}"#).unwrap();
        assert!(result.diagnostics.is_empty());
        assert!(result.source_map.is_none());
    }
}
