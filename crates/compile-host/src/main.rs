//! Command-line compiler host.
//!
//! Drives the orchestration layer the way an editor integration would:
//! spawn the isolated endpoint, init once, then issue compile or
//! type-check requests. Compiled output goes to stdout; logs and
//! diagnostics go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use orchestration::{
    diagnostics, CompileOptionsOverrides, CompileOrchestrator, HostConfig, PassthroughFactory,
};

#[derive(Parser)]
#[command(name = "compile-host", about = "TypeScript compiler host", version)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file and print the emitted code.
    Compile {
        /// Source file (.ts or .tsx).
        file: PathBuf,
        /// ECMAScript target, e.g. es2020.
        #[arg(long)]
        target: Option<String>,
        /// Module system, e.g. es2020.
        #[arg(long)]
        module: Option<String>,
        /// Write a source map beside the output file.
        #[arg(long)]
        source_map: bool,
    },
    /// Type-check a source file and report diagnostics.
    Check {
        /// Source file (.ts or .tsx).
        file: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<HostConfig> {
    match path {
        Some(path) => HostConfig::from_file(path),
        None => Ok(HostConfig::from_env()),
    }
}

fn read_source(path: &Path) -> Result<String> {
    let recognized = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "ts" || e == "tsx");
    if !recognized {
        bail!("not a TypeScript source file: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    orchestration::telemetry::init_telemetry("compile_host=info,orchestration=info");

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    if !config.use_isolated_compiler {
        bail!("inline compilation is not supported; set use_isolated_compiler = true");
    }

    let orchestrator = CompileOrchestrator::spawn(Box::new(PassthroughFactory), &config);
    orchestrator.init().await?;
    info!(timeout_ms = config.request_timeout_ms, "compiler initialized");

    let exit = match args.command {
        Command::Compile {
            file,
            target,
            module,
            source_map,
        } => {
            let source = read_source(&file)?;
            let mut overrides = config.compile_overrides(file_name(&file));
            if target.is_some() {
                overrides.target = target;
            }
            if module.is_some() {
                overrides.module = module;
            }
            if source_map {
                overrides.source_map = Some(true);
            }

            let result = orchestrator.compile(source, overrides).await?;
            for diagnostic in &result.diagnostics {
                eprintln!("{diagnostic}");
            }

            let out_path = file.with_extension("js");
            std::fs::write(&out_path, &result.code)
                .with_context(|| format!("writing {}", out_path.display()))?;
            if let Some(ref map) = result.source_map {
                let map_path = file.with_extension("js.map");
                std::fs::write(&map_path, map)
                    .with_context(|| format!("writing {}", map_path.display()))?;
            }
            info!(output = %out_path.display(), "compiled");

            print!("{}", result.code);
            if result.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Check { file } => {
            let source = read_source(&file)?;
            let diags = orchestrator.type_check(source).await?;
            for diagnostic in &diags {
                eprintln!("{diagnostic}");
            }
            if diagnostics::has_errors(&diags) {
                ExitCode::FAILURE
            } else {
                info!(file = %file.display(), "no type errors");
                ExitCode::SUCCESS
            }
        }
    };

    orchestrator.dispose();
    Ok(exit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_source_rejects_non_typescript() {
        let err = read_source(Path::new("notes.md")).unwrap_err();
        assert!(err.to_string().contains("notes.md"));
        assert!(read_source(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_file_name_extraction() {
        assert_eq!(file_name(Path::new("src/app.ts")), "app.ts");
        assert_eq!(file_name(Path::new("component.tsx")), "component.tsx");
    }
}
