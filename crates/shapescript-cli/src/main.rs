// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `shapescript-cli`: the external entry point for the ShapeScript
//! language core.
//!
//! ```text
//! shapescript <input.shape> [<output.ext>] [--z-up] [--seed N] [-v|--verbose]
//! ```
//!
//! Reads a source file, runs it through `parse` → `analyze` → `evaluate`
//! → [`shapescript_core::Scene::build`], and reports the result. Any
//! lex/parse/analysis/runtime error is rendered with
//! `shapescript_core::diagnostics::format_diagnostic` and exits non-zero.
//! Mesh/CSG math and model export codecs are external collaborators this
//! binary doesn't implement; it links a null [`GeometryEngine`] only so
//! the full pipeline can be exercised without one.

#![deny(rust_2018_idioms)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
#![allow(clippy::print_stdout, clippy::print_stderr, clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use shapescript_core::diagnostics::format_diagnostic;
use shapescript_core::{analyzer, cache::GeometryCache, evaluate, evaluate_seeded, lexer, parser, NeverCancel, Stdlib};
use shapescript_geom::Bounds;
use shapescript_scene_port::{
    EngineError, EvaluationDelegate, GeometryEngine, GeometryPlan, ImportError, ImportedContent, MeshSummary, Url,
};

/// Parse, evaluate, and materialize a ShapeScript program.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ShapeScript source file to evaluate.
    input: PathBuf,

    /// Model file to export the built scene to. Export codecs are not
    /// implemented in this build; passing this flag always fails.
    output: Option<PathBuf>,

    /// Treat +Z as "up" when interpreting the source's coordinate space.
    #[arg(long)]
    z_up: bool,

    /// Seed the evaluator's random sequence, overriding any `seed`
    /// command in the source.
    #[arg(long)]
    seed: Option<f64>,

    /// Enable verbose (`debug`-level) tracing output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_target(false).without_time().with_env_filter(filter).init();
}

fn run(args: &Args) -> Result<()> {
    let source = fs::read_to_string(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let (tokens, lex_error) = lexer::lex(&source);
    if let Some(error) = lex_error {
        anyhow::bail!(format_diagnostic(&error, &source));
    }

    let stdlib = Stdlib::new();
    let (program, parse_error) = parser::parse(tokens, &stdlib);
    if let Some(error) = parse_error {
        anyhow::bail!(format_diagnostic(&error, &source));
    }

    let analysis_errors = analyzer::analyze(&program, &stdlib);
    if let Some(error) = analysis_errors.first() {
        anyhow::bail!(format_diagnostic(error, &source));
    }

    let delegate = FsDelegate { root: args.input.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf) };
    let evaluated = match args.seed {
        Some(seed) => evaluate_seeded(&program, &delegate, &NeverCancel, seed),
        None => evaluate(&program, &delegate, &NeverCancel),
    };
    let scene = match evaluated {
        Ok(scene) => scene,
        Err(error) => anyhow::bail!(format_diagnostic(&error, &source)),
    };

    let cache = GeometryCache::new();
    let engine = NullEngine;
    let is_cancelled = || false;
    scene.build(&cache, &engine, &is_cancelled).map_err(|kind| anyhow::anyhow!(kind.to_string()))?;

    tracing::info!(nodes = scene.roots.len(), "evaluation complete");
    println!("ok: {} top-level node(s)", scene.roots.len());

    if let Some(output) = &args.output {
        let convention = if args.z_up { "+Z up" } else { "+Y up" };
        anyhow::bail!("export codec not implemented in this build (requested {}, {convention})", output.display());
    }

    Ok(())
}

/// A filesystem-backed [`EvaluationDelegate`]: `import "path"` resolves
/// relative to the source file's directory, `print`/`debug` write to
/// stdout/stderr.
struct FsDelegate {
    root: PathBuf,
}

impl EvaluationDelegate for FsDelegate {
    fn resolve_url(&self, path: &str) -> Url {
        Url(self.root.join(path).to_string_lossy().into_owned())
    }

    fn import_content(&self, url: &Url) -> Result<ImportedContent, ImportError> {
        fs::read_to_string(&url.0).map(ImportedContent::Source).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::NotFound(url.0.clone()),
            std::io::ErrorKind::PermissionDenied => ImportError::AccessRestricted(url.0.clone()),
            _ => ImportError::Other(url.0.clone(), e.to_string()),
        })
    }

    fn debug_log(&self, formatted_values: &[String]) {
        eprintln!("{}", formatted_values.join(" "));
    }

    fn print(&self, formatted_values: &[String]) {
        println!("{}", formatted_values.join(" "));
    }
}

/// A placeholder [`GeometryEngine`]: the mesh/CSG math library is an
/// external collaborator this binary doesn't link, so this just reports
/// an empty, watertight mesh for every plan — enough to exercise the
/// cache and the `Scene::build` traversal without a real backend.
struct NullEngine;

impl GeometryEngine for NullEngine {
    fn build(&self, plan: &GeometryPlan) -> Result<MeshSummary, EngineError> {
        Ok(MeshSummary { bounds: Bounds::EMPTY, polygon_count: plan.params.len().max(1) as u64, watertight: true })
    }
}
