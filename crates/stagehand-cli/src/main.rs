//! stagehand - run sandboxed stage scripts against a content pack.
//!
//! # Usage
//!
//! ```bash
//! # Run one script against a pack
//! stagehand run show.lua --pack packs/seaside/pack.toml --grant image --grant audio
//!
//! # Several files fill successive attempts of the same turn
//! stagehand run broken.lua fixed.lua --pack pack.toml
//!
//! # The file is a raw model response; the script is extracted from it
//! stagehand run reply.md --response
//!
//! # Inspect what a pack asks for against what is granted
//! stagehand check packs/seaside/pack.toml --grant image
//!
//! # Print the merged configuration
//! stagehand config
//! ```
//!
//! # Configuration Priority
//!
//! 1. CLI arguments (highest)
//! 2. Environment variables (`STAGEHAND_*`)
//! 3. Project config (`<project>/.stagehand/config.toml`)
//! 4. Global config (`~/.stagehand/config.toml`)
//! 5. Default values (lowest)
//!
//! `--grant` adds to the grants from configuration; it never removes any.
//!
//! # Environment Variables
//!
//! - `STAGEHAND_MAX_ATTEMPTS`: attempts per turn
//! - `STAGEHAND_INSTRUCTION_LIMIT`: VM instructions per script
//! - `STAGEHAND_GRANTS`: comma separated capability names
//! - `STAGEHAND_PACK`: pack manifest path
//! - `STAGEHAND_MOOD`: starting mood
//! - `RUST_LOG`: log filter when neither `-d` nor `-v` is given

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stagehand_auth::{Capability, PermissionResolver};
use stagehand_lua::{LuaEngine, QueuedScripts, SandboxLimits, TurnError, TurnLoop, TurnReport};
use stagehand_runtime::catalog::{Pack, PackManifest};
use stagehand_runtime::config::{ConfigLoader, StagehandConfig};
use stagehand_runtime::executor::{ExecutorSet, LoggingExecutor};
use stagehand_runtime::operation::OperationTable;
use stagehand_runtime::{Dispatcher, SessionContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "stagehand", version, about = "Permission-gated stage scripting", long_about = None)]
struct Args {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable info logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root directory (defaults to the current directory).
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Global config file (defaults to `~/.stagehand/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one turn, one file per attempt.
    Run {
        /// Script files, consumed in order as attempts are made.
        #[arg(required = true)]
        scripts: Vec<PathBuf>,

        /// Pack manifest (overrides `pack.manifest`).
        #[arg(short, long)]
        pack: Option<PathBuf>,

        /// Starting mood (overrides `pack.mood`).
        #[arg(short, long)]
        mood: Option<String>,

        /// Additional capability to grant; repeatable.
        #[arg(short, long = "grant", value_name = "CAPABILITY")]
        grants: Vec<String>,

        /// Treat each file as a model response and extract the script.
        #[arg(long)]
        response: bool,

        /// Seed for asset selection.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate a pack and show how its permissions resolve.
    Check {
        /// Pack manifest.
        manifest: PathBuf,

        /// Additional capability to grant; repeatable.
        #[arg(short, long = "grant", value_name = "CAPABILITY")]
        grants: Vec<String>,
    },

    /// Print the merged configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);
    OperationTable::standard().verify()?;

    let project_root = match &args.project {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let mut loader = ConfigLoader::new().with_project_root(project_root.clone());
    if let Some(path) = &args.config {
        loader = loader.with_global_config(path.clone());
    }
    let config = loader.load().context("config error")?;
    info!(path = %project_root.display(), "project root");

    match args.command {
        Command::Run {
            scripts,
            pack,
            mood,
            grants,
            response,
            seed,
        } => {
            let run = RunOptions {
                scripts,
                pack,
                mood,
                grants,
                response,
                seed,
            };
            run_turn(&config, run).await
        }
        Command::Check { manifest, grants } => check_pack(&config, &manifest, &grants),
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Terminal filter: `--debug` > `--verbose` > `RUST_LOG` > `warn`.
///
/// Logs go to stderr; stdout carries the report.
fn init_tracing(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

struct RunOptions {
    scripts: Vec<PathBuf>,
    pack: Option<PathBuf>,
    mood: Option<String>,
    grants: Vec<String>,
    response: bool,
    seed: Option<u64>,
}

async fn run_turn(config: &StagehandConfig, run: RunOptions) -> Result<()> {
    let manifest = run
        .pack
        .as_deref()
        .or(config.pack.manifest.as_deref())
        .context("no pack manifest: pass --pack or set pack.manifest")?;
    let pack = PackManifest::load(manifest)?;
    let grants = resolve_grants(config, &run.grants)?;

    let mut session = SessionContext::new(pack, grants);
    if let Some(mood) = run.mood.as_deref().or(config.pack.mood.as_deref()) {
        session = session.with_mood(mood)?;
    }

    let mut dispatcher = Dispatcher::new(session, ExecutorSet::uniform(Arc::new(LoggingExecutor)));
    if let Some(seed) = run.seed {
        dispatcher = dispatcher.with_seed(seed);
    }
    let dispatcher = Arc::new(dispatcher);

    let engine = LuaEngine::with_limits(SandboxLimits {
        instruction_limit: config.runtime.instruction_limit,
        max_output_bytes: config.runtime.max_output_bytes,
    });
    let mut turns = TurnLoop::new(engine, Arc::clone(&dispatcher))
        .with_max_attempts(config.runtime.max_attempts)
        .with_feedback_history(config.runtime.feedback_history);

    let texts = read_scripts(&run.scripts)?;
    let mut source = if run.response {
        QueuedScripts::responses(texts)
    } else {
        QueuedScripts::new(texts)
    };

    let outcome = turns.run_turn(&mut source).await;
    let active: Vec<String> = dispatcher
        .active_handles()
        .into_iter()
        .filter_map(|id| dispatcher.registry().get(id))
        .map(|h| format!("{}{}", h.category, h.id))
        .collect();
    match &outcome {
        Ok(report) => print_report(report, &active),
        Err(err) => print_abort(err),
    }

    dispatcher.teardown();

    match outcome {
        Ok(_) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn read_scripts(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("cannot read script {}", path.display()))
        })
        .collect()
}

/// Config grants plus `--grant`. Unknown names on the command line are errors.
fn resolve_grants(config: &StagehandConfig, extra: &[String]) -> Result<Capability> {
    let (cli, unknown) = Capability::parse_list(extra);
    if !unknown.is_empty() {
        bail!("unknown capability: {}", unknown.join(", "));
    }
    Ok(config.granted_capabilities() | cli)
}

fn print_report(report: &TurnReport, active: &[String]) {
    println!("attempts: {}", report.attempts);
    println!("calls dispatched: {}", report.calls);
    if !report.output.is_empty() {
        println!("output:");
        for line in &report.output {
            println!("  {line}");
        }
    }
    if report.truncated {
        println!("  (output truncated)");
    }
    if active.is_empty() {
        println!("active handles: none");
    } else {
        println!("active handles: {}", active.join(", "));
    }
}

fn print_abort(err: &TurnError) {
    eprintln!("{err}");
    for failure in err.failures() {
        match failure.code {
            Some(code) => eprintln!("  {failure} [{code}]"),
            None => eprintln!("  {failure}"),
        }
    }
}

fn check_pack(config: &StagehandConfig, manifest: &Path, extra: &[String]) -> Result<()> {
    let pack: Pack = PackManifest::load(manifest)?;
    let granted = resolve_grants(config, extra)?;
    let required = pack.required();
    let effective = PermissionResolver::resolve(required, granted);
    let missing = PermissionResolver::find_missing(required, granted);

    match pack.version() {
        Some(version) => println!("pack: {} {version}", pack.name()),
        None => println!("pack: {}", pack.name()),
    }
    println!("required: {required}");
    println!("granted: {granted}");
    println!("effective: {}", effective.capabilities());
    println!("missing: {missing}");

    let default = pack.moods().default_mood().name();
    let moods: Vec<String> = pack
        .moods()
        .iter()
        .map(|m| {
            if m.name() == default {
                format!("{} (default)", m.name())
            } else {
                m.name().to_string()
            }
        })
        .collect();
    println!("moods: {}", moods.join(", "));

    if !missing.is_empty() {
        tracing::warn!(missing = %missing, "pack requests capabilities that are not granted");
    }
    Ok(())
}
