//! faest-bind — command-line front end for FAEST native-library resolution.

mod commands;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use faest_acquire::{AcquireContext, EnvSnapshot, SystemRunner};
use faest_pipeline::BindConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_CRATES: [&str; 4] = ["faest_bind", "faest_acquire", "faest_ffi", "faest_pipeline"];

#[derive(Parser)]
#[command(name = "faest-bind", version, about = "Resolve the FAEST native library for binding generation")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Configuration file (default: faest-bind.toml, searched upward from the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate or build the library and print the build descriptor
    Resolve {
        /// Output format: text, cargo, json, or cdef
        #[arg(long, default_value = "text")]
        format: String,
        /// Do not check installed headers against the declaration table
        #[arg(long)]
        skip_contract_check: bool,
    },
    /// Show the detected platform key and bundle layout
    Platform {
        /// Cross-compilation descriptor (e.g., macosx-11.0-arm64, win-amd64)
        #[arg(long)]
        target: Option<String>,
    },
    /// Print the fixed FAEST declaration table
    Declarations {
        /// Output format: cdef or json
        #[arg(long, default_value = "cdef")]
        format: String,
        /// Only this parameter set (e.g., 128f, em_256s); repeatable
        #[arg(long = "set", value_name = "NAME")]
        sets: Vec<String>,
    },
    /// Report platform, tier availability, and build tool status
    Doctor,
    /// Remove the upstream clone used by the fallback build
    Clean {
        /// Remove only the build directory inside the clone
        #[arg(long)]
        build_only: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default = LOG_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Resolve {
            format,
            skip_contract_check,
        } => {
            let (ctx, _) = load_context(&cwd, cli.config.as_deref())?;
            commands::resolve::run(&ctx, &SystemRunner, &format, skip_contract_check)
        }

        Commands::Platform { target } => {
            let (ctx, _) = load_context(&cwd, cli.config.as_deref())?;
            commands::platform::run(&ctx, target.as_deref())
        }

        Commands::Declarations { format, sets } => commands::declarations::run(&format, &sets),

        Commands::Doctor => {
            let (ctx, config_path) = load_context(&cwd, cli.config.as_deref())?;
            commands::doctor::run(&ctx, config_path.as_deref(), &SystemRunner)
        }

        Commands::Clean { build_only } => {
            let (ctx, _) = load_context(&cwd, cli.config.as_deref())?;
            commands::clean::run(&ctx, build_only)
        }
    }
}

/// Build the acquisition context from the environment and the configuration
/// file, returning the file's path when one was used.
fn load_context(cwd: &Path, config: Option<&Path>) -> anyhow::Result<(AcquireContext, Option<PathBuf>)> {
    let env = EnvSnapshot::capture();
    let (config, base_dir, path) = match config {
        Some(path) => {
            let path = cwd.join(path);
            let config = BindConfig::load(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let base_dir = path.parent().unwrap_or(cwd).to_path_buf();
            (config, base_dir, Some(path))
        }
        None => match BindConfig::find_and_load(cwd)? {
            Some((config, dir)) => {
                let path = dir.join(faest_pipeline::CONFIG_FILE_NAME);
                (config, dir, Some(path))
            }
            None => (BindConfig::default(), cwd.to_path_buf(), None),
        },
    };
    let ctx = config.context(&base_dir, env);
    tracing::debug!(
        platform = %ctx.platform(),
        bundle_root = %ctx.bundle_root().display(),
        "context ready"
    );
    Ok((ctx, path))
}
