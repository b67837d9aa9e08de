use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dual_target_config::templates::emit_for_target;
use dual_target_config::{
    BuildArgs, BuildEnv, ExportFormat, ProjectConfig, render_descriptors, select_mode,
};

#[derive(Parser)]
#[command(name = "dual-target-config")]
#[command(about = "Generate modern/legacy bundler configuration for differential loading")]
struct Cli {
    /// Explicit configuration file; defaults to discovery in the project root
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Project root every output path is resolved against
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,
    /// Build mode; only `production` disables watching and source maps
    #[arg(short, long, global = true)]
    mode: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print both build target descriptors, modern first
    Generate {
        /// Environment flags passed through to the driver (`key=value`)
        #[arg(long = "env")]
        env: Vec<String>,
        /// Output encoding
        #[arg(short, long, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write the per-entry chunk templates for one browser class
    Templates {
        /// Browser class (`modern` or `legacy`)
        #[arg(short, long)]
        target: String,
        /// JSON map of entry name to emitted files
        #[arg(long)]
        chunks: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dual_target_config=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ProjectConfig::load(cli.config.as_deref(), &cli.root)?;
    let argv = BuildArgs { mode: cli.mode };

    match cli.command {
        Commands::Generate { env, format, out } => {
            let descriptors = select_mode(&BuildEnv::from_pairs(&env), &argv, &config);
            let rendered = render_descriptors(&descriptors, format)?;
            match out {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), %format, "wrote build targets");
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Templates { target, chunks } => {
            let written = emit_for_target(&target, argv.mode.as_deref(), &config, &chunks)?;
            info!(count = written.len(), %target, "chunk templates ready");
        }
    }

    Ok(())
}

