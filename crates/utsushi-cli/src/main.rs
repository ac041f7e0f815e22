//! utsushi command-line tool.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a recorded action log against a surface snapshot and a source tree
//! utsushi replay --surface snapshot.json --actions log.json --root ./src
//!
//! # Same, writing the final surface state and tolerating failed actions
//! utsushi replay --surface snapshot.json --actions log.json --root ./src \
//!     --output after.json --keep-going
//!
//! # Apply a search/replace or oid-block patch to a file
//! utsushi apply-diff src/app/page.tsx change.patch
//! utsushi apply-diff src/app/page.tsx change.patch --dry-run
//! ```
//!
//! Engine settings come from `--config <file.toml>`; logging from `RUST_LOG`.

mod replay;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use utsushi_engine::EngineConfig;

#[derive(Parser, Debug)]
#[command(name = "utsushi")]
#[command(about = "Replay visual-editor actions and apply code patches")]
struct Args {
    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON action log to a surface snapshot and a source tree
    Replay {
        /// Surface snapshot (JSON)
        #[arg(long)]
        surface: PathBuf,

        /// Action log: a JSON array of actions
        #[arg(long)]
        actions: PathBuf,

        /// Project source root
        #[arg(long)]
        root: PathBuf,

        /// Write the resulting surface snapshot here
        #[arg(long)]
        output: Option<PathBuf>,

        /// Continue past failed actions
        #[arg(long)]
        keep_going: bool,
    },

    /// Run a patch file through the diff applier
    ApplyDiff {
        file: PathBuf,
        patch: PathBuf,

        /// Print the result instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match args.command {
        Command::Replay {
            surface,
            actions,
            root,
            output,
            keep_going,
        } => {
            let actions = replay::load_actions(&actions).await?;
            let total = actions.len();
            let (report, snapshot) =
                replay::replay(config, &surface, actions, &root, keep_going).await?;

            println!(
                "applied {}/{} actions, {} undo steps",
                report.applied, total, report.undo_steps
            );
            for (n, error) in &report.failed {
                println!("  action {n}: {error}");
            }
            if let Some(output) = output {
                let json = serde_json::to_string_pretty(&snapshot)?;
                tokio::fs::write(&output, json)
                    .await
                    .with_context(|| format!("writing {}", output.display()))?;
                tracing::info!(path = %output.display(), "surface snapshot written");
            }
            Ok(if report.failed.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::ApplyDiff {
            file,
            patch,
            dry_run,
        } => {
            let text = replay::apply_diff(&file, &patch, dry_run).await?;
            if dry_run {
                print!("{text}");
            } else {
                tracing::info!(path = %file.display(), "patch applied");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
