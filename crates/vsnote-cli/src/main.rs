mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vsnote",
    about = "vsnote client telemetry queue and version upgrade runner",
    version,
    propagate_version = true
)]
struct Cli {
    /// Client state directory (default: ~/.vscode-note)
    #[arg(long, global = true, env = "VSNOTE_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the startup sequence: first-run setup, upgrade steps, daily heartbeat
    Init {
        /// Directory holding the installed extension versions
        #[arg(long, env = "VSNOTE_INSTALL_DIR")]
        install_dir: PathBuf,

        /// Version of the running extension (default: this binary's version)
        #[arg(long)]
        current_version: Option<String>,
    },

    /// Record an action and flush pending actions
    Record {
        /// Action name, e.g. open-note
        action: String,
    },

    /// Deliver all pending actions
    Flush,

    /// Send the daily active heartbeat if it is due
    Heartbeat,

    /// Show client id, pending actions, and last heartbeat
    Status,

    /// Run (or preview) the upgrade steps between the previous and current version
    Upgrade {
        /// Directory holding the installed extension versions
        #[arg(long, env = "VSNOTE_INSTALL_DIR")]
        install_dir: PathBuf,

        /// Version of the running extension (default: this binary's version)
        #[arg(long)]
        current_version: Option<String>,

        /// Show the steps that would run without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// List registered upgrade steps
    Migrations,

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Init { .. } | Commands::Upgrade { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let state_dir = match root::resolve_state_dir(cli.state_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init {
            install_dir,
            current_version,
        } => cmd::init::run(&state_dir, &install_dir, current_version.as_deref(), cli.json),
        Commands::Record { action } => cmd::action::record(&state_dir, &action, cli.json),
        Commands::Flush => cmd::action::flush(&state_dir, cli.json),
        Commands::Heartbeat => cmd::heartbeat::run(&state_dir, cli.json),
        Commands::Status => cmd::status::run(&state_dir, cli.json),
        Commands::Upgrade {
            install_dir,
            current_version,
            dry_run,
        } => cmd::upgrade::run(
            &state_dir,
            &install_dir,
            current_version.as_deref(),
            dry_run,
            cli.json,
        ),
        Commands::Migrations => cmd::upgrade::list(cli.json),
        Commands::Config { subcommand } => cmd::config::run(&state_dir, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
