mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use taskboard_core::config::{default_config_path, load_config};
use taskboard_core::BoardRegistry;

use commands::Command;

/// Local task boards from the command line.
#[derive(Parser, Debug)]
#[command(name = "taskboard", version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "TASKBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Store directory, overriding the config file
    #[arg(long, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path);
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    // One-shot commands exit before any watcher event could matter.
    config.watch_external &= cli.command.is_long_running();

    log::debug!("[taskboard.cli] Using store at {}", config.data_dir().display());
    let registry = Arc::new(BoardRegistry::new(Arc::new(config.open_gateway())));

    match cli.command.execute(registry).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
