mod cli;
mod commands;
mod format;
mod output;

use clap::Parser;
use marksync::config;
use marksync::session::SessionHub;

fn main() {
    let args = cli::Cli::parse();

    // Initialize logger
    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: cli::Cli) -> marksync::Result<()> {
    // Load configuration
    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from_path(config_path)?
    } else {
        config::Config::load()
    }
    .with_env();

    if let Some(path) = &args.db {
        cfg.db_path = Some(path.clone());
    }

    let sessions = SessionHub::load(&cfg.session_path());
    cli::handle_args(args, &cfg, &sessions)
}
