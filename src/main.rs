mod cli;
mod commands;
mod config;
mod engine;
mod resource;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

use crate::state::TrackedState;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let manifest_path = config::expand_path(&cli.manifest);
    let state_path = cli.state.as_deref().map_or_else(
        || TrackedState::default_path(&manifest_path),
        config::expand_path,
    );
    log::debug!(
        "Manifest: {}, state: {}",
        manifest_path.display(),
        state_path.display()
    );

    let ctx = Context {
        verbose: cli.verbose,
        manifest_path,
        state_path,
        base_url: cli.base_url,
        api_key: cli.api_key,
    };

    match cli.command {
        Command::Plan(args) => commands::apply::plan(&ctx, args),
        Command::Apply(args) => commands::apply::apply(&ctx, args),
        Command::Import(cmd) => commands::import::run(&ctx, cmd),
        Command::Show(args) => commands::show::show(&ctx, args),
        Command::Refresh => commands::show::refresh(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "repoflow", &mut io::stdout());
            Ok(())
        }
    }
}
