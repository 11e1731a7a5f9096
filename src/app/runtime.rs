use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::app::{context::RunContext, terminal};
use crate::cli::{Cli, Command};
use crate::{ProcessExit, commands};

pub(crate) async fn run_crawler() -> Result<ProcessExit> {
    let cli = Cli::parse();

    let default_level = terminal::resolve_default_log_level(cli.verbose, cli.quiet);
    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(default_level, no_color);
    debug!(?cli, "CLI arguments parsed");

    let ctx = RunContext {
        config_path: cli.config.as_deref(),
        accept_license: cli.accept_license,
        show_progress: terminal::should_use_progress(
            io::stderr().is_terminal(),
            cli.quiet,
            terminal::is_dumb_terminal(),
        ),
    };

    match &cli.command {
        Command::Crawl(args) => commands::run_crawl_command(&ctx, args).await,
        Command::Download(args) => commands::run_download_command(&ctx, args).await,
        Command::Export(args) => commands::run_export_command(args),
        Command::Generate(args) => commands::run_generate_command(args),
    }
}
