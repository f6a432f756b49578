//! `grocery` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Bootstrap logging and the SQLite record store, then run one command.
//!
//! # Invariants
//! - Logging stays off unless a log directory is configured.
//! - Every rejection surfaces as an error with a non-zero exit status.

mod cli;
mod commands;
mod prompt;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use grocery_core::db::open_db;
use grocery_core::{default_log_level, init_logging, SqliteKvRepository};
use log::info;
use prompt::LinePrompter;
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let Some(log_dir) = log_dir.to_str() else {
            bail!("log directory `{}` is not valid UTF-8", log_dir.display());
        };
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open `{}`", cli.db.display()))?;
    let kv = SqliteKvRepository::try_new(&conn)?;
    info!("event=cli_run module=cli status=start");

    let stdin = io::stdin();
    let mut prompter = LinePrompter::new(stdin.lock(), io::stdout());
    commands::run(&kv, cli.command, &mut prompter, &mut io::stdout())
}
