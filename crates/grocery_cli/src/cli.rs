//! Command-line surface. Every subcommand maps to one UI event.

use clap::{Parser, Subcommand, ValueEnum};
use grocery_core::SectionMove;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "grocery",
    version,
    about = "Grocery lists per store, sorted by the store's aisle order"
)]
pub(crate) struct Cli {
    /// SQLite file holding the grocery records.
    #[arg(
        long,
        global = true,
        env = "GROCERY_DB_PATH",
        default_value = "grocery.sqlite3"
    )]
    pub db: PathBuf,

    /// trace|debug|info|warn|error (defaults by build mode).
    #[arg(long, global = true, env = "GROCERY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotated log files; logging is off when unset.
    #[arg(long, global = true, env = "GROCERY_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show the active store's items in aisle order
    List {
        /// Skip items already checked off
        #[arg(long)]
        hide_completed: bool,
    },
    /// Manage stores
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },
    /// Manage the active store's sections
    Section {
        #[command(subcommand)]
        command: SectionCommand,
    },
    /// Manage the active store's items
    Item {
        #[command(subcommand)]
        command: ItemCommand,
    },
    /// Add many items at once, asking for the section of unknown ones
    Paste {
        /// Item lines; each argument is one line
        lines: Vec<String>,
        /// Read additional lines from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Never ask; unknown items go to "Aisle Items"
        #[arg(long)]
        no_prompt: bool,
    },
    /// Show remembered item-to-section assignments
    Cache,
    /// Write all records as one JSON object
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load records from an exported JSON object or a localStorage dump
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub(crate) enum StoreCommand {
    /// List stores
    List,
    /// Make a store active
    Select { index: usize },
    /// Add a store with the default sections and make it active
    Add { name: String },
    /// Rename the active store
    Rename { name: String },
    /// Delete the active store
    Delete {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum SectionCommand {
    /// List sections in aisle order
    List,
    /// Append a section
    Add { name: String },
    /// Swap a section with its neighbor
    Move { index: usize, direction: Direction },
    /// Rename a section and relabel its items
    Edit { index: usize, name: String },
    /// Delete a section; its items move to the fallback section
    Delete {
        index: usize,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ItemCommand {
    /// Add an item
    Add {
        name: String,
        /// Section name (defaults to the first section)
        #[arg(long, short)]
        section: Option<String>,
    },
    /// Check or uncheck an item
    Toggle { index: usize },
    /// Delete an item
    Delete { index: usize },
    /// Move an item to another existing section
    Section { index: usize, section: String },
    /// Move an item to another position
    Move { from: usize, to: usize },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub(crate) enum Direction {
    Up,
    Down,
}

impl From<Direction> for SectionMove {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Up => SectionMove::Up,
            Direction::Down => SectionMove::Down,
        }
    }
}
