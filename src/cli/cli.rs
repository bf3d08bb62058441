use std::path::PathBuf;

use clap::Parser;
use enigraph::progeny::Order;

use crate::application::data::{ListingStyle, LogLevel};

/// Prints the progeny of a directory.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// The directory to list
    #[clap(default_value = ".")]
    pub root: PathBuf,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Traversal order: `width` (`w`) or `depth` (`d`)
    #[clap(long, short, default_value = "depth")]
    pub order: Order,

    /// Number of generations below the root to print; unlimited if omitted
    #[clap(long, short)]
    pub generations: Option<usize>,

    #[clap(long, short, default_value = "pretty", value_enum)]
    pub style: ListingStyle,

    /// Also list entries whose name starts with a dot
    #[clap(long)]
    pub hidden: bool,

    /// Do not print the root directory itself
    #[clap(long)]
    pub no_root: bool,
}
