use std::path::PathBuf;

use enigraph::filesystem::FsTreeConfig;
use enigraph::progeny::ProgenyOptions;

use crate::application::data::ListingStyle;
use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub progeny: ProgenyOptions,
    pub style: ListingStyle,
    pub tree: FsTreeConfig,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            root: cli.root,
            progeny: ProgenyOptions {
                order: cli.order,
                include_root: !cli.no_root,
                generations: cli.generations,
            },
            style: cli.style,
            tree: FsTreeConfig {
                include_hidden: cli.hidden,
                ..FsTreeConfig::default()
            },
        }
    }
}
