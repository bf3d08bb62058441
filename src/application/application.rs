use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use enigraph::filesystem::{FsNode, FsTree};
use enigraph::progeny::{
    AvoidCircles, Formatter, GenerationFormatter, PrettyFormatter, ProgenyOptions,
};
use enigraph::NodeExt;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::application::data::ListingStyle;
use crate::application::listing::Highlighted;

pub struct Application;

impl Application {
    pub fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Runtime config: {:?}", app_config);

        let colors = supports_color::on(supports_color::Stream::Stdout).is_some();
        colored::control::set_override(colors);

        let tree = FsTree::builder().config(app_config.tree.clone()).build();
        let root = tree.open(&app_config.root);
        ensure!(root.is_dir(), NotADirectorySnafu { root: root.path() });

        let printed = match app_config.style {
            ListingStyle::Pretty => print_progeny(&root, app_config.progeny, PrettyFormatter::new()),
            ListingStyle::Generations => {
                print_progeny(&root, app_config.progeny, GenerationFormatter::new())
            }
        }?;
        info!("Listed {} entries of {}", printed, root.path().display());

        Ok(())
    }
}

fn print_progeny<F>(
    root: &Arc<FsNode>,
    options: ProgenyOptions,
    formatter: F,
) -> Result<usize, ApplicationError>
where
    F: Formatter<FsNode, Output = String>,
{
    let mut out = io::stdout().lock();
    let mut printed = 0;
    for line in root.progeny(options, Highlighted::new(formatter), AvoidCircles::new()) {
        match line {
            Ok(line) => {
                writeln!(out, "{line}").context(OutputSnafu)?;
                printed += 1;
            }
            Err(error) => warn!("Skipping unreadable entry: {error}"),
        }
    }
    out.flush().context(OutputSnafu)?;
    Ok(printed)
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("{} is not a directory", root.display()))]
    NotADirectoryError { root: PathBuf },
    #[snafu(display("Failed to write the listing"))]
    OutputError { source: io::Error },
}
