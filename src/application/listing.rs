use std::sync::Arc;

use colored::Colorize;
use enigraph::filesystem::FsNode;
use enigraph::progeny::Formatter;

/// Highlights directories in the lines produced by `inner`.
///
/// Whether colour is emitted at all is decided globally through
/// `colored::control`.
#[derive(Debug, Clone)]
pub struct Highlighted<F> {
    inner: F,
}

impl<F> Highlighted<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: Formatter<FsNode, Output = String>> Formatter<FsNode> for Highlighted<F> {
    type Output = String;

    fn format(&self, node: &Arc<FsNode>) -> String {
        let line = self.inner.format(node);
        if node.is_dir() {
            line.blue().bold().to_string()
        } else {
            line
        }
    }

    fn deeper(&self) -> Self {
        Self {
            inner: self.inner.deeper(),
        }
    }
}

#[cfg(test)]
mod tests {
    use enigraph::filesystem::{Creation, FsTree};
    use enigraph::progeny::PrettyFormatter;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn highlights_directories_only() {
        colored::control::set_override(true);
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tree = FsTree::new();
        let dir = tree
            .create(temp_dir.path().join("dir"), Creation::Directory)
            .expect("Failed to create directory");
        let file = tree
            .create(temp_dir.path().join("file"), Creation::File)
            .expect("Failed to create file");

        let formatter = Highlighted::new(PrettyFormatter::new());

        assert_ne!(formatter.format(&dir), "|dir");
        assert!(formatter.format(&dir).contains("|dir"));
        assert_eq!(formatter.format(&file), "|file");
        assert_eq!(formatter.deeper().format(&file), " |file");
    }
}
