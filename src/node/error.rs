use std::path::PathBuf;

use derive_more::Display;
use snafu::Snafu;

use crate::ext::BestEffortPathExt;
use crate::node::NodeId;

/// The notification that failed after a parent swap had already been applied.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStep {
    #[display("child removal")]
    ChildRemoved,
    #[display("child addition")]
    ChildAdded,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NodeError {
    #[snafu(display("Node {node} has no parent"))]
    NoParent { node: NodeId },

    #[snafu(display("Node {node} is read-only"))]
    ReadOnly { node: NodeId },

    #[snafu(display("Parent {parent} has no follower registered under key '{key}'"))]
    MissingFollower { parent: NodeId, key: String },

    #[snafu(display("Node {node} does not follow {target}"))]
    NotFollowing { node: NodeId, target: NodeId },

    #[snafu(display("Node {child} is not a child of {parent}"))]
    NotAChild { parent: NodeId, child: NodeId },

    /// The parent pointer of `node` was already changed when `step` failed.
    #[snafu(display("Parent of node {node} was changed, but the {step} notification failed"))]
    Notification {
        node: NodeId,
        step: NotificationStep,
        #[snafu(source(from(NodeError, Box::new)))]
        source: Box<NodeError>,
    },

    #[snafu(display("Invalid path: {}", path.best_effort_path_display()))]
    InvalidPath { path: PathBuf },

    #[snafu(display("Not a directory: {}", path.best_effort_path_display()))]
    NotADirectory { path: PathBuf },

    #[snafu(display("Path already exists: {}", path.best_effort_path_display()))]
    Exists { path: PathBuf },

    #[snafu(display(
        "Couldn't create a new entry at {}, it does not exist after creation",
        path.best_effort_path_display()
    ))]
    Initialization { path: PathBuf },

    #[snafu(display("Filesystem node {} cannot be detached from its parent", path.best_effort_path_display()))]
    CannotDetach { path: PathBuf },

    #[snafu(display("Filesystem operation failed on {}", path.best_effort_path_display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("The tree owning {} has been dropped", path.best_effort_path_display()))]
    TreeDropped { path: PathBuf },

    #[snafu(display("Unknown traversal order '{method}'"))]
    UnknownOrder { method: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_errors_name_the_path() {
        let error = NodeError::NotADirectory {
            path: PathBuf::from("/this/path/does/not/exist.txt"),
        };
        let message = error.to_string();
        assert!(message.contains("Not a directory"));
        assert!(message.contains("/this/path/does/not/exist.txt"));
    }

    #[test]
    fn notification_error_names_the_step() {
        let node = NodeId::next();
        let error = NodeError::Notification {
            node,
            step: NotificationStep::ChildAdded,
            source: Box::new(NodeError::NotAChild {
                parent: NodeId::next(),
                child: node,
            }),
        };
        assert!(error.to_string().contains("child addition"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
