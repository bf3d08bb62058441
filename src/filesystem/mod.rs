//! Filesystem-backed nodes.
//!
//! An [`FsTree`] owns the identity registry and the backing store. Every
//! [`FsNode`] it hands out stands for one path: opening the same path twice
//! yields the same node, moves and renames happen on disk and in memory
//! under the ordered ancestor locks of every node involved.

mod backend;
mod config;
mod creation;
mod fs_node;
mod tree;

pub use backend::{Backend, LocalBackend};
pub use config::{FsTreeConfig, Listing};
pub use creation::Creation;
pub use fs_node::FsNode;
pub use tree::{FsTree, FsTreeBuilder};
