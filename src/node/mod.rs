//! Node relationship protocol.
//!
//! A node knows its parent (a non-owning navigation edge) and produces its
//! children. Re-parenting goes through [`NodeExt::set_parent`], which runs the
//! child notification hooks and mirrors the change onto follower nodes.

mod data_node;
mod error;
mod id;
mod protocol;
mod relations;

pub use data_node::DataNode;
pub(crate) use error::*;
pub use error::{NodeError, NotificationStep};
pub use id::NodeId;
pub use protocol::{Children, Node, NodeExt};
pub use relations::Relations;
