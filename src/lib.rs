//! Mutable trees whose nodes can be re-parented at runtime.
//!
//! * [`node`]: the relationship protocol, in-memory [`DataNode`]s and
//!   follower mirroring.
//! * [`progeny`]: lazy, cycle-safe traversal in width-first or depth-first
//!   order with pluggable formatting.
//! * [`filesystem`]: nodes backed by directories and files, moved and
//!   renamed under ordered ancestor locks ([`lock`]).
//! * [`intern`]: the identity registry handing out one node per key.

pub mod filesystem;
pub mod intern;
pub mod lock;
pub mod node;
pub mod progeny;

mod ext;

pub use node::{DataNode, Node, NodeError, NodeExt, NodeId};
