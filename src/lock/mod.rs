//! Ordered, re-entrant locking of node ancestor chains.
//!
//! Every lockable node owns a [`NodeLock`]. A structural operation acquires
//! the locks of all nodes it may observe mid-mutation as one [`LockSet`]:
//! the requested locks are deduplicated and taken in ascending [`NodeId`]
//! order, so two lock sets can never wait on each other in a cycle. Dropping
//! the set releases the locks in exactly the reverse order.
//!
//! [`NodeId`]: crate::node::NodeId

mod lock_set;
mod node_lock;

pub use lock_set::{LockObserver, LockSet};
pub use node_lock::NodeLock;
