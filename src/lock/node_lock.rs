use std::fmt;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::node::NodeId;

/// The re-entrant lock a node owns.
///
/// Re-entrant per thread: an operation that already holds a node's lock may
/// request it again, e.g. when the destination of a move lies inside the
/// moved subtree.
pub struct NodeLock {
    id: NodeId,
    mutex: ReentrantMutex<()>,
}

impl NodeLock {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            mutex: ReentrantMutex::new(()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.mutex.lock()
    }
}

impl fmt::Debug for NodeLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeLock")
            .field("id", &self.id)
            .field("locked", &self.mutex.is_locked())
            .finish()
    }
}
