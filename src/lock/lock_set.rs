use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutexGuard;
use tracing::trace;

use crate::lock::NodeLock;
use crate::node::NodeId;

/// Hooks into lock acquisition, mainly for verifying lock order in tests.
///
/// `acquired` runs right after a lock was taken, `released` right before it
/// is given up, so an observer sees exactly the window a lock is held.
pub trait LockObserver: Send + Sync {
    fn acquired(&self, node: NodeId);

    fn released(&self, node: NodeId);
}

/// A scoped acquisition of several node locks.
///
/// Locks are taken in ascending [`NodeId`] order with duplicates removed and
/// released in reverse order when the set is dropped, on every exit path.
pub struct LockSet<'a> {
    guards: Vec<(NodeId, ReentrantMutexGuard<'a, ()>)>,
    observer: Option<Arc<dyn LockObserver>>,
}

impl<'a> LockSet<'a> {
    /// Blocks until every lock in `locks` is held by the current thread.
    pub fn acquire(
        locks: impl IntoIterator<Item = &'a NodeLock>,
        observer: Option<Arc<dyn LockObserver>>,
    ) -> Self {
        let mut locks: Vec<&NodeLock> = locks.into_iter().collect();
        locks.sort_unstable_by_key(|lock| lock.id());
        locks.dedup_by_key(|lock| lock.id());

        let mut guards = Vec::with_capacity(locks.len());
        for lock in locks {
            let guard = lock.lock();
            if let Some(observer) = &observer {
                observer.acquired(lock.id());
            }
            guards.push((lock.id(), guard));
        }
        trace!("Acquired lock set {:?}", ids(&guards));

        Self { guards, observer }
    }

    pub fn holds(&self, node: NodeId) -> bool {
        self.guards.iter().any(|(id, _)| *id == node)
    }

    /// Held nodes in acquisition order.
    pub fn ids(&self) -> Vec<NodeId> {
        ids(&self.guards)
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for LockSet<'_> {
    fn drop(&mut self) {
        trace!("Releasing lock set {:?}", ids(&self.guards));
        while let Some((id, guard)) = self.guards.pop() {
            if let Some(observer) = &self.observer {
                observer.released(id);
            }
            drop(guard);
        }
    }
}

impl fmt::Debug for LockSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockSet")
            .field("held", &self.ids())
            .finish()
    }
}

fn ids(guards: &[(NodeId, ReentrantMutexGuard<'_, ()>)]) -> Vec<NodeId> {
    guards.iter().map(|(id, _)| *id).collect()
}
