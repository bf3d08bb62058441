use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hashlink::LinkedHashMap;
use parking_lot::Mutex;

use crate::node::{Node, NodeId};

/// The node a follower mirrors, and the key it is registered under there.
struct Following<N> {
    target: Weak<N>,
    target_id: NodeId,
    key: String,
}

/// Mirroring state every node variant embeds.
///
/// `followers` owns the shadow nodes keyed by tag, in registration order.
/// `following` only refers back to the target, so a shadow never keeps its
/// target alive.
pub struct Relations<N> {
    followers: Mutex<LinkedHashMap<String, Arc<N>>>,
    following: Mutex<Option<Following<N>>>,
    immutable: AtomicBool,
}

impl<N> Default for Relations<N> {
    fn default() -> Self {
        Self {
            followers: Mutex::new(LinkedHashMap::new()),
            following: Mutex::new(None),
            immutable: AtomicBool::new(false),
        }
    }
}

impl<N> fmt::Debug for Relations<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let followers = self.followers.lock();
        let following = self.following.lock();
        f.debug_struct("Relations")
            .field("followers", &followers.keys().collect::<Vec<_>>())
            .field(
                "following",
                &following
                    .as_ref()
                    .map(|following| (following.target_id, following.key.as_str())),
            )
            .field("immutable", &self.immutable.load(Ordering::Relaxed))
            .finish()
    }
}

impl<N: Node> Relations<N> {
    pub fn follower(&self, key: &str) -> Option<Arc<N>> {
        self.followers.lock().get(key).cloned()
    }

    /// Snapshot of all followers in registration order.
    pub fn followers(&self) -> Vec<(String, Arc<N>)> {
        self.followers
            .lock()
            .iter()
            .map(|(key, follower)| (key.clone(), Arc::clone(follower)))
            .collect()
    }

    /// The followed node and the key this node is registered under, if the
    /// target is still alive.
    pub fn following(&self) -> Option<(Arc<N>, String)> {
        let following = self.following.lock();
        let following = following.as_ref()?;
        Some((following.target.upgrade()?, following.key.clone()))
    }

    pub fn is_following(&self) -> bool {
        self.following.lock().is_some()
    }

    pub fn set_immutable(&self, immutable: bool) {
        self.immutable.store(immutable, Ordering::Release);
    }

    /// Followers and nodes flagged immutable reject direct re-parenting.
    pub fn is_read_only(&self) -> bool {
        self.immutable.load(Ordering::Acquire) || self.is_following()
    }

    pub(crate) fn register_follower(&self, key: String, follower: Arc<N>) -> Option<Arc<N>> {
        self.followers.lock().replace(key, follower)
    }

    /// Drops every follower entry that points at `follower`.
    pub(crate) fn deregister_follower(&self, follower: NodeId) {
        self.followers
            .lock()
            .retain(|_, registered| registered.id() != follower);
    }

    pub(crate) fn start_following(&self, target: &Arc<N>, key: String) -> Option<(NodeId, Weak<N>)> {
        self.following
            .lock()
            .replace(Following {
                target: Arc::downgrade(target),
                target_id: target.id(),
                key,
            })
            .map(|previous| (previous.target_id, previous.target))
    }

    pub(crate) fn following_id(&self) -> Option<NodeId> {
        self.following.lock().as_ref().map(|following| following.target_id)
    }

    pub(crate) fn stop_following(&self) {
        *self.following.lock() = None;
    }
}
