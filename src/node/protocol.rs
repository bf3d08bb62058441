use std::sync::Arc;

use snafu::prelude::*;
use tracing::{debug, trace, warn};

use crate::node::error::{
    MissingFollowerSnafu, NoParentSnafu, NotFollowingSnafu, NotificationSnafu, ReadOnlySnafu,
};
use crate::node::{NodeError, NodeId, NotificationStep, Relations};
use crate::progeny::{
    Ancestors, AvoidCircles, CircleChecker, Formatter, NoFormatter, Progeny, ProgenyOptions,
};

/// Children of a node, produced one at a time.
pub type Children<N> = Box<dyn Iterator<Item = Arc<N>> + Send>;

/// The relationship protocol every node variant implements.
///
/// Variants supply parent/children access and the backing mutation for a
/// parent swap. Everything built on top of that (notification order,
/// read-only enforcement, follower propagation, traversal) lives in
/// [`NodeExt`], so all variants share one set of rules.
pub trait Node: Send + Sync + Sized + 'static {
    fn id(&self) -> NodeId;

    fn relations(&self) -> &Relations<Self>;

    /// The current parent, if any. This is a navigation edge only.
    fn parent_node(&self) -> Option<Arc<Self>>;

    /// Performs the backing mutation of a parent swap.
    ///
    /// Called by [`NodeExt::set_parent`] after the read-only and idempotence
    /// checks. Implementations must not run notification hooks themselves.
    fn replace_parent(&self, parent: Option<&Arc<Self>>) -> Result<(), NodeError>;

    fn children(&self) -> Result<Children<Self>, NodeError>;

    fn on_child_added(&self, _child: &Arc<Self>) -> Result<(), NodeError> {
        Ok(())
    }

    fn on_child_removed(&self, _child: &Arc<Self>) -> Result<(), NodeError> {
        Ok(())
    }

    /// Pulls at most one child.
    fn has_children(&self) -> Result<bool, NodeError> {
        Ok(self.children()?.next().is_some())
    }

    /// Runs a whole structural mutation (swap, notifications, follower
    /// propagation) of this node towards `parent` as one unit.
    ///
    /// In-memory nodes just run `mutation`; filesystem nodes hold their
    /// ancestor locks for its whole duration.
    fn structural_scope<R>(
        &self,
        _parent: Option<&Arc<Self>>,
        mutation: impl FnOnce() -> Result<R, NodeError>,
    ) -> Result<R, NodeError> {
        mutation()
    }
}

/// Operations shared by all node variants, available on node handles.
pub trait NodeExt<N: Node> {
    /// Fails with [`NodeError::NoParent`] for a root.
    fn parent(&self) -> Result<Arc<N>, NodeError>;

    /// Moves this node under `parent`.
    ///
    /// On success `self` is among `parent`'s children and every follower has
    /// been moved under the follower of `parent` registered with the same
    /// key. If a notification hook fails, the swap itself is *not* rolled
    /// back: the error is [`NodeError::Notification`] naming the step, and
    /// followers are left untouched. A missing follower key on `parent`
    /// fails with [`NodeError::MissingFollower`] after the primary node has
    /// already moved.
    fn set_parent(&self, parent: &Arc<N>) -> Result<(), NodeError>;

    /// Detaches this node from its parent, with the same rules as
    /// [`set_parent`](NodeExt::set_parent).
    fn orphan(&self) -> Result<(), NodeError>;

    /// Registers this node as the mirror of `target` under `key`.
    ///
    /// The current structure is not copied; only later parent changes of
    /// `target` are mirrored. A previous registration elsewhere is dropped.
    fn follow(&self, target: &Arc<N>, key: impl Into<String>);

    fn unfollow(&self, target: &Arc<N>) -> Result<(), NodeError>;

    fn progeny<F, C>(&self, options: ProgenyOptions, formatter: F, checker: C) -> Progeny<N, F, C>
    where
        F: Formatter<N>,
        C: CircleChecker<N>;

    /// Width-first, unformatted, cycle-avoiding progeny without the root.
    fn walk(&self) -> Progeny<N, NoFormatter, AvoidCircles>;

    fn ancestors(&self, include_self: bool) -> Ancestors<N>;
}

impl<N: Node> NodeExt<N> for Arc<N> {
    fn parent(&self) -> Result<Arc<N>, NodeError> {
        self.parent_node().context(NoParentSnafu { node: self.id() })
    }

    fn set_parent(&self, parent: &Arc<N>) -> Result<(), NodeError> {
        reparent(self, Some(parent), true)
    }

    fn orphan(&self) -> Result<(), NodeError> {
        reparent(self, None, true)
    }

    fn follow(&self, target: &Arc<N>, key: impl Into<String>) {
        let key = key.into();
        if let Some((previous_id, previous)) = self.relations().start_following(target, key.clone())
        {
            if let Some(previous) = previous.upgrade() {
                previous.relations().deregister_follower(self.id());
            }
            trace!("Node {} stopped following {}", self.id(), previous_id);
        }
        let evicted = target
            .relations()
            .register_follower(key.clone(), Arc::clone(self));
        if let Some(evicted) = evicted.filter(|evicted| evicted.id() != self.id()) {
            if evicted.relations().following_id() == Some(target.id()) {
                evicted.relations().stop_following();
            }
            debug!(
                "Node {} replaced {} as follower of {} under key '{}'",
                self.id(),
                evicted.id(),
                target.id(),
                key
            );
        }
        debug!("Node {} follows {} under key '{}'", self.id(), target.id(), key);
    }

    fn unfollow(&self, target: &Arc<N>) -> Result<(), NodeError> {
        ensure!(
            self.relations().following_id() == Some(target.id()),
            NotFollowingSnafu {
                node: self.id(),
                target: target.id(),
            }
        );
        target.relations().deregister_follower(self.id());
        self.relations().stop_following();
        debug!("Node {} unfollowed {}", self.id(), target.id());
        Ok(())
    }

    fn progeny<F, C>(&self, options: ProgenyOptions, formatter: F, checker: C) -> Progeny<N, F, C>
    where
        F: Formatter<N>,
        C: CircleChecker<N>,
    {
        Progeny::new(Arc::clone(self), options, formatter, checker)
    }

    fn walk(&self) -> Progeny<N, NoFormatter, AvoidCircles> {
        self.progeny(ProgenyOptions::default(), NoFormatter, AvoidCircles::new())
    }

    fn ancestors(&self, include_self: bool) -> Ancestors<N> {
        Ancestors::new(Arc::clone(self), include_self)
    }
}

fn reparent<N: Node>(
    node: &Arc<N>,
    parent: Option<&Arc<N>>,
    enforce_read_only: bool,
) -> Result<(), NodeError> {
    ensure!(
        !(enforce_read_only && node.relations().is_read_only()),
        ReadOnlySnafu { node: node.id() }
    );

    node.structural_scope(parent, || {
        let old_parent = node.parent_node();
        if old_parent.as_ref().map(|old| old.id()) == parent.map(|new| new.id()) {
            trace!("Parent of node {} unchanged", node.id());
            return Ok(());
        }

        node.replace_parent(parent)?;
        debug!(
            "Node {} moved from {:?} to {:?}",
            node.id(),
            old_parent.as_ref().map(|old| old.id()),
            parent.map(|new| new.id())
        );

        notify(node, old_parent.as_ref(), parent)?;

        for (key, follower) in node.relations().followers() {
            let mirror = match parent {
                Some(parent) => Some(parent.relations().follower(&key).context(
                    MissingFollowerSnafu {
                        parent: parent.id(),
                        key: key.clone(),
                    },
                )?),
                None => None,
            };
            reparent(&follower, mirror.as_ref(), false)?;
        }

        Ok(())
    })
}

/// Runs the removal hook and then, whatever its outcome, the addition hook.
fn notify<N: Node>(
    node: &Arc<N>,
    old_parent: Option<&Arc<N>>,
    parent: Option<&Arc<N>>,
) -> Result<(), NodeError> {
    let removed = old_parent.map_or(Ok(()), |old| old.on_child_removed(node));
    let added = parent.map_or(Ok(()), |new| new.on_child_added(node));

    match (removed, added) {
        (Err(error), added) => {
            if let Err(shadowed) = added {
                warn!(
                    "Child addition for node {} also failed: {}",
                    node.id(),
                    shadowed
                );
            }
            Err(error).context(NotificationSnafu {
                node: node.id(),
                step: NotificationStep::ChildRemoved,
            })
        }
        (Ok(()), Err(error)) => Err(error).context(NotificationSnafu {
            node: node.id(),
            step: NotificationStep::ChildAdded,
        }),
        (Ok(()), Ok(())) => Ok(()),
    }
}
