use std::fmt;
use std::sync::{Arc, Weak};

use hashlink::LinkedHashMap;
use parking_lot::Mutex;
use snafu::prelude::*;

use crate::node::error::NotAChildSnafu;
use crate::node::{Children, Node, NodeError, NodeId, Relations};

/// In-memory node carrying a value.
///
/// The children map is the owning side of the tree: a child is kept alive by
/// the parent it is registered with, in insertion order. The parent edge is
/// weak and only used for navigation.
pub struct DataNode<T> {
    id: NodeId,
    data: T,
    parent: Mutex<Weak<DataNode<T>>>,
    children: Mutex<LinkedHashMap<NodeId, Arc<DataNode<T>>>>,
    relations: Relations<DataNode<T>>,
}

impl<T: Send + Sync + 'static> DataNode<T> {
    pub fn new(data: T) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::next(),
            data,
            parent: Mutex::new(Weak::new()),
            children: Mutex::new(LinkedHashMap::new()),
            relations: Relations::default(),
        })
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

impl<T: Send + Sync + 'static> Node for DataNode<T> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn relations(&self) -> &Relations<Self> {
        &self.relations
    }

    fn parent_node(&self) -> Option<Arc<Self>> {
        self.parent.lock().upgrade()
    }

    fn replace_parent(&self, parent: Option<&Arc<Self>>) -> Result<(), NodeError> {
        *self.parent.lock() = parent.map(Arc::downgrade).unwrap_or_default();
        Ok(())
    }

    fn children(&self) -> Result<Children<Self>, NodeError> {
        let snapshot: Vec<_> = self.children.lock().values().cloned().collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn on_child_added(&self, child: &Arc<Self>) -> Result<(), NodeError> {
        self.children.lock().insert(child.id(), Arc::clone(child));
        Ok(())
    }

    fn on_child_removed(&self, child: &Arc<Self>) -> Result<(), NodeError> {
        self.children
            .lock()
            .remove(&child.id())
            .map(drop)
            .context(NotAChildSnafu {
                parent: self.id,
                child: child.id(),
            })
    }

    fn has_children(&self) -> Result<bool, NodeError> {
        Ok(!self.children.lock().is_empty())
    }
}

impl<T: fmt::Display> fmt::Display for DataNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}

impl<T: fmt::Debug> fmt::Debug for DataNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataNode")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("parent", &self.parent.lock().upgrade().map(|parent| parent.id))
            .field("children", &self.children.lock().keys().collect::<Vec<_>>())
            .field("relations", &self.relations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::node::{NodeExt, NotificationStep};

    fn names<T: Clone + Send + Sync + 'static>(nodes: impl IntoIterator<Item = Arc<DataNode<T>>>) -> Vec<T> {
        nodes.into_iter().map(|node| node.data().clone()).collect()
    }

    fn children_of<T: Clone + Send + Sync + 'static>(node: &Arc<DataNode<T>>) -> Vec<T> {
        names(node.children().expect("in-memory children never fail"))
    }

    #[test]
    fn set_parent_links_both_directions() {
        let a = DataNode::new("a");
        let b = DataNode::new("b");

        b.set_parent(&a).expect("Failed to set parent");

        assert!(Arc::ptr_eq(&b.parent().expect("b should have a parent"), &a));
        assert_eq!(children_of(&a), vec!["b"]);
    }

    #[test]
    fn set_parent_twice_is_idempotent() {
        let a = DataNode::new("a");
        let b = DataNode::new("b");

        b.set_parent(&a).expect("Failed to set parent");
        b.set_parent(&a).expect("Setting the same parent again should succeed");

        assert_eq!(children_of(&a), vec!["b"]);
        assert!(Arc::ptr_eq(&b.parent().expect("b should have a parent"), &a));
    }

    #[test]
    fn reparenting_removes_from_old_parent() {
        let a = DataNode::new("a");
        let c = DataNode::new("c");
        let b = DataNode::new("b");

        b.set_parent(&a).expect("Failed to set parent");
        b.set_parent(&c).expect("Failed to move child");

        assert!(children_of(&a).is_empty());
        assert_eq!(children_of(&c), vec!["b"]);
        assert!(!a.has_children().expect("in-memory children never fail"));
        assert!(c.has_children().expect("in-memory children never fail"));
    }

    #[test]
    fn orphan_detaches() {
        let a = DataNode::new("a");
        let b = DataNode::new("b");
        b.set_parent(&a).expect("Failed to set parent");

        b.orphan().expect("Failed to orphan");

        assert!(matches!(b.parent(), Err(NodeError::NoParent { .. })));
        assert!(children_of(&a).is_empty());
    }

    #[test]
    fn root_has_no_parent() {
        let root = DataNode::new("root");
        assert!(matches!(
            root.parent(),
            Err(NodeError::NoParent { node }) if node == root.id()
        ));
    }

    #[test]
    fn children_keep_insertion_order() {
        let parent = DataNode::new(0);
        for value in 1..=5 {
            DataNode::new(value)
                .set_parent(&parent)
                .expect("Failed to set parent");
        }
        assert_eq!(children_of(&parent), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn immutable_node_rejects_reparenting() {
        let a = DataNode::new("a");
        let b = DataNode::new("b");
        b.relations().set_immutable(true);

        let result = b.set_parent(&a);

        assert!(matches!(result, Err(NodeError::ReadOnly { .. })));
        assert!(b.parent().is_err());
        assert!(children_of(&a).is_empty());
    }

    #[fixture]
    fn mirrored() -> (Vec<Arc<DataNode<&'static str>>>, Vec<Arc<DataNode<&'static str>>>) {
        let primary: Vec<_> = ["p0", "p1", "p2"].into_iter().map(DataNode::new).collect();
        let shadow: Vec<_> = ["s0", "s1", "s2"].into_iter().map(DataNode::new).collect();
        for (target, follower) in primary.iter().zip(&shadow) {
            follower.follow(target, "k");
        }
        (primary, shadow)
    }

    #[rstest]
    fn follower_mirrors_parent_changes(
        mirrored: (Vec<Arc<DataNode<&'static str>>>, Vec<Arc<DataNode<&'static str>>>),
    ) {
        let (primary, shadow) = mirrored;

        primary[1].set_parent(&primary[0]).expect("Failed to set parent");
        primary[2].set_parent(&primary[1]).expect("Failed to set parent");

        assert!(Arc::ptr_eq(&shadow[1].parent().expect("mirrored parent"), &shadow[0]));
        assert!(Arc::ptr_eq(&shadow[2].parent().expect("mirrored parent"), &shadow[1]));
        assert_eq!(children_of(&shadow[0]), vec!["s1"]);

        primary[2].set_parent(&primary[0]).expect("Failed to move");
        assert!(Arc::ptr_eq(&shadow[2].parent().expect("mirrored parent"), &shadow[0]));
        assert!(children_of(&shadow[1]).is_empty());
    }

    #[rstest]
    fn follower_rejects_direct_reparenting(
        mirrored: (Vec<Arc<DataNode<&'static str>>>, Vec<Arc<DataNode<&'static str>>>),
    ) {
        let (primary, shadow) = mirrored;
        primary[1].set_parent(&primary[0]).expect("Failed to set parent");

        let result = shadow[1].set_parent(&shadow[2]);

        assert!(matches!(result, Err(NodeError::ReadOnly { .. })));
        assert!(Arc::ptr_eq(&shadow[1].parent().expect("unchanged"), &shadow[0]));
        assert!(Arc::ptr_eq(&primary[1].parent().expect("unchanged"), &primary[0]));
        assert!(children_of(&shadow[2]).is_empty());
    }

    #[test]
    fn missing_follower_key_fails_after_primary_moved() {
        let target = DataNode::new("target");
        let shadow = DataNode::new("shadow");
        let unmirrored = DataNode::new("unmirrored");
        shadow.follow(&target, "k");

        let result = target.set_parent(&unmirrored);

        assert!(matches!(
            result,
            Err(NodeError::MissingFollower { ref key, parent }) if key == "k" && parent == unmirrored.id()
        ));
        // The primary has already moved, the shadow has not
        assert!(Arc::ptr_eq(&target.parent().expect("moved"), &unmirrored));
        assert!(shadow.parent().is_err());
    }

    #[test]
    fn orphaning_a_target_orphans_its_followers() {
        let (parent, target) = (DataNode::new("parent"), DataNode::new("target"));
        let (shadow_parent, shadow) = (DataNode::new("shadow parent"), DataNode::new("shadow"));
        shadow_parent.follow(&parent, "k");
        shadow.follow(&target, "k");
        target.set_parent(&parent).expect("Failed to set parent");
        assert!(Arc::ptr_eq(&shadow.parent().expect("mirrored"), &shadow_parent));

        target.orphan().expect("Failed to orphan");

        assert!(shadow.parent().is_err());
        assert!(children_of(&shadow_parent).is_empty());
    }

    #[test]
    fn follow_does_not_copy_existing_structure() {
        let parent = DataNode::new("parent");
        let target = DataNode::new("target");
        target.set_parent(&parent).expect("Failed to set parent");
        let shadow = DataNode::new("shadow");

        shadow.follow(&target, "k");

        assert!(shadow.parent().is_err());
        let (followed, key) = shadow.relations().following().expect("following");
        assert!(Arc::ptr_eq(&followed, &target));
        assert_eq!(key, "k");
        assert!(Arc::ptr_eq(&target.relations().follower("k").expect("registered"), &shadow));
    }

    #[test]
    fn unfollow_restores_writability() {
        let target = DataNode::new("target");
        let other = DataNode::new("other");
        let shadow = DataNode::new("shadow");
        shadow.follow(&target, "k");
        assert!(shadow.relations().is_read_only());

        assert!(matches!(
            shadow.unfollow(&other),
            Err(NodeError::NotFollowing { .. })
        ));
        shadow.unfollow(&target).expect("Failed to unfollow");

        assert!(!shadow.relations().is_read_only());
        assert!(target.relations().follower("k").is_none());
        shadow.set_parent(&other).expect("Writable again");
    }

    #[test]
    fn following_another_target_drops_old_registration() {
        let first = DataNode::new("first");
        let second = DataNode::new("second");
        let shadow = DataNode::new("shadow");

        shadow.follow(&first, "k");
        shadow.follow(&second, "k");

        assert!(first.relations().follower("k").is_none());
        assert!(second.relations().follower("k").is_some());
    }

    #[test]
    fn follower_replaced_under_same_key_stops_following() {
        let target = DataNode::new("target");
        let parent = DataNode::new("parent");
        let first = DataNode::new("first");
        let second = DataNode::new("second");

        first.follow(&target, "k");
        second.follow(&target, "k");

        assert!(Arc::ptr_eq(&target.relations().follower("k").expect("registered"), &second));
        assert!(first.relations().following().is_none());
        assert!(!first.relations().is_read_only());
        first.set_parent(&parent).expect("Writable again");
        assert!(second.relations().is_read_only());
    }

    #[test]
    fn following_again_under_same_key_keeps_the_follower() {
        let target = DataNode::new("target");
        let shadow = DataNode::new("shadow");

        shadow.follow(&target, "k");
        shadow.follow(&target, "k");

        assert!(shadow.relations().is_following());
        assert!(Arc::ptr_eq(&target.relations().follower("k").expect("registered"), &shadow));
    }

    #[test]
    fn removal_failure_keeps_swap_and_names_step() {
        let a = DataNode::new("a");
        let b = DataNode::new("b");
        let child = DataNode::new("child");
        // Point child at `a` without registering it, so the removal hook fails
        child
            .replace_parent(Some(&a))
            .expect("in-memory swap never fails");

        let result = child.set_parent(&b);

        assert!(matches!(
            result,
            Err(NodeError::Notification {
                step: NotificationStep::ChildRemoved,
                ..
            })
        ));
        // The swap and the addition both happened anyway
        assert!(Arc::ptr_eq(&child.parent().expect("swapped"), &b));
        assert_eq!(children_of(&b), vec!["child"]);
    }
}
