use std::collections::HashSet;

use crate::node::{Node, NodeId};

/// Decides whether a node may be yielded and expanded.
///
/// Called exactly once per candidate node; implementations with memory
/// record the node as visited in the same call.
pub trait CircleChecker<N> {
    fn admit(&mut self, node: &N) -> bool;
}

/// Rejects every node that was already admitted during this traversal.
#[derive(Debug, Clone, Default)]
pub struct AvoidCircles {
    visited: HashSet<NodeId>,
}

impl AvoidCircles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visited(&self, id: NodeId) -> bool {
        self.visited.contains(&id)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

impl<N: Node> CircleChecker<N> for AvoidCircles {
    fn admit(&mut self, node: &N) -> bool {
        self.visited.insert(node.id())
    }
}

/// Admits everything. Only safe on graphs known to be acyclic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl<N> CircleChecker<N> for AllowAll {
    fn admit(&mut self, _node: &N) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DataNode;

    #[test]
    fn avoid_circles_admits_once() {
        let node = DataNode::new("a");
        let mut checker = AvoidCircles::new();

        assert!(checker.admit(&*node));
        assert!(!checker.admit(&*node));
        assert!(checker.has_visited(node.id()));
        assert_eq!(checker.visited_count(), 1);
    }

    #[test]
    fn allow_all_never_rejects() {
        let node = DataNode::new("a");
        let mut checker = AllowAll;
        assert!(CircleChecker::<DataNode<&str>>::admit(&mut checker, &node));
        assert!(CircleChecker::<DataNode<&str>>::admit(&mut checker, &node));
    }
}
