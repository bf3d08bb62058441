use std::sync::Arc;

use crate::node::Node;
use crate::progeny::{AvoidCircles, CircleChecker};

/// The chain of parents of a node, nearest first.
///
/// Ends at a root, or just before a node that was already yielded when the
/// parent chain loops.
pub struct Ancestors<N> {
    next: Option<Arc<N>>,
    checker: AvoidCircles,
}

impl<N: Node> Ancestors<N> {
    pub fn new(start: Arc<N>, include_self: bool) -> Self {
        let mut checker = AvoidCircles::new();
        checker.admit(&*start);
        let next = if include_self {
            Some(start)
        } else {
            start
                .parent_node()
                .filter(|parent| checker.admit(&**parent))
        };
        Self { next, checker }
    }
}

impl<N: Node> Iterator for Ancestors<N> {
    type Item = Arc<N>;

    fn next(&mut self) -> Option<Arc<N>> {
        let current = self.next.take()?;
        self.next = current
            .parent_node()
            .filter(|parent| self.checker.admit(&**parent));
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use crate::node::{DataNode, NodeExt};

    fn chain() -> Vec<std::sync::Arc<DataNode<&'static str>>> {
        let nodes: Vec<_> = ["root", "middle", "leaf"].into_iter().map(DataNode::new).collect();
        nodes[1].set_parent(&nodes[0]).expect("Failed to set parent");
        nodes[2].set_parent(&nodes[1]).expect("Failed to set parent");
        nodes
    }

    fn labels(ancestors: impl Iterator<Item = std::sync::Arc<DataNode<&'static str>>>) -> Vec<&'static str> {
        ancestors.map(|node| *node.data()).collect()
    }

    #[test]
    fn nearest_parent_first() {
        let nodes = chain();
        assert_eq!(labels(nodes[2].ancestors(false)), vec!["middle", "root"]);
        assert_eq!(labels(nodes[2].ancestors(true)), vec!["leaf", "middle", "root"]);
    }

    #[test]
    fn root_has_no_ancestors() {
        let nodes = chain();
        assert!(labels(nodes[0].ancestors(false)).is_empty());
        assert_eq!(labels(nodes[0].ancestors(true)), vec!["root"]);
    }

    #[test]
    fn looping_chain_stops_before_repeating() {
        let nodes = chain();
        nodes[0].set_parent(&nodes[2]).expect("Cycles are not rejected");

        assert_eq!(labels(nodes[2].ancestors(false)), vec!["middle", "root"]);
        assert_eq!(labels(nodes[2].ancestors(true)), vec!["leaf", "middle", "root"]);
    }

    #[test]
    fn loop_entered_through_first_parent_yields_it_once() {
        let nodes: Vec<_> = ["a", "b", "c"].into_iter().map(DataNode::new).collect();
        nodes[0].set_parent(&nodes[1]).expect("Failed to set parent");
        nodes[1].set_parent(&nodes[2]).expect("Failed to set parent");
        nodes[2].set_parent(&nodes[1]).expect("Cycles are not rejected");

        assert_eq!(labels(nodes[0].ancestors(false)), vec!["b", "c"]);
        assert_eq!(labels(nodes[0].ancestors(true)), vec!["a", "b", "c"]);
    }
}
