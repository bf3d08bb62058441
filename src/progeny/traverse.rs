use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::node::{Children, Node, NodeError, UnknownOrderSnafu};
use crate::progeny::{CircleChecker, Formatter};

/// Order in which progeny is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// All admissible children of a node first, then the progeny of each of
    /// those children in turn.
    #[default]
    WidthFirst,
    /// Each child immediately followed by its whole progeny.
    DepthFirst,
}

impl FromStr for Order {
    type Err = NodeError;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            "w" | "width" | "width_first" | "width-first" => Ok(Order::WidthFirst),
            "d" | "depth" | "depth_first" | "depth-first" => Ok(Order::DepthFirst),
            _ => UnknownOrderSnafu { method }.fail(),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::WidthFirst => f.write_str("width-first"),
            Order::DepthFirst => f.write_str("depth-first"),
        }
    }
}

/// What a progeny traversal produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgenyOptions {
    pub order: Order,
    /// Emit the starting node (formatted at generation 0) before its progeny.
    pub include_root: bool,
    /// Number of generations below the root to produce; `None` is unlimited.
    pub generations: Option<usize>,
}

impl ProgenyOptions {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn depth_first() -> Self {
        Self::new(Order::DepthFirst)
    }

    pub fn width_first() -> Self {
        Self::new(Order::WidthFirst)
    }

    pub fn with_root(mut self) -> Self {
        self.include_root = true;
        self
    }

    pub fn generations(mut self, generations: usize) -> Self {
        self.generations = Some(generations);
        self
    }
}

/// A node whose children have not been fetched yet.
struct Expansion<N, F> {
    node: Arc<N>,
    formatter: F,
    generations: Option<usize>,
}

impl<N: Node, F: Formatter<N>> Expansion<N, F> {
    /// The expansion of `node`, one generation below a level that still had
    /// `generations` to go, or `None` once the limit is reached.
    fn below(node: Arc<N>, formatter: &F, generations: Option<usize>) -> Option<Self> {
        let generations = generations.map(|remaining| remaining.saturating_sub(1));
        (generations != Some(0)).then(|| Expansion {
            node,
            formatter: formatter.deeper(),
            generations,
        })
    }
}

struct DepthFrame<N, F> {
    children: Children<N>,
    formatter: F,
    generations: Option<usize>,
}

struct WidthFrame<N, F> {
    admitted: Vec<Arc<N>>,
    emitted: usize,
    expanded: usize,
    formatter: F,
    generations: Option<usize>,
}

enum Frames<N, F> {
    DepthFirst(Vec<DepthFrame<N, F>>),
    WidthFirst(Vec<WidthFrame<N, F>>),
}

/// Lazy progeny traversal, created by [`NodeExt::progeny`](crate::node::NodeExt::progeny).
///
/// A node whose children cannot be read yields one `Err` item and is not
/// expanded; the traversal then continues with the rest of the tree.
pub struct Progeny<N, F, C> {
    root: Option<(Arc<N>, F)>,
    pending: Option<Expansion<N, F>>,
    frames: Frames<N, F>,
    checker: C,
}

impl<N, F, C> Progeny<N, F, C>
where
    N: Node,
    F: Formatter<N>,
    C: CircleChecker<N>,
{
    pub fn new(root: Arc<N>, options: ProgenyOptions, formatter: F, mut checker: C) -> Self {
        checker.admit(&root);
        let pending = (options.generations != Some(0)).then(|| Expansion {
            node: Arc::clone(&root),
            formatter: formatter.deeper(),
            generations: options.generations,
        });
        let frames = match options.order {
            Order::DepthFirst => Frames::DepthFirst(Vec::new()),
            Order::WidthFirst => Frames::WidthFirst(Vec::new()),
        };
        Self {
            root: options.include_root.then_some((root, formatter)),
            pending,
            frames,
            checker,
        }
    }

    /// The circle checker, with everything admitted so far.
    pub fn checker(&self) -> &C {
        &self.checker
    }

    fn open(&mut self, expansion: Expansion<N, F>) -> Result<(), NodeError> {
        let Expansion {
            node,
            formatter,
            generations,
        } = expansion;
        let children = node.children()?;
        match &mut self.frames {
            Frames::DepthFirst(stack) => stack.push(DepthFrame {
                children,
                formatter,
                generations,
            }),
            Frames::WidthFirst(stack) => {
                // The whole level is checked before any of it is emitted
                let admitted = children
                    .filter(|child| self.checker.admit(child))
                    .collect();
                stack.push(WidthFrame {
                    admitted,
                    emitted: 0,
                    expanded: 0,
                    formatter,
                    generations,
                });
            }
        }
        Ok(())
    }
}

impl<N, F, C> Iterator for Progeny<N, F, C>
where
    N: Node,
    F: Formatter<N>,
    C: CircleChecker<N>,
{
    type Item = Result<F::Output, NodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((root, formatter)) = self.root.take() {
            return Some(Ok(formatter.format(&root)));
        }

        loop {
            if let Some(expansion) = self.pending.take() {
                if let Err(error) = self.open(expansion) {
                    return Some(Err(error));
                }
            }

            match &mut self.frames {
                Frames::DepthFirst(stack) => {
                    let frame = stack.last_mut()?;
                    let Some(child) = frame.children.next() else {
                        stack.pop();
                        continue;
                    };
                    if !self.checker.admit(&child) {
                        continue;
                    }
                    let item = frame.formatter.format(&child);
                    self.pending = Expansion::below(child, &frame.formatter, frame.generations);
                    return Some(Ok(item));
                }
                Frames::WidthFirst(stack) => {
                    let frame = stack.last_mut()?;
                    if let Some(child) = frame.admitted.get(frame.emitted) {
                        frame.emitted += 1;
                        return Some(Ok(frame.formatter.format(child)));
                    }
                    if let Some(child) = frame.admitted.get(frame.expanded) {
                        let child = Arc::clone(child);
                        frame.expanded += 1;
                        self.pending = Expansion::below(child, &frame.formatter, frame.generations);
                        continue;
                    }
                    stack.pop();
                }
            }
        }
    }
}
