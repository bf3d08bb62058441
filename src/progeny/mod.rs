//! Traversal of node progeny and ancestry.
//!
//! Traversals are lazy iterators: children of a node are only fetched once
//! the consumer pulls past that node, so dropping an iterator early leaves
//! unvisited subtrees untouched. No lock is held between two items.

mod ancestors;
mod circle;
mod formatter;
mod traverse;

pub use ancestors::Ancestors;
pub use circle::{AllowAll, AvoidCircles, CircleChecker};
pub use formatter::{
    DEFAULT_GENERATION_BANNER, Formatter, GenerationFormatter, NoFormatter, PrettyFormatter,
};
pub use traverse::{Order, Progeny, ProgenyOptions};
