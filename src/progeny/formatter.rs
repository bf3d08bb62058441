use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::node::Node;

/// Turns traversed nodes into output items.
///
/// Formatters are values: [`deeper`](Formatter::deeper) returns the formatter
/// for the next generation and never changes `self`.
pub trait Formatter<N> {
    type Output;

    fn format(&self, node: &Arc<N>) -> Self::Output;

    fn deeper(&self) -> Self
    where
        Self: Sized;
}

/// Yields the node handles themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFormatter;

impl<N> Formatter<N> for NoFormatter {
    type Output = Arc<N>;

    fn format(&self, node: &Arc<N>) -> Arc<N> {
        Arc::clone(node)
    }

    fn deeper(&self) -> Self {
        NoFormatter
    }
}

/// One line per node, indented by depth, marked `+` when the node has
/// children and `|` otherwise.
///
/// The indentation is per-level state: every `deeper()` call returns an
/// independent copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyFormatter {
    indentation: usize,
}

impl PrettyFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indentation(&self) -> usize {
        self.indentation
    }
}

impl<N: Node + Display> Formatter<N> for PrettyFormatter {
    type Output = String;

    fn format(&self, node: &Arc<N>) -> String {
        let marker = if node.has_children().unwrap_or(false) {
            '+'
        } else {
            '|'
        };
        format!("{}{}{}", " ".repeat(self.indentation), marker, node)
    }

    fn deeper(&self) -> Self {
        Self {
            indentation: self.indentation + 1,
        }
    }
}

pub const DEFAULT_GENERATION_BANNER: &str = "Generation {}:";

/// Prefixes the first node of every generation with a banner.
///
/// The set of announced generations is shared by every formatter derived
/// through `deeper()`, so each banner appears once per traversal even though
/// siblings get separate formatters.
#[derive(Debug, Clone)]
pub struct GenerationFormatter {
    generation: usize,
    banner: Arc<str>,
    announced: Arc<Mutex<BTreeSet<usize>>>,
}

impl Default for GenerationFormatter {
    fn default() -> Self {
        Self::with_banner(DEFAULT_GENERATION_BANNER)
    }
}

impl GenerationFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `banner` has its first `{}` replaced by the generation number.
    pub fn with_banner(banner: impl Into<Arc<str>>) -> Self {
        Self {
            generation: 0,
            banner: banner.into(),
            announced: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn announced(&self) -> Vec<usize> {
        self.announced.lock().iter().copied().collect()
    }
}

impl<N: Display> Formatter<N> for GenerationFormatter {
    type Output = String;

    fn format(&self, node: &Arc<N>) -> String {
        if self.announced.lock().insert(self.generation) {
            let banner = self.banner.replacen("{}", &self.generation.to_string(), 1);
            format!("{banner}\n{node}")
        } else {
            node.to_string()
        }
    }

    fn deeper(&self) -> Self {
        Self {
            generation: self.generation + 1,
            banner: Arc::clone(&self.banner),
            announced: Arc::clone(&self.announced),
        }
    }
}
