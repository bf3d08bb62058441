use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::Display;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a single node instance.
///
/// Ids are handed out from a process-wide counter, so two live nodes never
/// share one. Visited sets, lock ordering and child bookkeeping all compare
/// nodes through this key instead of through their contents.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("#{_0}")]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let first = NodeId::next();
        let second = NodeId::next();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn id_display_is_prefixed() {
        let id = NodeId::next();
        assert_eq!(id.to_string(), format!("#{}", id.get()));
    }
}
