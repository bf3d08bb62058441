use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use snafu::prelude::*;
use tracing::debug;

use crate::ext::normalize_node_path;
use crate::filesystem::{Backend, Creation, FsNode, FsTreeConfig, LocalBackend};
use crate::intern::Interner;
use crate::lock::LockObserver;
use crate::node::{ExistsSnafu, InitializationSnafu, InvalidPathSnafu, IoSnafu, Node, NodeError};

/// State every node of a tree holds on to.
pub(super) struct FsShared {
    pub(super) config: FsTreeConfig,
    pub(super) backend: Arc<dyn Backend>,
    pub(super) observer: Option<Arc<dyn LockObserver>>,
}

/// The identity registry of a tree. Nodes only refer to it weakly.
pub(super) struct FsContext {
    pub(super) shared: Arc<FsShared>,
    interner: Interner<PathBuf, FsNode>,
}

impl FsContext {
    /// The node for an absolute, normalized path, interning every ancestor
    /// on the way.
    pub(super) fn node_at(self: &Arc<Self>, path: &Path) -> Arc<FsNode> {
        if let Some(node) = self.interner.get(&path.to_path_buf()) {
            return node;
        }
        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => {
                let parent = self.node_at(parent);
                self.child_of(&parent, name)
            }
            _ => self.interner.intern(path.to_path_buf(), || {
                FsNode::new(self, None, path.as_os_str().to_owned())
            }),
        }
    }

    pub(super) fn child_of(self: &Arc<Self>, parent: &Arc<FsNode>, name: &OsStr) -> Arc<FsNode> {
        self.interner.intern(parent.path().join(name), || {
            FsNode::new(self, Some(Arc::clone(parent)), name.to_owned())
        })
    }

    /// Re-keys `from` and everything below it to the same place under `to`.
    pub(super) fn relocate(&self, from: &Path, to: &Path) -> usize {
        self.interner.rekey(|key| {
            key.strip_prefix(from).ok().map(|rest| {
                if rest.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(rest)
                }
            })
        })
    }

    fn evict(&self, path: &Path) -> usize {
        self.interner.invalidate_where(|key| key.starts_with(path))
    }
}

/// A tree of filesystem nodes sharing one identity registry and backend.
///
/// Cloning is cheap; clones share everything. Nodes stay usable only while
/// some clone of their tree is alive.
#[derive(Clone)]
pub struct FsTree {
    context: Arc<FsContext>,
}

impl Default for FsTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FsTree {
    /// A tree on the local filesystem with the default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> FsTreeBuilder {
        FsTreeBuilder::default()
    }

    pub fn config(&self) -> &FsTreeConfig {
        &self.context.shared.config
    }

    /// The node for `path`, without touching the backend.
    ///
    /// `~`, `$VAR` and relative paths are expanded first, so every spelling
    /// of a path yields the same node.
    pub fn open(&self, path: impl AsRef<Path>) -> Arc<FsNode> {
        self.context.node_at(&normalize_node_path(path.as_ref()))
    }

    /// Creates the entry for `path`, failing with [`NodeError::Exists`] if
    /// it is already there. Missing ancestors are created as directories.
    pub fn create(&self, path: impl AsRef<Path>, creation: Creation) -> Result<Arc<FsNode>, NodeError> {
        self.create_at(&normalize_node_path(path.as_ref()), &creation, true)
    }

    /// Like [`create`](FsTree::create), but keeps an existing entry as it is.
    pub fn ensure(&self, path: impl AsRef<Path>, creation: Creation) -> Result<Arc<FsNode>, NodeError> {
        self.create_at(&normalize_node_path(path.as_ref()), &creation, false)
    }

    /// The node at `relative` below `parent`. Absolute paths are rejected.
    pub fn open_child(&self, parent: &FsNode, relative: impl AsRef<Path>) -> Result<Arc<FsNode>, NodeError> {
        let path = child_path(parent, relative.as_ref())?;
        Ok(self.context.node_at(&path))
    }

    pub fn create_child(
        &self,
        parent: &FsNode,
        relative: impl AsRef<Path>,
        creation: Creation,
    ) -> Result<Arc<FsNode>, NodeError> {
        self.create_at(&child_path(parent, relative.as_ref())?, &creation, true)
    }

    pub fn ensure_child(
        &self,
        parent: &FsNode,
        relative: impl AsRef<Path>,
        creation: Creation,
    ) -> Result<Arc<FsNode>, NodeError> {
        self.create_at(&child_path(parent, relative.as_ref())?, &creation, false)
    }

    /// The already interned node for `path`, if any.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<FsNode>> {
        self.context
            .interner
            .get(&normalize_node_path(path.as_ref()))
    }

    /// Forgets the nodes for `path` and everything below it; the next lookup
    /// creates fresh ones. Returns how many nodes were evicted.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> usize {
        let path = normalize_node_path(path.as_ref());
        let evicted = self.context.evict(&path);
        debug!("Invalidated {} nodes under {}", evicted, path.display());
        evicted
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.context.interner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.context.interner.is_empty()
    }

    fn create_at(
        &self,
        path: &Path,
        creation: &Creation,
        fail_if_exists: bool,
    ) -> Result<Arc<FsNode>, NodeError> {
        let node = self.context.node_at(path);
        if let Some(parent) = node.parent_node() {
            if !parent.exists() {
                self.create_at(&parent.path(), &Creation::Directory, false)?;
            }
        }

        let backend = &self.context.shared.backend;
        node.locked(&[], || {
            if backend.exists(path) {
                ensure!(!fail_if_exists, ExistsSnafu { path });
                return Ok(());
            }
            let created = match creation {
                Creation::Directory => backend.create_dir(path),
                Creation::File => backend.create_file(path),
                Creation::With(recipe) => recipe(path),
            };
            created.context(IoSnafu { path })?;
            ensure!(backend.exists(path), InitializationSnafu { path });
            debug!("Created {:?} at {}", creation, path.display());

            match node.parent_node() {
                Some(parent) => parent.on_child_added(&node),
                None => Ok(()),
            }
        })?;

        Ok(node)
    }
}

impl fmt::Debug for FsTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsTree")
            .field("config", &self.context.shared.config)
            .field("interned", &self.context.interner.len())
            .finish()
    }
}

fn child_path(parent: &FsNode, relative: &Path) -> Result<PathBuf, NodeError> {
    ensure!(
        !relative.is_absolute() && !relative.as_os_str().is_empty(),
        InvalidPathSnafu { path: relative }
    );
    Ok(normalize_node_path(&parent.path().join(relative)))
}

/// Assembles an [`FsTree`] from its configuration, backend and lock
/// observer.
#[derive(Default)]
pub struct FsTreeBuilder {
    config: FsTreeConfig,
    backend: Option<Arc<dyn Backend>>,
    observer: Option<Arc<dyn LockObserver>>,
}

impl FsTreeBuilder {
    pub fn config(mut self, config: FsTreeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Notified whenever a node lock of the tree is taken or given up.
    pub fn lock_observer(mut self, observer: Arc<dyn LockObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> FsTree {
        let shared = FsShared {
            config: self.config,
            backend: self.backend.unwrap_or_else(|| Arc::new(LocalBackend)),
            observer: self.observer,
        };
        FsTree {
            context: Arc::new(FsContext {
                shared: Arc::new(shared),
                interner: Interner::new(),
            }),
        }
    }
}
