use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use snafu::prelude::*;
use tracing::{debug, trace};

use crate::ext::is_single_component;
use crate::filesystem::Listing;
use crate::filesystem::tree::{FsContext, FsShared};
use crate::lock::{LockSet, NodeLock};
use crate::node::{
    CannotDetachSnafu, Children, ExistsSnafu, InvalidPathSnafu, IoSnafu, Node,
    NodeError, NodeExt, NodeId, NotADirectorySnafu, Relations, TreeDroppedSnafu,
};

/// A node standing for one path of the backing store.
///
/// The path is not stored: it is the parent's path joined with the node's
/// name, so moving a directory moves every node below it as well. Roots of
/// the store (`/`, a drive) carry their whole path as name.
pub struct FsNode {
    id: NodeId,
    this: Weak<FsNode>,
    context: Weak<FsContext>,
    shared: Arc<FsShared>,
    parent: Mutex<Option<Arc<FsNode>>>,
    name: Mutex<OsString>,
    lock: NodeLock,
    relations: Relations<FsNode>,
    /// Accepted entry names, only used with [`Listing::Cached`].
    listing: Mutex<Option<Vec<OsString>>>,
}

impl FsNode {
    pub(super) fn new(context: &Arc<FsContext>, parent: Option<Arc<FsNode>>, name: OsString) -> Arc<Self> {
        let id = NodeId::next();
        trace!("New filesystem node {} named {:?}", id, name);
        Arc::new_cyclic(|this| Self {
            id,
            this: Weak::clone(this),
            context: Arc::downgrade(context),
            shared: Arc::clone(&context.shared),
            parent: Mutex::new(parent),
            name: Mutex::new(name),
            lock: NodeLock::new(id),
            relations: Relations::default(),
            listing: Mutex::new(None),
        })
    }

    pub fn name(&self) -> OsString {
        self.name.lock().clone()
    }

    pub fn path(&self) -> PathBuf {
        let name = self.name();
        match self.parent_node() {
            Some(parent) => parent.path().join(name),
            None => PathBuf::from(name),
        }
    }

    pub fn exists(&self) -> bool {
        self.shared.backend.exists(&self.path())
    }

    pub fn is_dir(&self) -> bool {
        self.shared.backend.is_dir(&self.path())
    }

    pub fn is_file(&self) -> bool {
        self.shared.backend.is_file(&self.path())
    }

    pub fn node_lock(&self) -> &NodeLock {
        &self.lock
    }

    /// Renames the entry in place, keeping the parent.
    ///
    /// `name` must be a single path component. On failure the node keeps
    /// its previous name.
    pub fn rename(&self, name: impl AsRef<OsStr>) -> Result<(), NodeError> {
        let name = name.as_ref();
        ensure!(
            is_single_component(Path::new(name)),
            InvalidPathSnafu { path: name }
        );
        let context = self.context()?;

        self.locked(&[], || {
            let old_path = self.path();
            let parent = self.parent_node().context(InvalidPathSnafu { path: &old_path })?;
            let new_path = parent.path().join(name);
            if new_path == old_path {
                return Ok(());
            }
            ensure!(!self.shared.backend.exists(&new_path), ExistsSnafu { path: &new_path });

            let old_name = std::mem::replace(&mut *self.name.lock(), name.to_owned());
            if let Err(error) = self.shared.backend.rename(&old_path, &new_path) {
                *self.name.lock() = old_name;
                return Err(error).context(IoSnafu { path: old_path });
            }

            let relocated = context.relocate(&old_path, &new_path);
            parent.replace_listed(&old_name, name);
            debug!(
                "Renamed {} to {}, {} nodes relocated",
                old_path.display(),
                new_path.display(),
                relocated
            );
            Ok(())
        })
    }

    /// Removes the backing entry, recursively for directories.
    ///
    /// Interned nodes below this one are left in place and go stale.
    pub fn delete(&self) -> Result<(), NodeError> {
        self.locked(&[], || -> Result<(), NodeError> {
            let path = self.path();
            let removed = if self.shared.backend.is_dir(&path) {
                self.shared.backend.remove_dir_all(&path)
            } else {
                self.shared.backend.remove_file(&path)
            };
            removed.context(IoSnafu { path: &path })?;
            if let Some(parent) = self.parent_node() {
                parent.forget_listed(&self.name());
            }
            debug!("Deleted {}", path.display());
            Ok(())
        })
    }

    /// Drops the cached listing; the next `children()` reads the directory.
    pub fn refresh(&self) {
        if self.listing.lock().take().is_some() {
            trace!("Dropped cached listing of {}", self.id);
        }
    }

    /// Runs `critical` while holding the locks of this node, its ancestors
    /// and the ancestor chains of `others`.
    ///
    /// The chains are computed again once all locks are held; if a
    /// concurrent move changed them in between, the locks are given up and
    /// the acquisition starts over.
    pub fn locked<R>(&self, others: &[&Arc<FsNode>], critical: impl FnOnce() -> R) -> R {
        loop {
            let chain = self.lock_chain(others);
            let locks = LockSet::acquire(
                iter::once(&self.lock).chain(chain.iter().map(|node| &node.lock)),
                self.shared.observer.clone(),
            );
            if chain_ids(&self.lock_chain(others)) == chain_ids(&chain) {
                let result = critical();
                drop(locks);
                return result;
            }
            trace!("Ancestors of {} changed while locking, retrying", self.id);
        }
    }

    fn lock_chain(&self, others: &[&Arc<FsNode>]) -> Vec<Arc<FsNode>> {
        let mut chain: Vec<Arc<FsNode>> = self
            .parent_node()
            .map(|parent| parent.ancestors(true).collect())
            .unwrap_or_default();
        for other in others {
            chain.extend(other.ancestors(true));
        }
        chain
    }

    fn context(&self) -> Result<Arc<FsContext>, NodeError> {
        self.context
            .upgrade()
            .with_context(|| TreeDroppedSnafu { path: self.path() })
    }

    fn handle(&self) -> Result<Arc<FsNode>, NodeError> {
        self.this
            .upgrade()
            .with_context(|| TreeDroppedSnafu { path: self.path() })
    }

    fn accepts(&self, directory: &Path, name: &OsStr) -> bool {
        let config = &self.shared.config;
        (config.include_hidden || !name.to_string_lossy().starts_with('.'))
            && (config.include_symlinks || !self.shared.backend.is_symlink(&directory.join(name)))
    }

    /// Accepted entry names, from the cache if there is one.
    fn entry_names(&self) -> Result<Vec<OsString>, NodeError> {
        if let Some(names) = self.listing.lock().as_ref() {
            return Ok(names.clone());
        }

        let path = self.path();
        let backend = &self.shared.backend;
        let names: Vec<OsString> = if backend.is_dir(&path) {
            backend
                .list_entries(&path)
                .context(IoSnafu { path: &path })?
                .into_iter()
                .filter(|name| self.accepts(&path, name))
                .collect()
        } else if backend.exists(&path) {
            Vec::new()
        } else {
            return InvalidPathSnafu { path }.fail();
        };

        if self.shared.config.listing == Listing::Cached {
            *self.listing.lock() = Some(names.clone());
        }
        Ok(names)
    }

    fn replace_listed(&self, old: &OsStr, new: &OsStr) {
        if let Some(names) = self.listing.lock().as_mut() {
            names.retain(|name| name != old);
            names.push(new.to_owned());
        }
    }

    fn forget_listed(&self, name: &OsStr) {
        if let Some(names) = self.listing.lock().as_mut() {
            names.retain(|listed| listed != name);
        }
    }
}

fn chain_ids(chain: &[Arc<FsNode>]) -> HashSet<NodeId> {
    chain.iter().map(|node| node.id).collect()
}

impl Node for FsNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn relations(&self) -> &Relations<Self> {
        &self.relations
    }

    fn parent_node(&self) -> Option<Arc<Self>> {
        self.parent.lock().clone()
    }

    /// Moves the backing entry into `parent`. Runs under the locks taken by
    /// [`structural_scope`](Node::structural_scope).
    fn replace_parent(&self, parent: Option<&Arc<Self>>) -> Result<(), NodeError> {
        let old_path = self.path();
        let parent = parent.context(CannotDetachSnafu { path: &old_path })?;
        let context = self.context()?;

        let parent_path = parent.path();
        ensure!(
            self.shared.backend.exists(&parent_path),
            InvalidPathSnafu { path: &parent_path }
        );
        ensure!(
            self.shared.backend.is_dir(&parent_path),
            NotADirectorySnafu { path: &parent_path }
        );
        let new_path = parent_path.join(self.name());
        ensure!(
            !parent.ancestors(true).any(|ancestor| ancestor.id == self.id),
            InvalidPathSnafu { path: &new_path }
        );
        ensure!(!self.shared.backend.exists(&new_path), ExistsSnafu { path: &new_path });

        self.shared
            .backend
            .rename(&old_path, &new_path)
            .context(IoSnafu { path: &old_path })?;
        *self.parent.lock() = Some(Arc::clone(parent));
        let relocated = context.relocate(&old_path, &new_path);
        debug!(
            "Moved {} to {}, {} nodes relocated",
            old_path.display(),
            new_path.display(),
            relocated
        );
        Ok(())
    }

    fn children(&self) -> Result<Children<Self>, NodeError> {
        self.locked(&[], || -> Result<Children<Self>, NodeError> {
            let context = self.context()?;
            let this = self.handle()?;
            let mut names = self.entry_names()?;
            if self.shared.config.sort_entries {
                names.sort();
            }
            let children: Vec<Arc<FsNode>> = names
                .iter()
                .map(|name| context.child_of(&this, name))
                .collect();
            Ok(Box::new(children.into_iter()))
        })
    }

    fn has_children(&self) -> Result<bool, NodeError> {
        self.locked(&[], || {
            if let Some(names) = self.listing.lock().as_ref() {
                return Ok(!names.is_empty());
            }
            let path = self.path();
            let backend = &self.shared.backend;
            if backend.is_dir(&path) {
                backend
                    .first_entry(&path, &mut |name| self.accepts(&path, name))
                    .map(|first| first.is_some())
                    .context(IoSnafu { path: &path })
            } else if backend.exists(&path) {
                Ok(false)
            } else {
                InvalidPathSnafu { path }.fail()
            }
        })
    }

    fn on_child_added(&self, child: &Arc<Self>) -> Result<(), NodeError> {
        if let Some(names) = self.listing.lock().as_mut() {
            let name = child.name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(())
    }

    fn on_child_removed(&self, child: &Arc<Self>) -> Result<(), NodeError> {
        self.forget_listed(&child.name());
        Ok(())
    }

    fn structural_scope<R>(
        &self,
        parent: Option<&Arc<Self>>,
        mutation: impl FnOnce() -> Result<R, NodeError>,
    ) -> Result<R, NodeError> {
        let others: Vec<&Arc<FsNode>> = parent.into_iter().collect();
        self.locked(&others, mutation)
    }
}

impl fmt::Display for FsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_string_lossy())
    }
}

impl fmt::Debug for FsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsNode")
            .field("id", &self.id)
            .field("path", &self.path())
            .field("relations", &self.relations)
            .finish()
    }
}
