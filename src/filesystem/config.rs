/// How directory listings are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Listing {
    /// Every `children()` call reads the directory again.
    #[default]
    Live,
    /// A directory is read once; moves, renames and creations through the
    /// tree keep the listing current until [`FsNode::refresh`] drops it.
    ///
    /// [`FsNode::refresh`]: crate::filesystem::FsNode::refresh
    Cached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsTreeConfig {
    pub listing: Listing,
    /// List entries whose name starts with a dot.
    pub include_hidden: bool,
    /// List symbolic links.
    pub include_symlinks: bool,
    /// Order children by name instead of directory order.
    pub sort_entries: bool,
}

impl Default for FsTreeConfig {
    fn default() -> Self {
        Self {
            listing: Listing::Live,
            include_hidden: true,
            include_symlinks: true,
            sort_entries: true,
        }
    }
}
