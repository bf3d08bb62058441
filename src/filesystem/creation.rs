use std::fmt;
use std::io;
use std::path::Path;

type Recipe = Box<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

/// What to put on disk when a node is created.
pub enum Creation {
    Directory,
    /// An empty file.
    File,
    /// A caller-supplied recipe, called with the normalized path. The entry
    /// must exist afterwards.
    With(Recipe),
}

impl Creation {
    pub fn with(recipe: impl Fn(&Path) -> io::Result<()> + Send + Sync + 'static) -> Self {
        Creation::With(Box::new(recipe))
    }
}

impl fmt::Debug for Creation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Creation::Directory => f.write_str("Directory"),
            Creation::File => f.write_str("File"),
            Creation::With(_) => f.write_str("With(<recipe>)"),
        }
    }
}
