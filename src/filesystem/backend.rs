use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

/// The store filesystem nodes are mirrored onto.
///
/// All operations are fallible and never retried by the caller.
pub trait Backend: Send + Sync {
    /// True for every entry, including dangling symbolic links.
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn is_symlink(&self, path: &Path) -> bool;

    /// Entry names of a directory, in directory order.
    fn list_entries(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// The first entry of a directory that `accept` admits.
    fn first_entry(
        &self,
        path: &Path,
        accept: &mut dyn FnMut(&OsStr) -> bool,
    ) -> io::Result<Option<OsString>> {
        Ok(self
            .list_entries(path)?
            .into_iter()
            .find(|name| accept(name.as_os_str())))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    fn create_file(&self, path: &Path) -> io::Result<()>;

    /// Moves an entry within the store. Must not replace an existing entry.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// The local filesystem through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl Backend for LocalBackend {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn list_entries(&self, path: &Path) -> io::Result<Vec<OsString>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|entry| entry.file_name()))
            .collect()
    }

    fn first_entry(
        &self,
        path: &Path,
        accept: &mut dyn FnMut(&OsStr) -> bool,
    ) -> io::Result<Option<OsString>> {
        for entry in fs::read_dir(path)? {
            let name = entry?.file_name();
            if accept(name.as_os_str()) {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(drop)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.exists(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            ));
        }
        fs::rename(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn creates_and_lists_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backend = LocalBackend;

        backend
            .create_dir(&temp_dir.path().join("dir"))
            .expect("Failed to create dir");
        backend
            .create_file(&temp_dir.path().join("file"))
            .expect("Failed to create file");

        let mut entries = backend
            .list_entries(temp_dir.path())
            .expect("Failed to list");
        entries.sort();
        assert_eq!(entries, vec![OsString::from("dir"), OsString::from("file")]);
        assert!(backend.is_dir(&temp_dir.path().join("dir")));
        assert!(backend.is_file(&temp_dir.path().join("file")));
    }

    #[test]
    fn create_file_refuses_to_truncate() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("file");
        fs::write(&path, "content").expect("Failed to write file");

        let error = LocalBackend
            .create_file(&path)
            .expect_err("existing file must not be recreated");

        assert_eq!(error.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).expect("Failed to read"), "content");
    }

    #[test]
    fn rename_never_replaces() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (from, to) = (temp_dir.path().join("a"), temp_dir.path().join("b"));
        fs::write(&from, "a").expect("Failed to write file");
        fs::write(&to, "b").expect("Failed to write file");

        assert!(LocalBackend.rename(&from, &to).is_err());
        assert_eq!(fs::read_to_string(&to).expect("Failed to read"), "b");
    }

    #[test]
    fn first_entry_skips_rejected_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join(".hidden"), "").expect("Failed to write file");

        let first = LocalBackend
            .first_entry(temp_dir.path(), &mut |name| name != OsStr::new(".hidden"))
            .expect("Failed to read dir");

        assert_eq!(first, None);
    }
}
