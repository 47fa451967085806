//! filesystem abstraction
//!
//! Loading and saving goes through a [FileSystem] handed to [crate::document::Loader] so the same resolution can run
//! against the real filesystem ([OsFs]) or an in-memory one ([MemoryFs]).
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Open a file for reading. Missing files are reported as [io::ErrorKind::NotFound].
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Create (or truncate) a file for writing, including missing parent directories
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Join `path` onto `dir`, an absolute `path` is taken relative to `dir` as well
    fn join(&self, dir: &Path, path: &Path) -> PathBuf {
        clean(&dir.join(relative(path)))
    }
}

/// The real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Box::new(std::fs::File::create(path)?))
    }
}

/// In-memory filesystem
///
/// Paths are cleaned lexically, there are no directories.
#[derive(Debug, Default, Clone)]
pub struct MemoryFs {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(clean(path.as_ref()), contents.into());
    }

    /// Contents of a file
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&clean(path.as_ref()))
            .cloned()
    }
}

impl FileSystem for MemoryFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let contents = self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })?;

        Ok(Box::new(io::Cursor::new(contents)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let path = clean(path);
        self.insert(&path, Vec::new());

        Ok(Box::new(MemoryFile { fs: self, path }))
    }
}

/// Writes straight through to the owning [MemoryFs]
struct MemoryFile<'fs> {
    fs: &'fs MemoryFs,
    path: PathBuf,
}

impl Write for MemoryFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self
            .fs
            .files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        files.entry(self.path.clone()).or_default().extend_from_slice(buf);

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `path` without its root and prefix components
pub fn relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// Lexically normalize a path
///
/// Removes `.` components and resolves `..` against preceding normal components. Leading `..` of relative paths
/// are kept, `..` directly after the root is dropped. The empty path stays empty.
pub fn clean(path: &Path) -> PathBuf {
    let mut cleaned: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.last() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(component),
            },
            component => cleaned.push(component),
        }
    }

    cleaned.iter().collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_paths() {
        let cases = [
            ("a/b/../c", "a/c"),
            ("./a/./b", "a/b"),
            ("a/../../b", "../b"),
            ("/../a", "/a"),
            ("fixtures/import/../import/foo.yaml", "fixtures/import/foo.yaml"),
            ("", ""),
        ];

        for (input, expected) in cases {
            assert_eq!(clean(Path::new(input)), PathBuf::from(expected), "{input}");
        }
    }

    #[test]
    fn join() {
        assert_eq!(
            OsFs.join(Path::new("fixtures/import"), Path::new("folder/../qux.yaml")),
            PathBuf::from("fixtures/import/qux.yaml")
        );
        assert_eq!(
            OsFs.join(Path::new(""), Path::new("foo.yaml")),
            PathBuf::from("foo.yaml")
        );
        assert_eq!(
            MemoryFs::new().join(Path::new("conf"), Path::new("/lib/a.yaml")),
            PathBuf::from("conf/lib/a.yaml")
        );
        assert_eq!(
            OsFs.join(Path::new("out"), Path::new("../escaped.yaml")),
            PathBuf::from("escaped.yaml")
        );
    }

    #[test]
    fn memory_fs_round_trip() {
        let fs = MemoryFs::new();
        {
            let mut file = fs.create(Path::new("out/./a.yaml")).unwrap();
            file.write_all(b"hello ").unwrap();
            file.write_all(b"world").unwrap();
        }

        let mut contents = String::new();
        fs.open(Path::new("out/a.yaml"))
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "hello world");
    }

    #[test]
    fn memory_fs_not_found() {
        let err = MemoryFs::new().open(Path::new("missing.yaml")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn memory_fs_is_shared_between_clones() {
        let fs = MemoryFs::new();
        fs.clone().insert("a", "1");
        assert_eq!(fs.get("a"), Some(b"1".to_vec()));
    }

    #[test]
    fn os_fs_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/file.yaml");

        OsFs.create(&path).unwrap().write_all(b"x: 1").unwrap();

        let mut contents = String::new();
        OsFs.open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "x: 1");
    }
}
