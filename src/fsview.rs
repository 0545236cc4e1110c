//! Read-only filesystem view.
//!
//! The detector and the filesystem-probe backends classify observed
//! filesystem facts; injecting the view keeps them pure and lets tests
//! run against an in-memory fake instead of a live init system.

use std::io;
use std::path::Path;

pub trait FsView {
    /// Whether anything exists at `path` (file, directory or symlink
    /// target).
    fn path_exists(&self, path: &Path) -> bool;

    /// Read the file at `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The live filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FsView for RealFs {
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}


#[cfg(test)]
pub mod fake {
    use super::FsView;
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::path::{Path, PathBuf};

    /// In-memory filesystem for backend and detector tests.
    #[derive(Debug, Default)]
    pub struct FakeFs {
        files: HashMap<PathBuf, String>,
        paths: HashSet<PathBuf>,
    }

    impl FakeFs {
        pub fn new() -> Self {
            FakeFs::default()
        }

        /// Register a path as present without content (marker files,
        /// directories, /proc entries).
        pub fn touch(&mut self, path: &str) -> &mut Self {
            self.paths.insert(PathBuf::from(path));
            self
        }

        /// Register a readable file with content.
        pub fn write(&mut self, path: &str, content: &str) -> &mut Self {
            self.files.insert(PathBuf::from(path), content.to_string());
            self.paths.insert(PathBuf::from(path));
            self
        }
    }

    impl FsView for FakeFs {
        fn path_exists(&self, path: &Path) -> bool {
            self.paths.contains(path)
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }
}
