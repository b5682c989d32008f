//! `ModuleSource` (§2.1 component M, §4.4 "Filesystem abstraction"): an
//! injectable "read a file / list a directory" capability so the loader
//! and the bootstrap driver can run against a real filesystem or an
//! in-memory fixture without the loader ever knowing which.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{HostError, HostResult};

pub trait ModuleSource {
    /// Read a file's raw bytes.
    fn read(&self, path: &Path) -> HostResult<Vec<u8>>;

    /// List the filenames (not full paths) directly inside `dir`. An empty
    /// result (not an error) for a directory that doesn't exist, matching
    /// the search algorithm's "no matches here, keep looking" behavior.
    fn list_dir(&self, dir: &Path) -> Vec<String>;
}

/// The production backend: real files on a real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl ModuleSource for FsSource {
    fn read(&self, path: &Path) -> HostResult<Vec<u8>> {
        std::fs::read(path).map_err(|source| HostError::Io { path: path.to_path_buf(), source })
    }

    fn list_dir(&self, dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }
}

/// An in-memory filesystem fixture (§4.4 ambient addition), used by tests
/// and the bootstrap driver's self-contained demonstration harness.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource { files: BTreeMap::new() }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), bytes.into());
        self
    }
}

impl ModuleSource for MemorySource {
    fn read(&self, path: &Path) -> HostResult<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| HostError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in MemorySource"),
        })
    }

    fn list_dir(&self, dir: &Path) -> Vec<String> {
        self.files
            .keys()
            .filter_map(|path| {
                if path.parent() == Some(dir) {
                    path.file_name().and_then(|n| n.to_str()).map(str::to_owned)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_reads_back_written_file() {
        let src = MemorySource::new().with_file("/mods/foo.g0", b"hello".to_vec());
        assert_eq!(src.read(Path::new("/mods/foo.g0")).unwrap(), b"hello");
    }

    #[test]
    fn memory_source_missing_file_is_io_error() {
        let src = MemorySource::new();
        assert!(matches!(src.read(Path::new("/nope")), Err(HostError::Io { .. })));
    }

    #[test]
    fn memory_source_lists_direct_children_only() {
        let src = MemorySource::new()
            .with_file("/mods/foo.g0", b"a".to_vec())
            .with_file("/mods/bar.g0", b"b".to_vec())
            .with_file("/mods/sub/baz.g0", b"c".to_vec());
        let mut names = src.list_dir(Path::new("/mods"));
        names.sort();
        assert_eq!(names, vec!["bar.g0".to_string(), "foo.g0".to_string()]);
    }
}
