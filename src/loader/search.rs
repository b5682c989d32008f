//! Module search algorithm (§4.4 "Search algorithm for module name `m`").

use std::path::{Path, PathBuf};

use log::warn;

use crate::errors::{HostError, HostResult};
use crate::loader::source::ModuleSource;

/// Filename base: everything before the first `.` (§6.1).
pub fn base_name(filename: &str) -> &str {
    filename.split('.').next().unwrap_or(filename)
}

/// Search `dirs` in order for a module named `name`. `dirs` is expected to
/// already be `[local, ...GLAS_PATH...]` (§4.4 step 2) — building that list
/// is the caller's job since it depends on the current `Loading` state.
///
/// Returns `Ok(None)` (after logging a warning) if no directory has a match,
/// `Ok(Some(path))` for exactly one match, or `Err(HostError::Ambiguous)` if
/// a directory has more than one.
pub fn search(source: &dyn ModuleSource, dirs: &[PathBuf], name: &str) -> HostResult<Option<PathBuf>> {
    for dir in dirs {
        let mut matches: Vec<PathBuf> = source
            .list_dir(dir)
            .into_iter()
            .filter(|filename| base_name(filename) == name)
            .map(|filename| dir.join(filename))
            .collect();

        let sub = dir.join(name);
        matches.extend(
            source
                .list_dir(&sub)
                .into_iter()
                .filter(|filename| base_name(filename) == "public")
                .map(|filename| sub.join(filename)),
        );

        match matches.len() {
            0 => continue,
            1 => return Ok(Some(matches.remove(0))),
            _ => {
                return Err(HostError::Ambiguous { name: name.to_string(), candidates: matches });
            }
        }
    }
    warn!("{}", HostError::NotFound(name.to_string()));
    Ok(None)
}

/// Build the search path for the current load state (§4.4 steps 1-2):
/// the directory of the file at the top of `loading`, or `working_dir` if
/// empty, followed by the configured `GLAS_PATH` directories.
pub fn build_search_path(loading: &[PathBuf], working_dir: &Path, glas_path: &[PathBuf]) -> Vec<PathBuf> {
    let local = loading
        .last()
        .and_then(|fp| fp.parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| working_dir.to_path_buf());
    let mut dirs = vec![local];
    dirs.extend(glas_path.iter().cloned());
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::source::MemorySource;

    #[test]
    fn finds_unique_direct_match() {
        let src = MemorySource::new().with_file("/mods/foo.g0", b"x".to_vec());
        let hit = search(&src, &[PathBuf::from("/mods")], "foo").unwrap();
        assert_eq!(hit, Some(PathBuf::from("/mods/foo.g0")));
    }

    #[test]
    fn finds_public_file_in_subdirectory() {
        let src = MemorySource::new().with_file("/mods/foo/public.g0", b"x".to_vec());
        let hit = search(&src, &[PathBuf::from("/mods")], "foo").unwrap();
        assert_eq!(hit, Some(PathBuf::from("/mods/foo/public.g0")));
    }

    #[test]
    fn ambiguous_when_two_matches_in_same_directory() {
        let src = MemorySource::new()
            .with_file("/mods/foo.g0", b"x".to_vec())
            .with_file("/mods/foo.x.g0", b"y".to_vec());
        let err = search(&src, &[PathBuf::from("/mods")], "foo").unwrap_err();
        assert!(matches!(err, HostError::Ambiguous { .. }));
    }

    #[test]
    fn falls_through_to_later_directory_when_earlier_has_no_match() {
        let src = MemorySource::new().with_file("/b/foo.g0", b"x".to_vec());
        let hit = search(&src, &[PathBuf::from("/a"), PathBuf::from("/b")], "foo").unwrap();
        assert_eq!(hit, Some(PathBuf::from("/b/foo.g0")));
    }

    #[test]
    fn not_found_anywhere_is_none_not_error() {
        let src = MemorySource::new();
        let hit = search(&src, &[PathBuf::from("/mods")], "foo").unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn search_path_uses_local_file_directory_then_glas_path() {
        let loading = vec![PathBuf::from("/proj/main.g0")];
        let dirs = build_search_path(&loading, Path::new("/cwd"), &[PathBuf::from("/lib")]);
        assert_eq!(dirs, vec![PathBuf::from("/proj"), PathBuf::from("/lib")]);
    }

    #[test]
    fn search_path_falls_back_to_working_dir_when_loading_empty() {
        let dirs = build_search_path(&[], Path::new("/cwd"), &[PathBuf::from("/lib")]);
        assert_eq!(dirs, vec![PathBuf::from("/cwd"), PathBuf::from("/lib")]);
    }
}
