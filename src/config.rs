//! Loader configuration (§2.1 component K, §4.4, §6.1).
//!
//! Mirrors the teacher's `ExecutorConfig` shape: an explicit struct with a
//! `Default` impl, constructed once and handed to the thing it configures
//! rather than read ad hoc from the environment deep inside the loader.

use std::env;
use std::path::PathBuf;

/// Configuration for [`crate::loader::Loader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directories scanned after the local directory, in order (§4.4 step 2).
    /// Populated from `GLAS_PATH` by [`LoaderConfig::from_env`], or set
    /// explicitly for embedding/testing.
    pub search_path: Vec<PathBuf>,
    /// Working directory used as the local directory when `Loading` is
    /// empty (§4.4 step 1).
    pub working_dir: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            search_path: Vec::new(),
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl LoaderConfig {
    /// Build a config from the process environment: `GLAS_PATH`, split on
    /// `;` (§6.1), and the actual process working directory.
    pub fn from_env() -> Self {
        let search_path = env::var("GLAS_PATH")
            .map(|raw| raw.split(';').filter(|s| !s.is_empty()).map(PathBuf::from).collect())
            .unwrap_or_default();
        LoaderConfig {
            search_path,
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Override the search path explicitly (for embedding/testing), keeping
    /// the rest of the config as-is.
    pub fn with_search_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_path = dirs;
        self
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_search_path_is_empty() {
        let cfg = LoaderConfig::default();
        assert!(cfg.search_path.is_empty());
    }

    #[test]
    fn with_search_path_overrides() {
        let cfg = LoaderConfig::default().with_search_path(vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(cfg.search_path, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }
}
