//! Logical request path -> local working-copy dir / repository URL.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::{RepoPath, to_windows_path};

#[derive(Clone, Debug)]
pub struct Workspace {
    svn_root: String,
    svn_root_dir: PathBuf,
    windows_paths: bool,
}

impl Workspace {
    pub fn new(svn_root: impl Into<String>, svn_root_dir: impl Into<PathBuf>, windows_paths: bool) -> Self {
        Self {
            svn_root: svn_root.into(),
            svn_root_dir: svn_root_dir.into(),
            windows_paths,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.svn_root.clone(),
            config.svn_root_dir.clone(),
            config.windows_paths,
        )
    }

    pub fn root_dir(&self) -> &Path {
        &self.svn_root_dir
    }

    /// Local working-copy dir for `path`. `os_sensitive` operations get the
    /// Windows form when the agent is configured for it.
    pub fn svn_dir(&self, path: &RepoPath, os_sensitive: bool) -> PathBuf {
        let dir = self.svn_root_dir.join(path.relative());
        if os_sensitive && self.windows_paths {
            return PathBuf::from(to_windows_path(&dir.to_string_lossy()));
        }
        dir
    }

    pub fn svn_url(&self, path: &RepoPath) -> String {
        format!("{}{}", self.svn_root.trim_end_matches('/'), path)
    }

    pub fn is_working_copy(&self, dir: &Path) -> bool {
        dir.join(".svn").is_dir()
    }
}
