//! Global agent lock.
//!
//! One named lock file under the configured root serializes every
//! lock-required operation across all agent processes on the host.
//! Acquisition never waits: a held lock is reported immediately and the
//! caller decides when to retry. The lock is an advisory `flock` on the
//! file (via `fs2`), so the OS drops it when a holder dies and no stale
//! lock detection is needed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Effect, Transience};

/// Diagnostics written into the lock file by the current holder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMeta {
    pub pid: u32,
    pub started_at_ms: u64,
    pub action: String,
}

impl LockMeta {
    fn new(action: &str) -> Self {
        Self {
            pid: std::process::id(),
            started_at_ms: wall_ms(),
            action: action.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("agent lock already held at {path:?}")]
    Held {
        path: Box<PathBuf>,
        meta: Option<Box<LockMeta>>,
    },
    #[error("invalid lock name {name:?}")]
    InvalidName { name: String },
    #[error("lock path is a symlink: {path:?}")]
    Symlink { path: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl LockError {
    pub fn transience(&self) -> Transience {
        match self {
            LockError::Held { .. } => Transience::Retryable,
            LockError::InvalidName { .. } | LockError::Symlink { .. } => Transience::Permanent,
            LockError::Io(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// Hands out the single named lock.
#[derive(Clone, Debug)]
pub struct LockCoordinator {
    root: PathBuf,
    name: String,
}

impl LockCoordinator {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{}.lock", self.name))
    }

    /// Zero-wait acquisition attempt on behalf of `action`.
    pub fn try_acquire(&self, action: &str) -> Result<AgentLock, LockError> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) || self.name.starts_with('.')
        {
            return Err(LockError::InvalidName {
                name: self.name.clone(),
            });
        }
        fs::create_dir_all(&self.root)?;

        let path = self.path();
        reject_symlink(&path)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if let Err(err) = file.try_lock_exclusive() {
            if is_contended(&err) {
                let meta = read_metadata(&path).map(Box::new);
                return Err(LockError::Held {
                    path: Box::new(path),
                    meta,
                });
            }
            return Err(LockError::Io(err));
        }

        let meta = LockMeta::new(action);
        write_metadata(&mut file, &meta)?;

        Ok(AgentLock {
            file,
            path,
            meta,
            released: false,
        })
    }
}

/// A held agent lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct AgentLock {
    file: File,
    path: PathBuf,
    meta: LockMeta,
    released: bool,
}

impl AgentLock {
    pub fn meta(&self) -> &LockMeta {
        &self.meta
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        FileExt::unlock(&self.file)?;
        Ok(())
    }
}

impl Drop for AgentLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = FileExt::unlock(&self.file);
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn reject_symlink(path: &Path) -> Result<(), LockError> {
    if let Ok(meta) = fs::symlink_metadata(path)
        && meta.file_type().is_symlink()
    {
        return Err(LockError::Symlink {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn read_metadata(path: &Path) -> Option<LockMeta> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn write_metadata(file: &mut File, meta: &LockMeta) -> Result<(), LockError> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    serde_json::to_writer(&mut *file, meta).map_err(io::Error::from)?;
    file.flush()?;
    Ok(())
}

fn wall_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    #[test]
    fn acquire_release_reacquire() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockCoordinator::new(dir.path(), "svn-agent");

        let lock = locks.try_acquire("update").unwrap();
        assert!(lock.path().exists());
        assert_eq!(lock.meta().pid, std::process::id());
        lock.release().unwrap();

        let _again = locks.try_acquire("commit").unwrap();
    }

    #[test]
    fn second_attempt_is_denied_without_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockCoordinator::new(dir.path(), "svn-agent");
        let _held = locks.try_acquire("update").unwrap();

        let err = locks.try_acquire("commit").unwrap_err();
        match err {
            LockError::Held { meta, .. } => {
                assert_eq!(meta.map(|m| m.action), Some("update".to_string()));
            }
            other => panic!("expected Held, got {other:?}"),
        }
    }

    #[test]
    fn drop_releases() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockCoordinator::new(dir.path(), "svn-agent");
        {
            let _lock = locks.try_acquire("update").unwrap();
        }
        assert!(locks.try_acquire("update").is_ok());
    }

    #[test]
    fn distinct_names_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let _a = LockCoordinator::new(dir.path(), "a").try_acquire("x").unwrap();
        let _b = LockCoordinator::new(dir.path(), "b").try_acquire("x").unwrap();
    }

    #[test]
    fn rejects_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", "../x", ".hidden"] {
            let err = LockCoordinator::new(dir.path(), name)
                .try_acquire("x")
                .unwrap_err();
            assert!(matches!(err, LockError::InvalidName { .. }), "{name}");
        }
    }

    #[test]
    fn concurrent_holders_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockCoordinator::new(dir.path(), "svn-agent");
        let barrier = Arc::new(Barrier::new(2));

        let held = locks.try_acquire("update").unwrap();
        let other = locks.clone();
        let b = barrier.clone();
        let handle = std::thread::spawn(move || {
            let denied = matches!(other.try_acquire("commit"), Err(LockError::Held { .. }));
            b.wait();
            b.wait();
            let granted = other.try_acquire("commit").is_ok();
            (denied, granted)
        });

        barrier.wait();
        held.release().unwrap();
        std::thread::sleep(Duration::from_millis(10));
        barrier.wait();

        let (denied, granted) = handle.join().unwrap();
        assert!(denied, "second holder must be denied while the first holds");
        assert!(granted, "lock must be available after release");
    }
}
