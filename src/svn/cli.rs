use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{Executor, SvnCommand, ToolError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs the real `svn` binary.
#[derive(Clone, Debug)]
pub struct SvnCli {
    program: PathBuf,
}

impl SvnCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn spawn(&self, command: &SvnCommand) -> Result<Child, ToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(command.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Messages are parsed; keep them in English.
            .env_remove("LC_ALL")
            .env("LC_MESSAGES", "C");
        if let Some(dir) = command.cwd() {
            cmd.current_dir(dir);
        }
        cmd.spawn().map_err(|source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

impl Default for SvnCli {
    fn default() -> Self {
        Self::new("svn")
    }
}

impl Executor for SvnCli {
    fn run(&self, command: &SvnCommand, timeout: Duration) -> Result<String, ToolError> {
        tracing::debug!(%command, timeout_secs = timeout.as_secs(), "running svn");
        let mut child = ChildGuard::new(self.spawn(command)?);
        let stdout = drain(child.inner().stdout.take());
        let stderr = drain(child.inner().stderr.take());

        let status = match wait_with_deadline(child.inner(), timeout)? {
            Some(status) => {
                child.disarm();
                status
            }
            None => {
                drop(child);
                tracing::warn!(%command, timeout_secs = timeout.as_secs(), "svn timed out");
                return Err(ToolError::TimedOut {
                    secs: timeout.as_secs(),
                });
            }
        };

        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        if status.success() {
            return Ok(stdout);
        }

        let message = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("svn {} exited with {status}", command.subcommand()));
        Err(ToolError::failed(status.code(), message))
    }
}

/// Kills and reaps the child unless it was seen to exit. Covers early
/// returns and unwinding, so no `svn` outlives the lock it ran under.
struct ChildGuard {
    child: Child,
    exited: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            exited: false,
        }
    }

    fn inner(&mut self) -> &mut Child {
        &mut self.child
    }

    fn disarm(&mut self) {
        self.exited = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.exited {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// `None` once the deadline passes. A timeout too large to represent
/// as an instant means no deadline.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>, ToolError> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

type Drain = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Drain) -> Result<String, ToolError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("svn output reader panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("svn");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn returns_stdout_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let svn = SvnCli::new(script(dir.path(), "echo \"$1 ok\""));
        let out = svn
            .run(&SvnCommand::new("info"), Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.trim(), "info ok");
    }

    #[test]
    fn failure_prefers_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let svn = SvnCli::new(script(
            dir.path(),
            "echo partial; echo 'svn: E170013: Unable to connect' >&2; exit 1",
        ));
        let err = svn
            .run(&SvnCommand::new("mkdir"), Duration::from_secs(5))
            .unwrap_err();
        match err {
            ToolError::Failed { status, message } => {
                assert_eq!(status, Some(1));
                assert_eq!(message, "svn: E170013: Unable to connect");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn silent_failure_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let svn = SvnCli::new(script(dir.path(), "exit 3"));
        let err = svn
            .run(&SvnCommand::new("add"), Duration::from_secs(5))
            .unwrap_err();
        assert!(err.to_string().starts_with("svn add exited with"));
    }

    #[test]
    fn kills_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let svn = SvnCli::new(script(dir.path(), "exec sleep 5"));
        let start = Instant::now();
        let err = svn
            .run(&SvnCommand::new("update"), Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn unrepresentable_timeout_waits_for_exit() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let svn = SvnCli::new(script(
            dir.path(),
            &format!("sleep 1; touch '{}'; echo done", marker.display()),
        ));
        let out = svn
            .run(&SvnCommand::new("mkdir"), Duration::from_secs(u64::MAX))
            .unwrap();
        assert_eq!(out.trim(), "done");
        assert!(marker.exists(), "child must finish before run returns");
    }

    #[test]
    fn dropped_guard_kills_running_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(format!("sleep 1; touch '{}'", marker.display()))
            .spawn()
            .unwrap();
        drop(ChildGuard::new(child));
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let svn = SvnCli::new("/definitely/not/here/svn");
        let err = svn
            .run(&SvnCommand::new("info"), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
