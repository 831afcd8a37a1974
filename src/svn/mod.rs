//! External version-control tool.
//!
//! The agent never links against Subversion; it shells out. Everything
//! the rest of the crate needs is behind [`Executor`], so operation logic
//! can be driven by a scripted double in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::Credentials;
use crate::error::{Effect, Transience};

mod cli;
pub mod output;
#[cfg(test)]
pub(crate) mod testing;

pub use cli::SvnCli;

/// Runs one tool invocation to completion (or timeout) and returns stdout.
pub trait Executor: Send + Sync {
    fn run(&self, command: &SvnCommand, timeout: Duration) -> Result<String, ToolError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn run(&self, command: &SvnCommand, timeout: Duration) -> Result<String, ToolError> {
        (**self).run(command, timeout)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn run(&self, command: &SvnCommand, timeout: Duration) -> Result<String, ToolError> {
        (**self).run(command, timeout)
    }
}

/// One `svn <subcommand> ...` invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct SvnCommand {
    subcommand: String,
    args: Vec<String>,
    targets: Vec<String>,
    credentials: Option<Credentials>,
    cwd: Option<PathBuf>,
}

impl SvnCommand {
    pub fn new(subcommand: impl Into<String>) -> Self {
        Self {
            subcommand: subcommand.into(),
            args: Vec::new(),
            targets: Vec::new(),
            credentials: None,
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working-copy targets taken verbatim from tool output. They go last,
    /// after `--`, each with a trailing `@` so a leading `-` is never an
    /// option and an `@` in the name is never a peg revision.
    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets
            .extend(targets.into_iter().map(|target| format!("{}@", target.into())));
        self
    }

    pub fn path(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Authenticate non-interactively without caching the password.
    pub fn auth(mut self, credentials: &Credentials) -> Self {
        self.credentials = Some(credentials.clone());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn subcommand(&self) -> &str {
        &self.subcommand
    }

    pub fn target_args(&self) -> &[String] {
        &self.targets
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Full argv after the program name.
    pub fn to_args(&self) -> Vec<String> {
        let mut argv = vec![self.subcommand.clone()];
        argv.extend(self.args.iter().cloned());
        if let Some(creds) = &self.credentials {
            argv.extend([
                "--non-interactive".to_string(),
                "--no-auth-cache".to_string(),
                "--username".to_string(),
                creds.username.clone(),
                "--password".to_string(),
                creds.password.clone(),
            ]);
        }
        if !self.targets.is_empty() {
            argv.push("--".to_string());
            argv.extend(self.targets.iter().cloned());
        }
        argv
    }
}

impl fmt::Display for SvnCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "svn {}", self.subcommand)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(creds) = &self.credentials {
            write!(f, " --username {} --password ***", creds.username)?;
        }
        if !self.targets.is_empty() {
            f.write_str(" --")?;
            for target in &self.targets {
                write!(f, " {target}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SvnCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SvnCommand({self})")
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolError {
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Failed { status: Option<i32>, message: String },

    #[error("svn timed out after {secs}s")]
    TimedOut { secs: u64 },

    #[error("io error while talking to svn: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn failed(status: Option<i32>, message: impl Into<String>) -> Self {
        ToolError::Failed {
            status,
            message: message.into(),
        }
    }

    /// Text safe to hand back to the caller, if any.
    pub fn caller_message(&self) -> Option<String> {
        match self {
            ToolError::Failed { .. } | ToolError::TimedOut { .. } => Some(self.to_string()),
            ToolError::Spawn { .. } | ToolError::Io(_) => None,
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            ToolError::TimedOut { .. } => Transience::Retryable,
            ToolError::Failed { .. } | ToolError::Io(_) => Transience::Unknown,
            ToolError::Spawn { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ToolError::Spawn { .. } => Effect::None,
            _ => Effect::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_flags_follow_plain_args() {
        let cmd = SvnCommand::new("update")
            .arg("/wc/a")
            .auth(&Credentials::new("u", "secret"));
        assert_eq!(
            cmd.to_args(),
            vec![
                "update",
                "/wc/a",
                "--non-interactive",
                "--no-auth-cache",
                "--username",
                "u",
                "--password",
                "secret"
            ]
        );
    }

    #[test]
    fn targets_are_escaped_and_come_last() {
        let cmd = SvnCommand::new("delete")
            .targets(["-x", "logo@2x.png"])
            .auth(&Credentials::new("u", "secret"));
        let args = cmd.to_args();
        assert_eq!(&args[..2], ["delete", "--non-interactive"]);
        assert_eq!(&args[args.len() - 3..], ["--", "-x@", "logo@2x.png@"]);
        assert_eq!(cmd.target_args(), ["-x@", "logo@2x.png@"]);
        assert!(cmd.to_string().ends_with(" -- -x@ logo@2x.png@"));
    }

    #[test]
    fn display_redacts_password() {
        let cmd = SvnCommand::new("commit").auth(&Credentials::new("u", "secret"));
        let shown = cmd.to_string();
        assert!(!shown.contains("secret"));
        assert!(format!("{cmd:?}").contains("***"));
    }

    #[test]
    fn only_failures_and_timeouts_reach_the_caller() {
        assert_eq!(
            ToolError::failed(Some(1), "svn: E170013: Unable to connect").caller_message(),
            Some("svn: E170013: Unable to connect".to_string())
        );
        assert_eq!(
            ToolError::TimedOut { secs: 5 }.caller_message(),
            Some("svn timed out after 5s".to_string())
        );
        let spawn = ToolError::Spawn {
            program: PathBuf::from("/nope/svn"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(spawn.caller_message(), None);
    }
}
