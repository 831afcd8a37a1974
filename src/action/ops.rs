//! What each operation does once the lifecycle lets it run.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use super::{ActionContext, ActionKind};
use crate::core::{ChangeType, ClientError, RepoPath, Request, Response, parse_status, parse_status_in};
use crate::error::{Effect, Transience};
use crate::svn::output::{is_missing_target, parse_revision, parse_version};
use crate::svn::{SvnCommand, ToolError};
use crate::{Error, Result};

const COMMIT_MESSAGE: &str = "changes committed through svn-agent";

/// Refusals raised by operation logic itself. Their text goes back to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpError {
    #[error("Folder '{}' not exist", .dir.display())]
    MissingWorkingCopy { dir: PathBuf },

    #[error("Folder {} not exists", .dir.display())]
    FolderNotExists { dir: PathBuf },

    #[error("URL {url} not exists")]
    UrlNotExists { url: String },

    #[error("invalid type '{kind}'")]
    InvalidExistType { kind: String },

    #[error("no revision reported by svn {command}")]
    MissingRevision { command: &'static str },

    #[error("action '{action}' runs once per path")]
    NotSinglePath { action: &'static str },
}

impl OpError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        match self {
            OpError::MissingRevision { .. } => Effect::Some,
            _ => Effect::None,
        }
    }
}

/// One operation bound to its request and collaborators.
pub(crate) struct Operation<'a> {
    kind: ActionKind,
    request: &'a Request,
    cx: &'a ActionContext<'a>,
}

impl<'a> Operation<'a> {
    pub(crate) fn new(kind: ActionKind, request: &'a Request, cx: &'a ActionContext<'a>) -> Self {
        Self { kind, request, cx }
    }

    pub(crate) fn execute(&self) -> Result<Response> {
        match self.kind {
            ActionKind::Create => self.create(),
            ActionKind::Update => self.update(),
            ActionKind::Commit | ActionKind::Commits => self.commit(),
            ActionKind::Purge => self.purge(),
            ActionKind::Review => self.review(),
            ActionKind::Exist => self.exist(),
            ActionKind::Version => self.version(),
            ActionKind::BulkUpdate | ActionKind::BulkCommits | ActionKind::BulkReview => {
                Err(OpError::NotSinglePath {
                    action: self.kind.name(),
                }
                .into())
            }
        }
    }

    fn path(&self) -> Result<&'a RepoPath> {
        Ok(self.request.path().ok_or(ClientError::MissingPath)?)
    }

    fn dir(&self, path: &RepoPath) -> PathBuf {
        self.cx
            .workspace
            .svn_dir(path, self.kind.capabilities().os_path_sensitive)
    }

    fn svn(&self, command: SvnCommand) -> std::result::Result<String, ToolError> {
        self.cx.executor.run(&command, self.request.timeout())
    }

    fn remote(&self, command: SvnCommand) -> Result<String> {
        let command = command.auth(self.request.credentials()?);
        Ok(self.svn(command)?)
    }

    fn url_exists(&self, url: &str) -> Result<bool> {
        match self.remote(SvnCommand::new("info").arg(url)) {
            Ok(_) => Ok(true),
            Err(Error::Tool(ToolError::Failed { message, .. })) if is_missing_target(&message) => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn create(&self) -> Result<Response> {
        let path = self.path()?;
        let url = self.cx.workspace.svn_url(path);
        if self.url_exists(&url)? {
            tracing::debug!(%url, "already exists");
        } else {
            self.remote(
                SvnCommand::new("mkdir")
                    .args(["--parents", "-m"])
                    .arg(format!("create {path}"))
                    .arg(url),
            )?;
        }
        Ok(Response::path(path.clone()))
    }

    fn update(&self) -> Result<Response> {
        let path = self.path()?;
        let dir = self.dir(path);
        let (command, output) = if self.cx.workspace.is_working_copy(&dir) {
            ("update", self.remote(SvnCommand::new("update").path(&dir))?)
        } else {
            if let Some(parent) = dir.parent() {
                fs::create_dir_all(parent)?;
            }
            let url = self.cx.workspace.svn_url(path);
            (
                "checkout",
                self.remote(SvnCommand::new("checkout").arg(url).path(&dir))?,
            )
        };
        let revision = parse_revision(&output).ok_or(OpError::MissingRevision { command })?;
        Ok(Response::update(
            path.clone(),
            parse_status_in(&output, &dir),
            revision,
        ))
    }

    fn commit(&self) -> Result<Response> {
        let path = self.path()?;
        let dir = self.dir(path);
        if !dir.is_dir() {
            return Err(OpError::MissingWorkingCopy { dir }.into());
        }

        let status = self.svn(SvnCommand::new("status").current_dir(&dir))?;
        let missing: Vec<String> = parse_status(&status)
            .into_iter()
            .filter(|record| record.kind == ChangeType::Missing)
            .map(|record| record.file)
            .collect();
        if !missing.is_empty() {
            self.svn(SvnCommand::new("delete").targets(missing).current_dir(&dir))?;
        }

        let add = SvnCommand::new("add")
            .args(["--force", ".", "--auto-props", "--parents", "--depth", "infinity", "-q"])
            .current_dir(&dir);
        match self.svn(add) {
            Ok(_) => {}
            // Fails when there is nothing to add.
            Err(ToolError::Failed { message, .. }) => tracing::debug!(%message, "svn add skipped"),
            Err(err) => return Err(err.into()),
        }

        let output = self.remote(
            SvnCommand::new("commit")
                .args(["-m", COMMIT_MESSAGE])
                .current_dir(&dir),
        )?;
        Ok(Response::commit(path.clone(), parse_revision(&output)))
    }

    fn purge(&self) -> Result<Response> {
        let path = self.path()?;
        let dir = self.dir(path);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            tracing::info!(dir = %dir.display(), "working copy removed");
        }
        Ok(Response::path(path.clone()))
    }

    fn review(&self) -> Result<Response> {
        let path = self.path()?;
        let dir = self.dir(path);
        if !dir.is_dir() {
            return Err(OpError::MissingWorkingCopy { dir }.into());
        }
        let output = self.svn(SvnCommand::new("status").current_dir(&dir))?;
        Ok(Response::review(path.clone(), parse_status_in(&output, &dir)))
    }

    fn exist(&self) -> Result<Response> {
        let path = self.path()?;
        let kind = self.request.option_str("type").unwrap_or_default();
        match kind.as_str() {
            "folder" => {
                let dir = self.dir(path);
                if dir.is_dir() {
                    Ok(Response::message(
                        path.clone(),
                        format!("Folder {} exists", dir.display()),
                    ))
                } else {
                    Err(OpError::FolderNotExists { dir }.into())
                }
            }
            "url" => {
                let url = self.cx.workspace.svn_url(path);
                if self.url_exists(&url)? {
                    Ok(Response::message(path.clone(), format!("URL {url} exists")))
                } else {
                    Err(OpError::UrlNotExists { url }.into())
                }
            }
            _ => Err(OpError::InvalidExistType { kind }.into()),
        }
    }

    fn version(&self) -> Result<Response> {
        let output = self.svn(SvnCommand::new("--version").arg("--quiet"))?;
        Ok(Response::version(
            env!("CARGO_PKG_VERSION"),
            parse_version(&output).unwrap_or("unknown"),
        ))
    }
}
