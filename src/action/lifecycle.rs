use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::ops::Operation;
use super::{ActionContext, ActionKind};
use crate::core::{ClientError, RepoPath, Request, Response};
use crate::error::{BACKEND_ISSUE, Disclosure, LOCK_FAILED, UNKNOWN_ISSUE};
use crate::lock::LockError;
use crate::{Error, Result};

/// Where an [`Action`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    Validated,
    Locked,
    LockDenied,
    Lockless,
    Executed,
    Responded,
}

/// One single-path (or pathless) operation and its response slot.
pub struct Action<'a> {
    kind: ActionKind,
    request: Request,
    cx: &'a ActionContext<'a>,
    stage: Stage,
    response: Option<Response>,
    description: Option<String>,
}

impl<'a> Action<'a> {
    pub fn new(kind: ActionKind, request: Request, cx: &'a ActionContext<'a>) -> Self {
        Self {
            kind,
            request,
            cx,
            stage: Stage::Created,
            response: None,
            description: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Run to completion. Never fails: every failure becomes an error response.
    pub fn run(mut self) -> Response {
        self.process();
        self.stage = Stage::Responded;
        self.response
            .take()
            .unwrap_or_else(|| Response::error(BACKEND_ISSUE))
    }

    fn process(&mut self) {
        if let Err(err) = self.validate() {
            self.fail(err);
            return;
        }
        self.stage = Stage::Validated;

        let outcome = if self.kind.capabilities().lock_required {
            match self.cx.locks.try_acquire(self.kind.name()) {
                Ok(lock) => {
                    self.stage = Stage::Locked;
                    let outcome = self.execute();
                    if let Err(err) = lock.release() {
                        tracing::warn!(error = %err, "failed to release agent lock");
                    }
                    outcome
                }
                Err(err) => {
                    if let LockError::Held { meta: Some(meta), .. } = &err {
                        tracing::warn!(
                            action = %self.kind,
                            holder_pid = meta.pid,
                            holder_action = %meta.action,
                            "agent lock held"
                        );
                    }
                    self.stage = Stage::LockDenied;
                    Err(err.into())
                }
            }
        } else {
            self.stage = Stage::Lockless;
            self.execute()
        };

        match outcome {
            Ok(response) => self.respond(response),
            Err(err) => self.fail(err),
        }
        if let Some(response) = &self.response {
            tracing::info!(action = %self.kind, %response, "response");
        }

        if self.response.as_ref().is_some_and(Response::is_error) {
            return;
        }
        self.run_follow_ups();
    }

    fn validate(&mut self) -> Result<()> {
        self.request.credentials()?;
        let description = if self.kind.capabilities().path_required {
            let path = self.error_path().ok_or(ClientError::MissingPath)?;
            format!("svn {} {path}", self.kind)
        } else {
            format!("svn {}", self.kind)
        };
        self.description = Some(description);
        Ok(())
    }

    fn execute(&mut self) -> Result<Response> {
        if let Some(description) = &self.description {
            tracing::info!("now executing command: {description}");
        }
        let operation = Operation::new(self.kind, &self.request, self.cx);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| operation.execute()));
        self.stage = Stage::Executed;
        match outcome {
            Ok(result) => result,
            Err(payload) => {
                tracing::error!(
                    action = %self.kind,
                    panic = panic_message(payload.as_ref()),
                    "operation panicked"
                );
                Ok(self.error_response(UNKNOWN_ISSUE))
            }
        }
    }

    /// Each follow-up runs its own full lifecycle; the first failure stops
    /// the chain and the last response reached becomes ours.
    fn run_follow_ups(&mut self) {
        let Some(path) = self.request.path().cloned() else {
            return;
        };
        let mut last = None;
        for &kind in self.kind.follow_ups() {
            let request = self.request.for_path(kind.name(), path.clone());
            let response = Action::new(kind, request, self.cx).run();
            let failed = response.is_error();
            last = Some(response);
            if failed {
                break;
            }
        }
        if let Some(response) = last {
            self.response = Some(response);
        }
    }

    /// Fill the response slot unless it already holds an error.
    fn respond(&mut self, response: Response) {
        if self.response.as_ref().is_some_and(Response::is_error) {
            return;
        }
        self.response = Some(response);
    }

    fn fail(&mut self, err: Error) {
        let message = match err.disclosure() {
            Disclosure::Client(message) | Disclosure::Delegated(message) => message,
            Disclosure::LockDenied => LOCK_FAILED.to_string(),
            Disclosure::Internal => {
                tracing::error!(kind = err.kind(), message = %err, action = %self.kind, "internal failure");
                BACKEND_ISSUE.to_string()
            }
        };
        let response = self.error_response(&message);
        self.respond(response);
    }

    fn error_response(&self, message: &str) -> Response {
        Response::error_at(message, self.error_path())
    }

    fn error_path(&self) -> Option<&RepoPath> {
        if self.kind.capabilities().path_required {
            self.request.path()
        } else {
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
