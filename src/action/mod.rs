//! Action execution: capability facets, the lock-guarded lifecycle, the
//! per-operation logic and the bulk orchestrator.

pub mod bulk;
mod kind;
mod lifecycle;
mod ops;

pub use kind::{ActionKind, Capabilities};
pub use lifecycle::{Action, Stage};
pub use ops::OpError;

use crate::config::Config;
use crate::core::{Request, RequestLimits, Response};
use crate::lock::LockCoordinator;
use crate::svn::Executor;
use crate::workspace::Workspace;

/// Collaborators shared by every action of one invocation.
pub struct ActionContext<'a> {
    workspace: Workspace,
    locks: LockCoordinator,
    limits: RequestLimits,
    executor: &'a dyn Executor,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        workspace: Workspace,
        locks: LockCoordinator,
        limits: RequestLimits,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            workspace,
            locks,
            limits,
            executor,
        }
    }

    pub fn from_config(config: &Config, executor: &'a dyn Executor) -> Self {
        Self::new(
            Workspace::from_config(config),
            LockCoordinator::new(config.root_dir.clone(), config.lock_name.clone()),
            config.request_limits(),
            executor,
        )
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn limits(&self) -> &RequestLimits {
        &self.limits
    }
}

/// Run a validated request to its single response.
pub fn dispatch(kind: ActionKind, request: Request, cx: &ActionContext<'_>) -> Response {
    if kind.is_bulk() {
        bulk::run(kind, &request, cx)
    } else {
        Action::new(kind, request, cx).run()
    }
}
