#![forbid(unsafe_code)]

pub mod action;
pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod frame;
pub mod lock;
mod paths;
pub mod svn;
pub mod telemetry;
pub mod workspace;

pub use error::{Disclosure, Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

pub use crate::action::{ActionContext, ActionKind, Capabilities};
pub use crate::core::{ChangeRecord, ChangeType, RepoPath, Request, Response};
