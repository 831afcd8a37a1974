use thiserror::Error;

use crate::action::OpError;
use crate::config::ConfigError;
use crate::core::ClientError;
use crate::frame::FrameError;
use crate::lock::LockError;
use crate::svn::ToolError;

/// Sent when a lock-required operation finds the agent lock held.
pub const LOCK_FAILED: &str = "Unable to acquire the agent lock. Please try again later.";
/// Sent in place of any typed internal failure.
pub const BACKEND_ISSUE: &str = "Backend issue. Please check with backend developers for help.";
/// Sent when operation logic panicked.
pub const UNKNOWN_ISSUE: &str = "Unknown issue. Please check with backend developers for help.";

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred (locally or remotely).
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// How much of an error the caller gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disclosure {
    /// Invalid input; message returned verbatim.
    Client(String),
    /// Global lock held elsewhere; caller should retry later.
    LockDenied,
    /// The tool or the operation refused; its message is safe to return.
    Delegated(String),
    /// Anything else. Logged, never returned.
    Internal,
}

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Client(e) => e.transience(),
            Error::Lock(e) => e.transience(),
            Error::Tool(e) => e.transience(),
            Error::Op(e) => e.transience(),
            Error::Config(e) => e.transience(),
            Error::Frame(e) => e.transience(),
            Error::Io(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Client(e) => e.effect(),
            Error::Lock(e) => e.effect(),
            Error::Tool(e) => e.effect(),
            Error::Op(e) => e.effect(),
            Error::Config(e) => e.effect(),
            Error::Frame(e) => e.effect(),
            Error::Io(_) => Effect::Unknown,
        }
    }

    pub fn disclosure(&self) -> Disclosure {
        match self {
            Error::Client(e) => Disclosure::Client(e.to_string()),
            Error::Lock(LockError::Held { .. }) => Disclosure::LockDenied,
            Error::Tool(e) => match e.caller_message() {
                Some(message) => Disclosure::Delegated(message),
                None => Disclosure::Internal,
            },
            Error::Op(e) => Disclosure::Delegated(e.to_string()),
            Error::Lock(_) | Error::Config(_) | Error::Frame(_) | Error::Io(_) => {
                Disclosure::Internal
            }
        }
    }

    /// Short variant name for operator logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Client(_) => "ClientError",
            Error::Lock(_) => "LockError",
            Error::Tool(_) => "ToolError",
            Error::Op(_) => "OpError",
            Error::Config(_) => "ConfigError",
            Error::Frame(_) => "FrameError",
            Error::Io(_) => "IoError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn disclosure_follows_taxonomy() {
        let client: Error = ClientError::MissingCredentials.into();
        assert_eq!(
            client.disclosure(),
            Disclosure::Client("SVN credential missing".into())
        );

        let held: Error = LockError::Held {
            path: Box::new(PathBuf::from("/tmp/agent.lock")),
            meta: None,
        }
        .into();
        assert_eq!(held.disclosure(), Disclosure::LockDenied);
        assert!(held.transience().is_retryable());
        assert_eq!(held.effect(), Effect::None);

        let io: Error = std::io::Error::other("disk on fire").into();
        assert_eq!(io.disclosure(), Disclosure::Internal);
        assert_eq!(io.kind(), "IoError");
    }
}
