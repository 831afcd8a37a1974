//! Request envelope.
//!
//! The caller sends one JSON object per invocation:
//!
//! ```json
//! {"action": "update", "username": "<b64>", "password": "<b64>", "timeout": 30,
//!  "data": {"path": "path/0", "type": "folder"}}
//! ```
//!
//! `path`/`paths` may sit inside `data` or at the top level. Every other
//! key of `data` is an operation option. Parsing touches neither the
//! filesystem nor any process.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::path::RepoPath;
use crate::error::{Effect, Transience};

/// Invalid caller input. Display text is returned to the caller verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClientError {
    #[error("malformed request: {reason}")]
    Malformed { reason: String },
    #[error("field \"action\" not passed in as should")]
    MissingAction,
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },
    #[error("SVN credential missing")]
    MissingCredentials,
    #[error("field \"path\" not passed in as should")]
    MissingPath,
    #[error("field \"paths\" not passed in as should")]
    MissingPaths,
    #[error("fields \"path\" and \"paths\" cannot be used together")]
    ConflictingTargets,
    #[error("up to {max} paths can be handled together")]
    TooManyPaths { max: usize, got: usize },
    #[error("invalid path '{raw}'")]
    InvalidPath { raw: String },
    #[error("field \"timeout\" must be a positive integer of at most 86400 seconds")]
    InvalidTimeout,
}

impl ClientError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// Wire form, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRequest {
    pub action: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Option<Value>,
    pub path: Option<Value>,
    pub paths: Option<Value>,
    pub data: BTreeMap<String, Value>,
}

impl RawRequest {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ClientError> {
        serde_json::from_slice(bytes).map_err(|err| ClientError::Malformed {
            reason: err.to_string(),
        })
    }

    pub fn action(&self) -> Result<&str, ClientError> {
        self.action
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ClientError::MissingAction)
    }
}

/// How many target paths an operation takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetShape {
    /// Exactly one `path`.
    Single,
    /// A `paths` list of bounded length.
    Many,
    /// No path at all; any supplied path is ignored and never normalized.
    None,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    None,
    Single(RepoPath),
    Many(Vec<RepoPath>),
}

impl Target {
    pub fn path(&self) -> Option<&RepoPath> {
        match self {
            Target::Single(path) => Some(path),
            _ => None,
        }
    }
}

/// Decoded credentials. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Decode the base64 wire form. Anything that does not decode to
    /// non-empty UTF-8 counts as absent.
    pub fn decode(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        let username = decode_field(username?)?;
        let password = decode_field(password?)?;
        Some(Self { username, password })
    }

    fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn decode_field(raw: &str) -> Option<String> {
    let bytes = BASE64_STANDARD.decode(raw.trim()).ok()?;
    let value = String::from_utf8(bytes).ok()?;
    (!value.is_empty()).then_some(value)
}

/// Request-level limits. Only the default timeout is configurable.
#[derive(Clone, Copy, Debug)]
pub struct RequestLimits {
    pub default_timeout: Duration,
}

impl RequestLimits {
    /// Most paths one bulk request may carry.
    pub const MAX_PATHS: usize = 40;
    /// Longest timeout a caller may ask for (one day).
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(60),
        }
    }
}

/// Validated, normalized request envelope.
#[derive(Clone, Debug)]
pub struct Request {
    action: String,
    credentials: Option<Credentials>,
    target: Target,
    timeout: Duration,
    options: BTreeMap<String, Value>,
}

impl Request {
    /// Validate `raw` for an operation taking `shape` targets.
    pub fn parse(
        raw: RawRequest,
        shape: TargetShape,
        limits: &RequestLimits,
    ) -> Result<Self, ClientError> {
        let action = raw.action()?.to_string();

        let credentials = Credentials::decode(raw.username.as_deref(), raw.password.as_deref())
            .ok_or(ClientError::MissingCredentials)?;

        let timeout = match &raw.timeout {
            None | Some(Value::Null) => limits.default_timeout,
            Some(value) => parse_timeout(value)?,
        };

        let mut options = raw.data;
        let path = options.remove("path").or(raw.path);
        let paths = options.remove("paths").or(raw.paths);

        let target = match shape {
            TargetShape::None => Target::None,
            _ if path.is_some() && paths.is_some() => return Err(ClientError::ConflictingTargets),
            TargetShape::Single => Target::Single(parse_single(path.as_ref())?),
            TargetShape::Many => Target::Many(parse_many(paths.as_ref(), RequestLimits::MAX_PATHS)?),
        };

        Ok(Self {
            action,
            credentials: Some(credentials),
            target,
            timeout,
            options,
        })
    }

    /// Build an envelope directly; used for derived and test requests.
    pub fn new(action: impl Into<String>, credentials: Option<Credentials>, target: Target) -> Self {
        Self {
            action: action.into(),
            credentials,
            target,
            timeout: RequestLimits::default().default_timeout,
            options: BTreeMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// A single-path request sharing credentials, timeout and options.
    pub fn for_path(&self, action: &str, path: RepoPath) -> Self {
        Self {
            action: action.to_string(),
            credentials: self.credentials.clone(),
            target: Target::Single(path),
            timeout: self.timeout,
            options: self.options.clone(),
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn credentials(&self) -> Result<&Credentials, ClientError> {
        self.credentials
            .as_ref()
            .filter(|creds| creds.is_complete())
            .ok_or(ClientError::MissingCredentials)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn path(&self) -> Option<&RepoPath> {
        self.target.path()
    }

    pub fn paths(&self) -> &[RepoPath] {
        match &self.target {
            Target::Many(paths) => paths,
            _ => &[],
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    /// String option; numbers and booleans are rendered as text.
    pub fn option_str(&self, key: &str) -> Option<String> {
        match self.options.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

fn parse_timeout(value: &Value) -> Result<Duration, ClientError> {
    let secs = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match secs {
        Some(secs) if secs > 0 && secs <= RequestLimits::MAX_TIMEOUT.as_secs() => {
            Ok(Duration::from_secs(secs))
        }
        _ => Err(ClientError::InvalidTimeout),
    }
}

fn parse_single(value: Option<&Value>) -> Result<RepoPath, ClientError> {
    match value {
        Some(Value::String(raw)) => RepoPath::parse(raw),
        Some(Value::Null) | None => Err(ClientError::MissingPath),
        Some(other) => Err(ClientError::InvalidPath {
            raw: other.to_string(),
        }),
    }
}

fn parse_many(value: Option<&Value>, max: usize) -> Result<Vec<RepoPath>, ClientError> {
    let items = match value {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Null) | None => return Err(ClientError::MissingPaths),
        Some(Value::Array(_)) => return Err(ClientError::MissingPaths),
        Some(other) => {
            return Err(ClientError::InvalidPath {
                raw: other.to_string(),
            });
        }
    };
    if items.len() > max {
        return Err(ClientError::TooManyPaths {
            max,
            got: items.len(),
        });
    }
    items
        .iter()
        .map(|item| match item {
            Value::String(raw) => RepoPath::parse(raw),
            other => Err(ClientError::InvalidPath {
                raw: other.to_string(),
            }),
        })
        .collect()
}
