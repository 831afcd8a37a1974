//! Response shapes.
//!
//! Every response serializes to a JSON object whose first key is
//! `success`. Field order is declaration order, which keeps the framed
//! payload byte-stable for a given response.

use serde::Serialize;

use super::change::ChangeRecord;
use super::path::RepoPath;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Path(PathResponse),
    Message(MessageResponse),
    Update(UpdateResponse),
    Commit(CommitResponse),
    Review(ReviewResponse),
    Version(VersionResponse),
    Error(ErrorResponse),
    PathError(PathErrorResponse),
    Bulk(BulkResponse),
}

/// `{success: true, path}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathResponse {
    success: bool,
    pub path: RepoPath,
}

/// `{success: true, path, message}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    success: bool,
    pub path: RepoPath,
    pub message: String,
}

/// `{success: true, path, actions, revision}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdateResponse {
    success: bool,
    pub path: RepoPath,
    pub actions: Vec<ChangeRecord>,
    pub revision: u64,
}

/// `{success: true, path, revision?}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitResponse {
    success: bool,
    pub path: RepoPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

/// `{success: true, path, actions}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewResponse {
    success: bool,
    pub path: RepoPath,
    pub actions: Vec<ChangeRecord>,
}

/// `{success: true, agent, svn}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionResponse {
    success: bool,
    pub agent: String,
    pub svn: String,
}

/// `{success: false, error}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    success: bool,
    pub error: String,
}

/// `{success: false, error, path}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathErrorResponse {
    success: bool,
    pub error: String,
    pub path: RepoPath,
}

/// `{success, response: [...]}`; `success` is the AND of every element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkResponse {
    success: bool,
    pub response: Vec<Response>,
}

impl Response {
    pub fn path(path: RepoPath) -> Self {
        Response::Path(PathResponse {
            success: true,
            path,
        })
    }

    pub fn message(path: RepoPath, message: impl Into<String>) -> Self {
        Response::Message(MessageResponse {
            success: true,
            path,
            message: message.into(),
        })
    }

    pub fn update(path: RepoPath, actions: Vec<ChangeRecord>, revision: u64) -> Self {
        Response::Update(UpdateResponse {
            success: true,
            path,
            actions,
            revision,
        })
    }

    pub fn commit(path: RepoPath, revision: Option<u64>) -> Self {
        Response::Commit(CommitResponse {
            success: true,
            path,
            revision,
        })
    }

    pub fn review(path: RepoPath, actions: Vec<ChangeRecord>) -> Self {
        Response::Review(ReviewResponse {
            success: true,
            path,
            actions,
        })
    }

    pub fn version(agent: impl Into<String>, svn: impl Into<String>) -> Self {
        Response::Version(VersionResponse {
            success: true,
            agent: agent.into(),
            svn: svn.into(),
        })
    }

    pub fn error(error: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            success: false,
            error: error.into(),
        })
    }

    pub fn path_error(error: impl Into<String>, path: RepoPath) -> Self {
        Response::PathError(PathErrorResponse {
            success: false,
            error: error.into(),
            path,
        })
    }

    /// Error scoped to `path` when there is one.
    pub fn error_at(error: impl Into<String>, path: Option<&RepoPath>) -> Self {
        match path {
            Some(path) => Self::path_error(error, path.clone()),
            None => Self::error(error),
        }
    }

    pub fn bulk(response: Vec<Response>) -> Self {
        let success = response.iter().all(Response::success);
        Response::Bulk(BulkResponse { success, response })
    }

    pub fn success(&self) -> bool {
        match self {
            Response::Path(r) => r.success,
            Response::Message(r) => r.success,
            Response::Update(r) => r.success,
            Response::Commit(r) => r.success,
            Response::Review(r) => r.success,
            Response::Version(r) => r.success,
            Response::Error(r) => r.success,
            Response::PathError(r) => r.success,
            Response::Bulk(r) => r.success,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_) | Response::PathError(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Error(r) => Some(&r.error),
            Response::PathError(r) => Some(&r.error),
            _ => None,
        }
    }

    /// Key/value form of the response.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            serde_json::json!({"success": false, "error": format!("unserializable response: {err}")})
        })
    }

    /// Canonical serialized payload, as framed on the wire.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("<unserializable response>"),
        }
    }
}
