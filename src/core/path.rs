//! Request-path normalization.
//!
//! Every logical path that enters the agent is rewritten to a canonical
//! form that starts and ends with `/` (`"path/0"`, `"/path/0"` and
//! `"path/0/"` all become `"/path/0/"`). Responses echo the canonical
//! form, so callers can match results against what they submitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::request::ClientError;

pub const SEPARATOR: char = '/';

/// A normalized logical path, relative to the repository root.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Normalize a caller-supplied path.
    ///
    /// Empty segments are collapsed. `.` and `..` segments are rejected so
    /// a request can never resolve outside the working-copy root, and a path
    /// with no segments left is rejected so it never names the root itself.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClientError::MissingPath);
        }

        let mut segments = Vec::new();
        for segment in trimmed.split(['/', '\\']) {
            match segment {
                "" => continue,
                "." | ".." => {
                    return Err(ClientError::InvalidPath {
                        raw: raw.to_string(),
                    });
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(ClientError::InvalidPath {
                raw: raw.to_string(),
            });
        }
        Ok(Self(format!("/{}/", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without its leading and trailing separator.
    pub fn relative(&self) -> &str {
        self.0.trim_matches(SEPARATOR)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RepoPath {
    type Error = ClientError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Translate a POSIX-style local path into the form the Windows build of
/// the tool expects.
///
/// `/cygdrive/c/x` and `/c/x` become `C:\x`; every other separator is
/// flipped to `\`.
pub fn to_windows_path(path: &str) -> String {
    let rest = path.strip_prefix("/cygdrive").unwrap_or(path);
    let mut chars = rest.chars();
    let drive = match (chars.next(), chars.next(), chars.clone().next()) {
        (Some('/'), Some(letter), Some('/') | None) if letter.is_ascii_alphabetic() => {
            Some(letter.to_ascii_uppercase())
        }
        _ => None,
    };

    match drive {
        Some(letter) => {
            let tail = &rest[2..];
            let tail = if tail.is_empty() { "/" } else { tail };
            format!("{letter}:{}", tail.replace('/', "\\"))
        }
        None => path.replace('/', "\\"),
    }
}
