//! Working-copy change records.
//!
//! One record per line of a status comparison (or of an update/checkout
//! report, which uses the same `<code> <path>` shape).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Single-character status code reported by the tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Unversioned,
    Missing,
    Modified,
    Added,
    Deleted,
    Conflicted,
    Updated,
    Merged,
    Replaced,
    Existed,
    Ignored,
    External,
    Obstructed,
}

impl ChangeType {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            '?' => Self::Unversioned,
            '!' => Self::Missing,
            'M' => Self::Modified,
            'A' => Self::Added,
            'D' => Self::Deleted,
            'C' => Self::Conflicted,
            'U' => Self::Updated,
            'G' => Self::Merged,
            'R' => Self::Replaced,
            'E' => Self::Existed,
            'I' => Self::Ignored,
            'X' => Self::External,
            '~' => Self::Obstructed,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            Self::Unversioned => '?',
            Self::Missing => '!',
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Conflicted => 'C',
            Self::Updated => 'U',
            Self::Merged => 'G',
            Self::Replaced => 'R',
            Self::Existed => 'E',
            Self::Ignored => 'I',
            Self::External => 'X',
            Self::Obstructed => '~',
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ChangeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0u8; 4];
        serializer.serialize_str(self.code().encode_utf8(&mut buf))
    }
}

impl<'de> Deserialize<'de> for ChangeType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Self::from_code(code)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown status code {raw:?}"))),
            _ => Err(serde::de::Error::custom(format!(
                "status code must be one character, got {raw:?}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "type")]
    pub kind: ChangeType,
    pub file: String,
}

impl ChangeRecord {
    pub fn new(kind: ChangeType, file: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
        }
    }

    /// Parse one `<code><whitespace><path>` line.
    ///
    /// Returns `None` for anything else: headers, summaries, blank lines,
    /// unknown codes.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut chars = line.chars();
        let kind = ChangeType::from_code(chars.next()?)?;
        let rest = chars.as_str();
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let file = rest.trim();
        if file.is_empty() {
            return None;
        }
        Some(Self::new(kind, file))
    }
}

/// Parse every well-formed line of tool output, in order.
///
/// Malformed lines are skipped; partial results beat no results.
pub fn parse_status(output: &str) -> Vec<ChangeRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let record = ChangeRecord::parse_line(line);
            if record.is_none() {
                tracing::debug!(line, "skipping unrecognized status line");
            }
            record
        })
        .collect()
}

/// Same as [`parse_status`], with relative file paths anchored at `base`.
pub fn parse_status_in(output: &str, base: &Path) -> Vec<ChangeRecord> {
    parse_status(output)
        .into_iter()
        .map(|mut record| {
            if !Path::new(&record.file).is_absolute() {
                record.file = base.join(&record.file).to_string_lossy().into_owned();
            }
            record
        })
        .collect()
}
