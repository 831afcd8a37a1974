use std::fmt;

use crate::core::{ClientError, TargetShape};

/// Independent facets an operation declares about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub path_required: bool,
    pub lock_required: bool,
    pub os_path_sensitive: bool,
}

impl Capabilities {
    pub const DEFAULT: Self = Self {
        path_required: true,
        lock_required: true,
        os_path_sensitive: false,
    };

    const fn lockless(mut self) -> Self {
        self.lock_required = false;
        self
    }

    const fn path_not_required(mut self) -> Self {
        self.path_required = false;
        self
    }

    const fn os_path_sensitive(mut self) -> Self {
        self.os_path_sensitive = true;
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Update,
    Commit,
    Commits,
    Purge,
    Review,
    Exist,
    Version,
    BulkUpdate,
    BulkCommits,
    BulkReview,
}

impl ActionKind {
    pub const ALL: [ActionKind; 11] = [
        ActionKind::Create,
        ActionKind::Update,
        ActionKind::Commit,
        ActionKind::Commits,
        ActionKind::Purge,
        ActionKind::Review,
        ActionKind::Exist,
        ActionKind::Version,
        ActionKind::BulkUpdate,
        ActionKind::BulkCommits,
        ActionKind::BulkReview,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Commit => "commit",
            ActionKind::Commits => "commits",
            ActionKind::Purge => "purge",
            ActionKind::Review => "review",
            ActionKind::Exist => "exist",
            ActionKind::Version => "version",
            ActionKind::BulkUpdate => "bulk-update",
            ActionKind::BulkCommits => "bulk-commits",
            ActionKind::BulkReview => "bulk-review",
        }
    }

    /// Accepts `bulk-update`, `bulk_update` and `BulkUpdate` alike.
    pub fn from_name(name: &str) -> Result<Self, ClientError> {
        let wanted = fold(name);
        Self::ALL
            .into_iter()
            .find(|kind| fold(kind.name()) == wanted)
            .ok_or_else(|| ClientError::UnknownAction {
                name: name.to_string(),
            })
    }

    pub fn capabilities(self) -> Capabilities {
        let caps = Capabilities::DEFAULT;
        match self {
            ActionKind::Create | ActionKind::Purge => caps,
            ActionKind::Update | ActionKind::Commit | ActionKind::Commits => {
                caps.os_path_sensitive()
            }
            ActionKind::Review => caps.lockless().os_path_sensitive(),
            ActionKind::Exist => caps.lockless(),
            ActionKind::Version => caps.lockless().path_not_required(),
            // Each element takes the lock itself.
            ActionKind::BulkUpdate | ActionKind::BulkCommits | ActionKind::BulkReview => {
                caps.lockless()
            }
        }
    }

    /// Operations run after this one succeeds, in order.
    pub fn follow_ups(self) -> &'static [ActionKind] {
        match self {
            ActionKind::Commits => &[ActionKind::Purge],
            _ => &[],
        }
    }

    /// The single-path operation a bulk operation fans out to.
    pub fn element(self) -> Option<ActionKind> {
        match self {
            ActionKind::BulkUpdate => Some(ActionKind::Update),
            ActionKind::BulkCommits => Some(ActionKind::Commits),
            ActionKind::BulkReview => Some(ActionKind::Review),
            _ => None,
        }
    }

    pub fn is_bulk(self) -> bool {
        self.element().is_some()
    }

    pub fn target_shape(self) -> TargetShape {
        if self.is_bulk() {
            TargetShape::Many
        } else if self.capabilities().path_required {
            TargetShape::Single
        } else {
            TargetShape::None
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn fold(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_in_every_spelling() {
        for spelling in ["bulk-update", "bulk_update", "BulkUpdate", "BULKUPDATE"] {
            assert_eq!(ActionKind::from_name(spelling).unwrap(), ActionKind::BulkUpdate);
        }
        assert_eq!(ActionKind::from_name("Commits").unwrap(), ActionKind::Commits);
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.name()).unwrap(), kind);
        }
        assert_eq!(
            ActionKind::from_name("rm-rf"),
            Err(ClientError::UnknownAction {
                name: "rm-rf".into()
            })
        );
    }

    #[test]
    fn facets() {
        let review = ActionKind::Review.capabilities();
        assert!(review.path_required && !review.lock_required && review.os_path_sensitive);

        let version = ActionKind::Version.capabilities();
        assert!(!version.path_required && !version.lock_required);

        let create = ActionKind::Create.capabilities();
        assert_eq!(create, Capabilities::DEFAULT);

        assert_eq!(ActionKind::Version.target_shape(), TargetShape::None);
        assert_eq!(ActionKind::Exist.target_shape(), TargetShape::Single);
        assert_eq!(ActionKind::BulkReview.target_shape(), TargetShape::Many);
    }

    #[test]
    fn chains_and_elements() {
        assert_eq!(ActionKind::Commits.follow_ups(), &[ActionKind::Purge]);
        assert!(ActionKind::Commit.follow_ups().is_empty());
        assert_eq!(ActionKind::BulkCommits.element(), Some(ActionKind::Commits));
        assert_eq!(ActionKind::Update.element(), None);
    }
}
