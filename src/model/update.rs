// Partial update set
// Only present, non-empty fields ever reach the merge.

use chrono::{DateTime, Utc};

/// Status value that closes an issue, compared case-insensitively
const CLOSED_STATUS: &str = "closed";

/// Fields a PUT request may change. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueChanges {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
}

/// A non-empty update set stamped with its `updated_on` time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueUpdate {
    changes: IssueChanges,
    updated_on: DateTime<Utc>,
}

/// Collects candidate fields, dropping empty strings
#[derive(Debug, Default)]
pub struct IssueChangesBuilder {
    changes: IssueChanges,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl IssueChanges {
    pub fn builder() -> IssueChangesBuilder {
        IssueChangesBuilder::default()
    }

    pub const fn is_empty(&self) -> bool {
        self.issue_title.is_none()
            && self.issue_text.is_none()
            && self.created_by.is_none()
            && self.assigned_to.is_none()
            && self.status_text.is_none()
            && self.open.is_none()
    }

    fn closes(&self) -> bool {
        self.status_text
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(CLOSED_STATUS))
    }
}

impl IssueChangesBuilder {
    #[must_use]
    pub fn issue_title(mut self, value: Option<String>) -> Self {
        self.changes.issue_title = present(value);
        self
    }

    #[must_use]
    pub fn issue_text(mut self, value: Option<String>) -> Self {
        self.changes.issue_text = present(value);
        self
    }

    #[must_use]
    pub fn created_by(mut self, value: Option<String>) -> Self {
        self.changes.created_by = present(value);
        self
    }

    #[must_use]
    pub fn assigned_to(mut self, value: Option<String>) -> Self {
        self.changes.assigned_to = present(value);
        self
    }

    #[must_use]
    pub fn status_text(mut self, value: Option<String>) -> Self {
        self.changes.status_text = present(value);
        self
    }

    #[must_use]
    pub const fn open(mut self, value: Option<bool>) -> Self {
        self.changes.open = value;
        self
    }

    /// Finish the update set.
    ///
    /// Returns `None` when nothing was supplied. A "closed" status forces
    /// `open = false` regardless of any `open` value in the request.
    pub fn build(self, now: DateTime<Utc>) -> Option<IssueUpdate> {
        let mut changes = self.changes;
        if changes.is_empty() {
            return None;
        }
        if changes.closes() {
            changes.open = Some(false);
        }
        Some(IssueUpdate {
            changes,
            updated_on: now,
        })
    }
}

impl IssueUpdate {
    pub const fn changes(&self) -> &IssueChanges {
        &self.changes
    }

    pub const fn updated_on(&self) -> DateTime<Utc> {
        self.updated_on
    }
}
