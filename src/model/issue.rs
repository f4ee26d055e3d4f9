// Issue record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::IssueId;
use super::update::IssueUpdate;

/// A tracked work item, as stored and as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: IssueId,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Validated creation input. The project always comes from the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
}

impl Issue {
    /// Build a fresh open issue; both timestamps are `now`
    pub fn create(id: IssueId, project: &str, new: NewIssue, now: DateTime<Utc>) -> Self {
        Self {
            id,
            project: project.to_string(),
            issue_title: new.issue_title,
            issue_text: new.issue_text,
            created_by: new.created_by,
            assigned_to: new.assigned_to,
            status_text: new.status_text,
            open: true,
            created_on: now,
            updated_on: now,
        }
    }

    /// Merge an update set into this record.
    ///
    /// Only fields carried by the update change. `updated_on` never moves
    /// before `created_on`, even if the clock stepped backwards.
    pub fn apply(&mut self, update: &IssueUpdate) {
        let changes = update.changes();

        if let Some(title) = &changes.issue_title {
            self.issue_title.clone_from(title);
        }
        if let Some(text) = &changes.issue_text {
            self.issue_text.clone_from(text);
        }
        if let Some(created_by) = &changes.created_by {
            self.created_by.clone_from(created_by);
        }
        if let Some(assigned_to) = &changes.assigned_to {
            self.assigned_to.clone_from(assigned_to);
        }
        if let Some(status) = &changes.status_text {
            self.status_text.clone_from(status);
        }
        if let Some(open) = changes.open {
            self.open = open;
        }

        self.updated_on = std::cmp::max(update.updated_on(), self.created_on);
    }
}
