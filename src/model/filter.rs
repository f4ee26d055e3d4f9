// List filter
// Exact-match conditions, combined with AND, always scoped to one project

use chrono::{DateTime, Utc};

use super::id::IssueId;
use super::issue::Issue;

/// String-valued issue fields that can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    IssueTitle,
    IssueText,
    CreatedBy,
    AssignedTo,
    StatusText,
}

impl TextField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "issue_title" => Some(Self::IssueTitle),
            "issue_text" => Some(Self::IssueText),
            "created_by" => Some(Self::CreatedBy),
            "assigned_to" => Some(Self::AssignedTo),
            "status_text" => Some(Self::StatusText),
            _ => None,
        }
    }

    fn read(self, issue: &Issue) -> &str {
        match self {
            Self::IssueTitle => &issue.issue_title,
            Self::IssueText => &issue.issue_text,
            Self::CreatedBy => &issue.created_by,
            Self::AssignedTo => &issue.assigned_to,
            Self::StatusText => &issue.status_text,
        }
    }
}

/// One `key=value` filter after type coercion.
///
/// Values that cannot be coerced (a malformed id or timestamp) are kept as
/// `None` and match no issue. A key naming no issue field is kept as
/// `Unknown`; issues have no such field, so it matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Id(Option<IssueId>),
    Project(String),
    Text(TextField, String),
    Open(bool),
    CreatedOn(Option<DateTime<Utc>>),
    UpdatedOn(Option<DateTime<Utc>>),
    Unknown,
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl Condition {
    /// Coerce a query pair
    pub fn parse(key: &str, value: &str) -> Self {
        match key {
            "_id" => Self::Id(IssueId::parse(value)),
            "project" => Self::Project(value.to_string()),
            "open" => Self::Open(value == "true"),
            "created_on" => Self::CreatedOn(parse_time(value)),
            "updated_on" => Self::UpdatedOn(parse_time(value)),
            other => match TextField::from_name(other) {
                Some(field) => Self::Text(field, value.to_string()),
                None => Self::Unknown,
            },
        }
    }

    fn matches(&self, issue: &Issue) -> bool {
        match self {
            Self::Id(id) => id.is_some_and(|id| id == issue.id),
            Self::Project(project) => *project == issue.project,
            Self::Text(field, value) => field.read(issue) == value.as_str(),
            Self::Open(open) => *open == issue.open,
            Self::CreatedOn(time) => time.is_some_and(|t| t == issue.created_on),
            Self::UpdatedOn(time) => time.is_some_and(|t| t == issue.updated_on),
            Self::Unknown => false,
        }
    }
}

/// Selection for the list operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    project: String,
    conditions: Vec<Condition>,
}

impl IssueFilter {
    pub fn for_project(project: &str) -> Self {
        Self {
            project: project.to_string(),
            conditions: Vec::new(),
        }
    }

    /// Add a query pair. Returns `false` when the key names no issue field,
    /// in which case the filter now matches nothing.
    pub fn push(&mut self, key: &str, value: &str) -> bool {
        let condition = Condition::parse(key, value);
        let known = !matches!(condition, Condition::Unknown);
        self.conditions.push(condition);
        known
    }

    #[cfg(test)]
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.push(key, value);
        self
    }

    #[cfg(test)]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        issue.project == self.project && self.conditions.iter().all(|c| c.matches(issue))
    }
}
