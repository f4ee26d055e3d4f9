// Issue API request and reply types

use serde::{Deserialize, Serialize};

use super::fields::lenient;
use crate::model::{Issue, IssueChanges, IssueUpdate, NewIssue};
use chrono::{DateTime, Utc};

pub const FETCH_FAILED: &str = "could not fetch issues";
pub const REQUIRED_MISSING: &str = "required field(s) missing";
pub const SAVE_FAILED: &str = "could not save issue";
pub const MISSING_ID: &str = "missing _id";
pub const NO_UPDATE_FIELDS: &str = "no update field(s) sent";
pub const UPDATE_FAILED: &str = "could not update";
pub const UPDATED: &str = "successfully updated";
pub const DELETE_FAILED: &str = "could not delete";
pub const DELETED: &str = "successfully deleted";

/// POST body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateIssueRequest {
    #[serde(deserialize_with = "lenient::text")]
    pub issue_title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub issue_text: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub created_by: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub assigned_to: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub status_text: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl CreateIssueRequest {
    /// `None` unless title, text and author are all present and non-empty
    pub fn validate(self) -> Option<NewIssue> {
        Some(NewIssue {
            issue_title: required(self.issue_title)?,
            issue_text: required(self.issue_text)?,
            created_by: required(self.created_by)?,
            assigned_to: self.assigned_to.unwrap_or_default(),
            status_text: self.status_text.unwrap_or_default(),
        })
    }
}

/// PUT body. `project` and timestamps are not fields here, so they can
/// never reach the update set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateIssueRequest {
    #[serde(rename = "_id", deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub issue_title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub issue_text: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub created_by: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub assigned_to: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub status_text: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub open: Option<bool>,
}

impl UpdateIssueRequest {
    /// Split into the non-empty `_id` and the update set, if any
    pub fn into_parts(self, now: DateTime<Utc>) -> (Option<String>, Option<IssueUpdate>) {
        let update = IssueChanges::builder()
            .issue_title(self.issue_title)
            .issue_text(self.issue_text)
            .created_by(self.created_by)
            .assigned_to(self.assigned_to)
            .status_text(self.status_text)
            .open(self.open)
            .build(now);
        (required(self.id), update)
    }
}

/// DELETE body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteIssueRequest {
    #[serde(rename = "_id", deserialize_with = "lenient::text")]
    pub id: Option<String>,
}

impl DeleteIssueRequest {
    pub fn into_id(self) -> Option<String> {
        required(self.id)
    }
}

/// Every issue API answer. All are sent with status 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Issues(Vec<Issue>),
    Issue(Box<Issue>),
    Result {
        result: &'static str,
        #[serde(rename = "_id")]
        id: String,
    },
    Error {
        error: &'static str,
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl Reply {
    pub const fn error(error: &'static str) -> Self {
        Self::Error { error, id: None }
    }

    pub const fn error_for(error: &'static str, id: String) -> Self {
        Self::Error {
            error,
            id: Some(id),
        }
    }

    pub const fn result(result: &'static str, id: String) -> Self {
        Self::Result { result, id }
    }

    /// Short description for the API log
    pub fn outcome(&self) -> String {
        match self {
            Self::Issues(issues) => format!("{} issue(s)", issues.len()),
            Self::Issue(issue) => format!("created {}", issue.id),
            Self::Result { result, id } => format!("{result} {id}"),
            Self::Error { error, id: Some(id) } => format!("{error} {id}"),
            Self::Error { error, id: None } => (*error).to_string(),
        }
    }
}
