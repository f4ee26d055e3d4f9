//! Issue domain model
//!
//! The stored issue record, its identifier, the list filter and the partial
//! update set applied by PUT requests.

mod filter;
mod id;
mod issue;
mod update;

pub use filter::IssueFilter;
pub use id::IssueId;
pub use issue::{Issue, NewIssue};
pub use update::{IssueChanges, IssueUpdate};
