//! Persistence collaborator
//!
//! The handlers only see [`IssueStore`]; the document store behind it owns
//! all locking and durability.

mod document;

pub use document::DocumentStore;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::StorageConfig;
use crate::model::{Issue, IssueFilter, IssueId, IssueUpdate};

/// Store failure. Never shown to API clients; handlers log it and answer
/// with their fixed error body.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode documents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("corrupt document file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("duplicate issue id {0}")]
    DuplicateId(IssueId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Issue collection operations.
///
/// `update_by_id` and `delete_by_id` take the raw client-supplied id; an id
/// the store cannot parse is simply not found (`Ok(None)`).
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Every issue matching the filter, in storage order
    async fn find(&self, filter: &IssueFilter) -> StoreResult<Vec<Issue>>;

    /// Persist a new issue and return the stored record
    async fn insert(&self, issue: Issue) -> StoreResult<Issue>;

    /// Merge the update into the identified issue, returning the new record
    async fn update_by_id(&self, id: &str, update: &IssueUpdate) -> StoreResult<Option<Issue>>;

    /// Remove the identified issue permanently, returning what was removed
    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Issue>>;
}

pub type SharedIssueStore = Arc<dyn IssueStore>;

/// Open the store described by the configuration
pub async fn open_store(config: &StorageConfig) -> StoreResult<SharedIssueStore> {
    let store = match &config.path {
        Some(path) => DocumentStore::open(path).await?,
        None => DocumentStore::in_memory(),
    };
    crate::logger::log_store_opened(&store.location(), store.document_count().await);
    Ok(Arc::new(store))
}
