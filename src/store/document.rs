// Document store
// One issue collection held in memory, optionally mirrored to a JSON file

use async_trait::async_trait;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

use super::{IssueStore, StoreError, StoreResult};
use crate::model::{Issue, IssueFilter, IssueId, IssueUpdate};

/// Issue collection in insertion order.
///
/// Every mutation holds the write lock until the file (if any) has been
/// rewritten, so the file always reflects a state the API reported. A failed
/// write rolls the in-memory change back.
pub struct DocumentStore {
    /// Backing file; `None` keeps the collection in memory only
    path: Option<PathBuf>,
    documents: RwLock<Vec<Issue>>,
}

impl DocumentStore {
    /// Ephemeral store, lost on exit
    pub fn in_memory() -> Self {
        Self {
            path: None,
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Open a file-backed store. A missing file starts an empty collection.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let documents = load_documents(&path).await?;
        Ok(Self {
            path: Some(path),
            documents: RwLock::new(documents),
        })
    }

    /// Where documents live, for logging
    pub fn location(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "memory".to_string(), |p| p.display().to_string())
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Rewrite the backing file via a staging file and rename
    async fn save(&self, documents: &[Issue]) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_vec_pretty(documents)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let staging = staging_path(path);
        fs::write(&staging, content)
            .await
            .map_err(|source| io_error(&staging, source))?;
        fs::rename(&staging, path)
            .await
            .map_err(|source| io_error(path, source))
    }
}

#[async_trait]
impl IssueStore for DocumentStore {
    async fn find(&self, filter: &IssueFilter) -> StoreResult<Vec<Issue>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect())
    }

    async fn insert(&self, issue: Issue) -> StoreResult<Issue> {
        let mut documents = self.documents.write().await;
        if documents.iter().any(|existing| existing.id == issue.id) {
            return Err(StoreError::DuplicateId(issue.id));
        }

        documents.push(issue.clone());
        if let Err(e) = self.save(&documents).await {
            documents.pop();
            return Err(e);
        }
        Ok(issue)
    }

    async fn update_by_id(&self, id: &str, update: &IssueUpdate) -> StoreResult<Option<Issue>> {
        let Some(id) = IssueId::parse(id) else {
            return Ok(None);
        };

        let mut documents = self.documents.write().await;
        let Some(index) = documents.iter().position(|issue| issue.id == id) else {
            return Ok(None);
        };

        let previous = documents[index].clone();
        documents[index].apply(update);
        if let Err(e) = self.save(&documents).await {
            documents[index] = previous;
            return Err(e);
        }
        Ok(Some(documents[index].clone()))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Issue>> {
        let Some(id) = IssueId::parse(id) else {
            return Ok(None);
        };

        let mut documents = self.documents.write().await;
        let Some(index) = documents.iter().position(|issue| issue.id == id) else {
            return Ok(None);
        };

        let removed = documents.remove(index);
        if let Err(e) = self.save(&documents).await {
            documents.insert(index, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }
}

async fn load_documents(path: &Path) -> StoreResult<Vec<Issue>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(io_error(path, source)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let documents: Vec<Issue> =
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut seen = HashSet::with_capacity(documents.len());
    if let Some(dup) = documents.iter().find(|issue| !seen.insert(issue.id)) {
        return Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("duplicate issue id {}", dup.id),
        });
    }

    Ok(documents)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("issues"), OsString::from);
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
