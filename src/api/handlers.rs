// Issue handlers module
// Validation happens before the store is touched; store failures and
// not-found results become fixed error replies.

use chrono::Utc;

use super::fields::RequestFields;
use super::types::{
    CreateIssueRequest, DeleteIssueRequest, Reply, UpdateIssueRequest, DELETED, DELETE_FAILED,
    FETCH_FAILED, MISSING_ID, NO_UPDATE_FIELDS, REQUIRED_MISSING, SAVE_FAILED, UPDATED,
    UPDATE_FAILED,
};
use crate::config::AppState;
use crate::logger;
use crate::model::{Issue, IssueFilter, IssueId};

fn respond(method: &str, project: &str, reply: Reply) -> Reply {
    logger::log_api_request(method, project, &reply.outcome());
    reply
}

fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    let Some(query) = query else {
        return Vec::new();
    };
    serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        logger::log_warning(&format!("Unparsable query string '{query}': {e}"));
        Vec::new()
    })
}

/// GET: issues of the project matching every query filter
pub async fn list_issues(state: &AppState, project: &str, query: Option<&str>) -> Reply {
    let mut filter = IssueFilter::for_project(project);
    for (key, value) in query_pairs(query) {
        if !filter.push(&key, &value) {
            logger::log_unknown_filter(&key);
        }
    }

    match state.store.find(&filter).await {
        Ok(issues) => respond("GET", project, Reply::Issues(issues)),
        Err(e) => {
            logger::log_store_error("find", &e);
            respond("GET", project, Reply::error(FETCH_FAILED))
        }
    }
}

/// POST: create an open issue in the project
pub async fn create_issue(state: &AppState, project: &str, fields: RequestFields) -> Reply {
    let request: CreateIssueRequest = fields.decode();
    let Some(new) = request.validate() else {
        return respond("POST", project, Reply::error(REQUIRED_MISSING));
    };

    let issue = Issue::create(IssueId::generate(), project, new, Utc::now());
    match state.store.insert(issue).await {
        Ok(saved) => respond("POST", project, Reply::Issue(Box::new(saved))),
        Err(e) => {
            logger::log_store_error("insert", &e);
            respond("POST", project, Reply::error(SAVE_FAILED))
        }
    }
}

/// PUT: merge the supplied fields into the issue named by `_id`
pub async fn update_issue(state: &AppState, project: &str, fields: RequestFields) -> Reply {
    let request: UpdateIssueRequest = fields.decode();
    let (id, update) = request.into_parts(Utc::now());

    let Some(id) = id else {
        return respond("PUT", project, Reply::error(MISSING_ID));
    };
    let Some(update) = update else {
        return respond("PUT", project, Reply::error_for(NO_UPDATE_FIELDS, id));
    };

    let reply = match state.store.update_by_id(&id, &update).await {
        Ok(Some(_)) => Reply::result(UPDATED, id),
        Ok(None) => Reply::error_for(UPDATE_FAILED, id),
        Err(e) => {
            logger::log_store_error("update", &e);
            Reply::error_for(UPDATE_FAILED, id)
        }
    };
    respond("PUT", project, reply)
}

/// DELETE: remove the issue named by `_id`
pub async fn delete_issue(state: &AppState, project: &str, fields: RequestFields) -> Reply {
    let request: DeleteIssueRequest = fields.decode();
    let Some(id) = request.into_id() else {
        return respond("DELETE", project, Reply::error(MISSING_ID));
    };

    let reply = match state.store.delete_by_id(&id).await {
        Ok(Some(_)) => Reply::result(DELETED, id),
        Ok(None) => Reply::error_for(DELETE_FAILED, id),
        Err(e) => {
            logger::log_store_error("delete", &e);
            Reply::error_for(DELETE_FAILED, id)
        }
    };
    respond("DELETE", project, reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::IssueUpdate;
    use crate::store::{DocumentStore, IssueStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails every call and counts how many reached it
    #[derive(Default)]
    struct BrokenStore {
        calls: AtomicUsize,
    }

    impl BrokenStore {
        fn fail(&self) -> StoreError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StoreError::Io {
                path: "unreachable.json".into(),
                source: std::io::Error::other("disk gone"),
            }
        }
    }

    #[async_trait]
    impl IssueStore for BrokenStore {
        async fn find(&self, _filter: &IssueFilter) -> StoreResult<Vec<Issue>> {
            Err(self.fail())
        }
        async fn insert(&self, _issue: Issue) -> StoreResult<Issue> {
            Err(self.fail())
        }
        async fn update_by_id(&self, _id: &str, _u: &IssueUpdate) -> StoreResult<Option<Issue>> {
            Err(self.fail())
        }
        async fn delete_by_id(&self, _id: &str) -> StoreResult<Option<Issue>> {
            Err(self.fail())
        }
    }

    fn memory_state() -> AppState {
        AppState::new(Config::default(), Arc::new(DocumentStore::in_memory()))
    }

    fn broken_state() -> (AppState, Arc<BrokenStore>) {
        let store = Arc::new(BrokenStore::default());
        (AppState::new(Config::default(), store.clone()), store)
    }

    fn fields(value: Value) -> RequestFields {
        RequestFields::from(value)
    }

    async fn create(state: &AppState, project: &str, body: Value) -> Issue {
        match create_issue(state, project, fields(body)).await {
            Reply::Issue(issue) => *issue,
            other => panic!("expected created issue, got {other:?}"),
        }
    }

    async fn list(state: &AppState, project: &str, query: Option<&str>) -> Vec<Issue> {
        match list_issues(state, project, query).await {
            Reply::Issues(issues) => issues,
            other => panic!("expected issue list, got {other:?}"),
        }
    }

    fn minimal() -> Value {
        json!({"issue_title": "T", "issue_text": "X", "created_by": "U"})
    }

    #[tokio::test]
    async fn test_create_with_only_required_fields() {
        let state = memory_state();
        let issue = create(&state, "apitest", minimal()).await;
        assert_eq!(issue.project, "apitest");
        assert_eq!(issue.assigned_to, "");
        assert_eq!(issue.status_text, "");
        assert!(issue.open);
        assert_eq!(issue.created_on, issue.updated_on);
    }

    #[tokio::test]
    async fn test_create_ignores_body_project() {
        let state = memory_state();
        let mut body = minimal();
        body["project"] = json!("other");
        let issue = create(&state, "apitest", body).await;
        assert_eq!(issue.project, "apitest");
    }

    #[tokio::test]
    async fn test_create_missing_fields_persists_nothing() {
        let state = memory_state();
        let reply = create_issue(
            &state,
            "apitest",
            fields(json!({"issue_title": "T", "issue_text": "X"})),
        )
        .await;
        assert_eq!(reply, Reply::error(REQUIRED_MISSING));
        assert!(list(&state, "apitest", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_ids_are_unique() {
        let state = memory_state();
        let a = create(&state, "apitest", minimal()).await;
        let b = create(&state, "apitest", minimal()).await;
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let state = memory_state();
        let mut nobody = minimal();
        nobody["assigned_to"] = json!("Nobody");
        let first = create(&state, "apitest", nobody.clone()).await;
        let second = create(&state, "apitest", nobody).await;
        create(&state, "apitest", minimal()).await;
        create(&state, "elsewhere", minimal()).await;

        update_issue(
            &state,
            "apitest",
            fields(json!({"_id": second.id.to_string(), "status_text": "closed"})),
        )
        .await;

        assert_eq!(list(&state, "apitest", None).await.len(), 3);

        let assigned = list(&state, "apitest", Some("assigned_to=Nobody")).await;
        assert_eq!(assigned.len(), 2);
        assert!(assigned.iter().all(|i| i.assigned_to == "Nobody"));

        let open = list(&state, "apitest", Some("assigned_to=Nobody&open=true")).await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, first.id);

        let closed = list(&state, "apitest", Some("open=false")).await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, second.id);
    }

    #[tokio::test]
    async fn test_list_unknown_key_matches_nothing() {
        let state = memory_state();
        create(&state, "p", minimal()).await;
        assert!(list(&state, "p", Some("foo=bar")).await.is_empty());
        assert!(list(&state, "p", Some("open=true&foo=bar")).await.is_empty());
        assert_eq!(list(&state, "p", Some("open=true")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_list_unknown_project_is_empty() {
        let state = memory_state();
        create(&state, "apitest", minimal()).await;
        assert!(list(&state, "nothing-here", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_only_id_is_no_update() {
        let state = memory_state();
        let issue = create(&state, "apitest", minimal()).await;
        let id = issue.id.to_string();

        let reply = update_issue(&state, "apitest", fields(json!({"_id": id}))).await;
        assert_eq!(reply, Reply::error_for(NO_UPDATE_FIELDS, id.clone()));

        let reply = update_issue(
            &state,
            "apitest",
            fields(json!({"_id": id, "issue_title": "", "assigned_to": null})),
        )
        .await;
        assert_eq!(reply, Reply::error_for(NO_UPDATE_FIELDS, id));

        assert_eq!(list(&state, "apitest", None).await, vec![issue]);
    }

    #[tokio::test]
    async fn test_update_missing_id_checked_first() {
        let (state, store) = broken_state();
        let reply = update_issue(&state, "apitest", fields(json!({"issue_text": "x"}))).await;
        assert_eq!(reply, Reply::error(MISSING_ID));
        let reply = update_issue(&state, "apitest", fields(json!({}))).await;
        assert_eq!(reply, Reply::error(MISSING_ID));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_merges_and_closes() {
        let state = memory_state();
        let issue = create(&state, "apitest", minimal()).await;
        let id = issue.id.to_string();

        let reply = update_issue(
            &state,
            "apitest",
            fields(json!({"_id": id, "status_text": "Closed", "issue_title": "New"})),
        )
        .await;
        assert_eq!(reply, Reply::result(UPDATED, id));

        let stored = list(&state, "apitest", None).await.remove(0);
        assert!(!stored.open);
        assert_eq!(stored.issue_title, "New");
        assert_eq!(stored.issue_text, "X");
        assert_eq!(stored.status_text, "Closed");
        assert_eq!(stored.created_on, issue.created_on);
        assert!(stored.updated_on >= stored.created_on);
    }

    #[tokio::test]
    async fn test_update_open_passes_through() {
        let state = memory_state();
        let issue = create(&state, "apitest", minimal()).await;
        let id = issue.id.to_string();

        update_issue(&state, "apitest", fields(json!({"_id": id, "open": "false"}))).await;
        assert!(!list(&state, "apitest", None).await[0].open);

        update_issue(&state, "apitest", fields(json!({"_id": id, "open": true}))).await;
        assert!(list(&state, "apitest", None).await[0].open);
    }

    #[tokio::test]
    async fn test_update_unknown_or_malformed_id() {
        let state = memory_state();
        let unknown = IssueId::generate().to_string();
        let reply = update_issue(
            &state,
            "apitest",
            fields(json!({"_id": unknown, "issue_text": "x"})),
        )
        .await;
        assert_eq!(reply, Reply::error_for(UPDATE_FAILED, unknown));

        let reply = update_issue(
            &state,
            "apitest",
            fields(json!({"_id": "invalid", "issue_text": "x"})),
        )
        .await;
        assert_eq!(reply, Reply::error_for(UPDATE_FAILED, "invalid".to_string()));
        assert!(list(&state, "apitest", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let state = memory_state();
        let issue = create(&state, "apitest", minimal()).await;
        let id = issue.id.to_string();

        let reply = delete_issue(&state, "apitest", fields(json!({"_id": id}))).await;
        assert_eq!(reply, Reply::result(DELETED, id.clone()));
        let reply = delete_issue(&state, "apitest", fields(json!({"_id": id}))).await;
        assert_eq!(reply, Reply::error_for(DELETE_FAILED, id));
    }

    #[tokio::test]
    async fn test_delete_missing_id() {
        let (state, store) = broken_state();
        let reply = delete_issue(&state, "apitest", fields(json!({"_id": ""}))).await;
        assert_eq!(reply, Reply::error(MISSING_ID));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failures_become_generic_errors() {
        let (state, store) = broken_state();
        let id = IssueId::generate().to_string();

        assert_eq!(
            list_issues(&state, "apitest", None).await,
            Reply::error(FETCH_FAILED)
        );
        assert_eq!(
            create_issue(&state, "apitest", fields(minimal())).await,
            Reply::error(SAVE_FAILED)
        );
        assert_eq!(
            update_issue(
                &state,
                "apitest",
                fields(json!({"_id": id, "issue_text": "x"}))
            )
            .await,
            Reply::error_for(UPDATE_FAILED, id.clone())
        );
        assert_eq!(
            delete_issue(&state, "apitest", fields(json!({"_id": id}))).await,
            Reply::error_for(DELETE_FAILED, id)
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 4);
    }
}
