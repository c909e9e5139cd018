use async_trait::async_trait;
use contactsync_core::{
    BatchOutcome, ChangePage, ChangeToken, Contact, ContactService, RecordPredicate, RemoteRecord,
    RemoteStore, StoreError, StoreErrorKind, StoreOperation, StoreResult, SyncConfig, SyncError,
    ZoneId,
};
use std::sync::{Arc, Mutex};

/// Serves a fixed list of pages and checks every token it is handed.
struct ScriptedFeed {
    pages: Vec<Vec<RemoteRecord>>,
    stuck_token: bool,
    /// Token handed out after the last page instead of finishing.
    wrap_to: Option<usize>,
    requests: Mutex<Vec<Option<String>>>,
}

impl ScriptedFeed {
    fn new(pages: Vec<Vec<&str>>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|names| {
                    names
                        .into_iter()
                        .map(|name| Contact::new(name).to_record())
                        .collect()
                })
                .collect(),
            stuck_token: false,
            wrap_to: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }
}

fn unsupported(operation: StoreOperation) -> StoreError {
    StoreError::new(StoreErrorKind::Other, operation, "not scripted")
}

#[async_trait]
impl RemoteStore for ScriptedFeed {
    async fn ensure_zone(&self, _zone: &ZoneId) -> StoreResult<()> {
        Ok(())
    }

    async fn save_records(
        &self,
        _zone: &ZoneId,
        _records: Vec<RemoteRecord>,
    ) -> StoreResult<BatchOutcome> {
        Err(unsupported(StoreOperation::SaveRecords))
    }

    async fn query_records(
        &self,
        _zone: &ZoneId,
        _record_type: &str,
        _predicate: &RecordPredicate,
    ) -> StoreResult<Vec<RemoteRecord>> {
        Err(unsupported(StoreOperation::QueryRecords))
    }

    async fn fetch_zone_changes(
        &self,
        _zone: &ZoneId,
        since: Option<&ChangeToken>,
    ) -> StoreResult<ChangePage> {
        let mut requests = self.requests.lock().unwrap();
        let expected = requests.len();
        requests.push(since.map(|token| token.as_str().to_string()));

        let index = match since {
            None => 0,
            Some(token) => token.as_str().parse::<usize>().unwrap(),
        };
        let replays = self.stuck_token || self.wrap_to.is_some();
        if index != expected && !replays {
            return Err(StoreError::new(
                StoreErrorKind::UnknownItem,
                StoreOperation::FetchZoneChanges,
                "token presented out of order",
            ));
        }

        let next = if self.stuck_token { index } else { index + 1 };
        let (next, has_more) = match self.wrap_to {
            Some(wrapped) if next >= self.pages.len() => (wrapped, true),
            _ => (next, next < self.pages.len() || self.stuck_token),
        };
        Ok(ChangePage {
            records: self.pages.get(index).cloned().unwrap_or_default(),
            next_token: ChangeToken::new(next.to_string()),
            has_more,
        })
    }
}

#[tokio::test]
async fn union_of_all_pages_is_returned_in_order() {
    let feed = Arc::new(ScriptedFeed::new(vec![
        vec!["Madi", "Simon"],
        vec![],
        vec!["Bob"],
        vec!["Ana", "Zoe", "Eli"],
    ]));
    let service = ContactService::new(feed.clone(), &SyncConfig::default());

    let names = service.get_all_contact_names().await.expect("full read");
    assert_eq!(names, vec!["Madi", "Simon", "Bob", "Ana", "Zoe", "Eli"]);
    assert_eq!(
        feed.requests(),
        vec![
            None,
            Some("1".to_string()),
            Some("2".to_string()),
            Some("3".to_string())
        ]
    );
}

#[tokio::test]
async fn single_page_needs_one_request() {
    let feed = Arc::new(ScriptedFeed::new(vec![vec!["Madi"]]));
    let service = ContactService::new(feed.clone(), &SyncConfig::default());

    let names = service.get_all_contact_names().await.expect("full read");
    assert_eq!(names, vec!["Madi"]);
    assert_eq!(feed.requests(), vec![None]);
}

#[tokio::test]
async fn non_advancing_token_aborts_instead_of_looping() {
    let mut feed = ScriptedFeed::new(vec![vec!["Madi"], vec!["Bob"]]);
    feed.stuck_token = true;
    let feed = Arc::new(feed);
    let service = ContactService::new(feed.clone(), &SyncConfig::default());

    let err = service
        .get_all_contact_names()
        .await
        .expect_err("stuck feed must fail");
    assert!(matches!(err, SyncError::Query(_)));
    assert_eq!(feed.requests().len(), 2);
}

#[tokio::test]
async fn cycling_tokens_abort_instead_of_looping() {
    let mut feed = ScriptedFeed::new(vec![vec!["Madi"], vec!["Bob"]]);
    feed.wrap_to = Some(0);
    let feed = Arc::new(feed);
    let service = ContactService::new(feed.clone(), &SyncConfig::default());

    let err = service
        .get_all_contact_names()
        .await
        .expect_err("cycling feed must fail");
    assert!(matches!(err, SyncError::Query(_)));
    assert_eq!(
        feed.requests(),
        vec![None, Some("1".to_string()), Some("0".to_string())]
    );
}
