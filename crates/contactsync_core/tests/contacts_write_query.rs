use contactsync_core::{
    ContactService, FlagStore, InMemoryRemoteStore, MemoryFlagStore, RemoteRecord, RemoteStore,
    StoreErrorKind, StoreOperation, SyncConfig, SyncError, ZoneId, ZoneProvisioner,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

async fn provisioned(store: InMemoryRemoteStore) -> (Arc<InMemoryRemoteStore>, ContactService) {
    let store = Arc::new(store);
    let flags: Arc<dyn FlagStore> = Arc::new(MemoryFlagStore::new());
    let config = SyncConfig::default();
    ZoneProvisioner::new(store.clone(), flags, &config)
        .ensure_contacts_zone_once()
        .await
        .expect("zone");
    let service = ContactService::new(store.clone(), &config);
    (store, service)
}

#[tokio::test]
async fn save_then_filter_and_list_scenario() {
    let (_store, service) = provisioned(InMemoryRemoteStore::new()).await;

    let outcome = service
        .save_contacts(&names(&["Madi", "Simon", "Bob"]))
        .await
        .expect("save");
    assert_eq!(outcome.record_ids.len(), 3);
    assert!(!outcome.is_partial());
    let unique = outcome.record_ids.iter().collect::<HashSet<_>>();
    assert_eq!(unique.len(), 3);

    let filtered = service.get_contact_names(Some("M")).await.expect("query");
    assert_eq!(filtered, vec!["Madi".to_string()]);

    let all = service.get_contact_names(None).await.expect("full read");
    for name in ["Madi", "Simon", "Bob"] {
        assert_eq!(all.iter().filter(|value| value.as_str() == name).count(), 1);
    }
}

#[tokio::test]
async fn duplicate_names_produce_duplicate_records() {
    let (store, service) = provisioned(InMemoryRemoteStore::new()).await;

    service.save_contacts(&names(&["Madi"])).await.expect("save 1");
    service.save_contacts(&names(&["Madi"])).await.expect("save 2");

    let all = service.get_all_contact_names().await.expect("full read");
    assert_eq!(all, names(&["Madi", "Madi"]));
    assert_eq!(store.record_count(&ZoneId::new("Contacts")), 2);
}

#[tokio::test]
async fn prefix_query_is_case_sensitive_and_anchored() {
    let (_store, service) = provisioned(InMemoryRemoteStore::new()).await;
    service
        .save_contacts(&names(&["Madi", "madison", "Emma", "Max"]))
        .await
        .expect("save");

    let hits = service.query_contact_names("Ma").await.expect("query");
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|name| name.starts_with("Ma")));

    let none = service.query_contact_names("Zed").await.expect("empty query");
    assert!(none.is_empty());
}

#[tokio::test]
async fn empty_prefix_reads_whole_zone() {
    let (store, service) = provisioned(InMemoryRemoteStore::new()).await;
    service
        .save_contacts(&names(&["Madi", "Bob"]))
        .await
        .expect("save");

    let all = service.get_contact_names(Some("")).await.expect("full read");
    assert_eq!(all.len(), 2);
    assert_eq!(store.call_count(StoreOperation::QueryRecords), 0);
    assert_eq!(store.call_count(StoreOperation::FetchZoneChanges), 1);
}

#[tokio::test]
async fn full_read_pages_through_change_feed_in_order() {
    let (store, service) =
        provisioned(InMemoryRemoteStore::new().with_page_size(2)).await;
    let input = names(&["a", "b", "c", "d", "e"]);
    service.save_contacts(&input).await.expect("save");

    let all = service.get_all_contact_names().await.expect("full read");
    assert_eq!(all, input);

    let tokens = store.presented_tokens();
    assert_eq!(tokens.len(), 3);
    assert!(tokens[0].is_none());
    assert_eq!(tokens[1].as_ref().map(|t| t.as_str()), Some("Contacts:2"));
    assert_eq!(tokens[2].as_ref().map(|t| t.as_str()), Some("Contacts:4"));
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    let (store, service) = provisioned(InMemoryRemoteStore::new()).await;
    let zone = ZoneId::new("Contacts");
    store
        .insert_raw(&zone, RemoteRecord::new("Contact").with_field("name", 7))
        .unwrap();
    store
        .insert_raw(&zone, RemoteRecord::new("Contact"))
        .unwrap();
    service.save_contacts(&names(&["Bob"])).await.expect("save");

    let all = service.get_all_contact_names().await.expect("full read");
    assert_eq!(all, names(&["Bob"]));
}

#[tokio::test]
async fn partial_failure_returns_persisted_subset() {
    let store = InMemoryRemoteStore::new().with_rejection_rule(|record| {
        (record.string_field("name") == Some("Simon")).then_some(StoreErrorKind::PermissionDenied)
    });
    let (_store, service) = provisioned(store).await;

    let outcome = service
        .save_contacts(&names(&["Madi", "Simon", "Bob"]))
        .await
        .expect("partial failure is not an error");
    assert_eq!(outcome.record_ids.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 1);
    assert_eq!(outcome.failures[0].kind, StoreErrorKind::PermissionDenied);
}

#[tokio::test]
async fn total_save_failure_propagates_without_ids() {
    let (store, service) = provisioned(InMemoryRemoteStore::new()).await;
    store.fail_next(StoreOperation::SaveRecords, StoreErrorKind::Other);

    let err = service
        .save_contacts(&names(&["Madi"]))
        .await
        .expect_err("total failure");
    assert!(matches!(err, SyncError::Batch(_)));
    assert_eq!(store.record_count(&ZoneId::new("Contacts")), 0);
}

#[tokio::test]
async fn auth_failure_during_query_is_classified() {
    let (store, service) = provisioned(InMemoryRemoteStore::new()).await;
    store.fail_next(StoreOperation::QueryRecords, StoreErrorKind::NotAuthenticated);

    let err = service
        .query_contact_names("M")
        .await
        .expect_err("auth failure");
    assert!(matches!(err, SyncError::Auth(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn writes_become_visible_after_settling_delay() {
    let lag = Duration::from_millis(50);
    let (_store, service) = provisioned(InMemoryRemoteStore::new().with_index_lag(lag)).await;
    service.save_contacts(&names(&["Madi"])).await.expect("save");

    let immediate = service.get_contact_names(Some("M")).await.expect("query");
    assert!(immediate.is_empty());

    tokio::time::sleep(lag * 3).await;
    let settled = service.get_contact_names(Some("M")).await.expect("query");
    assert_eq!(settled, names(&["Madi"]));
}

#[tokio::test]
async fn queries_before_zone_exists_fail() {
    let store = Arc::new(InMemoryRemoteStore::new());
    let service = ContactService::new(store.clone(), &SyncConfig::default());

    let err = service
        .get_all_contact_names()
        .await
        .expect_err("zone missing");
    let store_err = err.store_error().expect("store error");
    assert_eq!(store_err.kind, StoreErrorKind::ZoneNotFound);
    assert!(!store.has_zone(&ZoneId::new("Contacts")));

    store.ensure_zone(&ZoneId::new("Contacts")).await.unwrap();
    assert!(service.get_all_contact_names().await.unwrap().is_empty());
}
