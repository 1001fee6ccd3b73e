//! Integration tests for the filesystem mirror store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{Map, Value, json};
use tempfile::TempDir;

use workmirror_core::{
    Collection, ConvergenceEngine, ExternalId, MirrorStore, RemoteRecord, UpsertOutcome,
};
use workmirror_file::FileStore;

fn setup() -> (TempDir, FileStore) {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    (dir, store)
}

fn collection(name: &str) -> Collection {
    Collection::new(name).unwrap()
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn doc(id: u64, title: &str, state: &str) -> Map<String, Value> {
    fields(json!({
        "external_id": id,
        "title": title,
        "state": state,
        "last_synced_at": "2026-03-01T12:00:00Z"
    }))
}

#[tokio::test]
async fn test_upsert_inserts_then_updates() {
    let (_dir, store) = setup();
    let c = collection("mk_feature_requests");
    let id = ExternalId::new(101);

    let first = store.upsert(&c, id, doc(101, "Export", "New")).await.unwrap();
    let second = store.upsert(&c, id, doc(101, "Export to CSV", "Active")).await.unwrap();

    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Updated);

    let stored = store.get(&c, id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Export to CSV");
    assert_eq!(stored.state, "Active");
}

#[tokio::test]
async fn test_upsert_preserves_unrelated_fields() {
    let (_dir, store) = setup();
    let c = collection("mk_feature_requests");
    let id = ExternalId::new(7);

    let mut annotated = doc(7, "Dark mode", "New");
    annotated.insert("priority".into(), json!("high"));
    store.upsert(&c, id, annotated).await.unwrap();
    store.upsert(&c, id, doc(7, "Dark mode", "Done")).await.unwrap();

    let stored = store.get(&c, id).await.unwrap().unwrap();
    assert_eq!(stored.state, "Done");
    assert_eq!(stored.extra.get("priority"), Some(&json!("high")));
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let (_dir, store) = setup();
    let found = store
        .get(&collection("epics"), ExternalId::new(1))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_list_is_ascending_by_id() {
    let (_dir, store) = setup();
    let c = collection("epics");

    for id in [10u64, 9, 100, 1] {
        store
            .upsert(&c, ExternalId::new(id), doc(id, "t", "New"))
            .await
            .unwrap();
    }

    let ids: Vec<u64> = store
        .list(&c)
        .await
        .unwrap()
        .iter()
        .map(|d| d.external_id.get())
        .collect();
    assert_eq!(ids, vec![1, 9, 10, 100]);
}

#[tokio::test]
async fn test_list_of_unknown_collection_is_empty() {
    let (_dir, store) = setup();
    assert!(store.list(&collection("nothing")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_collections_are_separate() {
    let (_dir, store) = setup();
    let id = ExternalId::new(5);

    store
        .upsert(&collection("a"), id, doc(5, "in a", "New"))
        .await
        .unwrap();

    assert!(store.get(&collection("b"), id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_skips_corrupt_documents() {
    let (dir, store) = setup();
    let c = collection("epics");
    store
        .upsert(&c, ExternalId::new(1), doc(1, "ok", "New"))
        .await
        .unwrap();
    std::fs::write(dir.path().join("collections/epics/2.json"), "{not json").unwrap();

    let docs = store.list(&c).await.unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn test_upsert_repairs_corrupt_document() {
    let (dir, store) = setup();
    let store = Arc::new(store);
    let c = collection("epics");
    let engine = ConvergenceEngine::new(store.clone(), c.clone());

    std::fs::create_dir_all(dir.path().join("collections/epics")).unwrap();
    std::fs::write(dir.path().join("collections/epics/2.json"), "{not json").unwrap();

    let records: Vec<RemoteRecord> = (1..=3u64)
        .map(|id| {
            RemoteRecord::new(
                id,
                fields(json!({"System.Title": format!("Epic {}", id), "System.State": "New"})),
            )
        })
        .collect();

    assert_eq!(engine.reconcile(&records).await.unwrap(), 3);

    let repaired = store.get(&c, ExternalId::new(2)).await.unwrap().unwrap();
    assert_eq!(repaired.title, "Epic 2");
    let third = store.get(&c, ExternalId::new(3)).await.unwrap().unwrap();
    assert_eq!(third.title, "Epic 3");
    assert_eq!(store.list(&c).await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_of_distinct_keys() {
    let (_dir, store) = setup();
    let store = Arc::new(store);
    let c = collection("mk_feature_requests");

    let tasks: Vec<_> = (1..=40u64)
        .map(|id| {
            let store = store.clone();
            let c = c.clone();
            tokio::spawn(async move {
                store
                    .upsert(&c, ExternalId::new(id), doc(id, "t", "New"))
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.list(&c).await.unwrap().len(), 40);
}

#[tokio::test]
async fn test_convergence_into_file_store_is_idempotent() {
    let (_dir, store) = setup();
    let store = Arc::new(store);
    let c = collection("mk_feature_requests");
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let engine =
        ConvergenceEngine::new(store.clone(), c.clone()).with_clock(Arc::new(move || at));

    let records: Vec<RemoteRecord> = [(101u64, "Export"), (102, "Dark mode")]
        .into_iter()
        .map(|(id, title)| {
            RemoteRecord::new(
                id,
                fields(json!({"System.Title": title, "System.State": "New"})),
            )
        })
        .collect();

    assert_eq!(engine.reconcile(&records).await.unwrap(), 2);
    let before = store.list(&c).await.unwrap();
    assert_eq!(engine.reconcile(&records).await.unwrap(), 2);
    let after = store.list(&c).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after[0].last_synced_at, at);
}
