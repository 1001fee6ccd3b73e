#![cfg(test)]

//! In-memory doubles for the remote API and the local store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::{Error, StoreError, TransportError};
use crate::query::Wiql;
use crate::record::{MirrorDocument, RemoteRecord};
use crate::traits::{IdPage, MirrorStore, UpsertOutcome, WorkItemApi};
use crate::types::{Collection, ContinuationToken, ExternalId};
use crate::Result;

pub(crate) fn ids(raw: &[u64]) -> Vec<ExternalId> {
    raw.iter().copied().map(ExternalId::new).collect()
}

pub(crate) fn transport_503() -> Error {
    Error::Transport(TransportError::Status {
        status: 503,
        message: None,
        attempts: 5,
    })
}

pub(crate) fn record(id: u64, title: &str, state: &str) -> RemoteRecord {
    serde_json::from_value(json!({
        "id": id,
        "fields": { "System.Title": title, "System.State": state }
    }))
    .unwrap()
}

/// Scripted remote: pages are chained with `page-N` cursors and every
/// fetched id gets a record titled `Item <id>`.
#[derive(Default)]
pub(crate) struct MockApi {
    pages: Vec<Vec<u64>>,
    fail_query_page: Option<usize>,
    fail_fetch_call: Option<usize>,
    loop_back_to: Option<usize>,
    untitled: HashSet<u64>,
    pub queries: Mutex<Vec<(String, u32, Option<String>)>>,
    pub fetches: Mutex<Vec<Vec<ExternalId>>>,
    fetch_count: AtomicUsize,
}

impl MockApi {
    pub(crate) fn with_pages(pages: Vec<Vec<u64>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Fail the query for the given 0-indexed page.
    pub(crate) fn failing_query_page(mut self, page: usize) -> Self {
        self.fail_query_page = Some(page);
        self
    }

    /// Fail the given 0-indexed fetch call.
    pub(crate) fn failing_fetch_call(mut self, call: usize) -> Self {
        self.fail_fetch_call = Some(call);
        self
    }

    /// After the last page, hand out the cursor for `page` again.
    pub(crate) fn looping_back_to(mut self, page: usize) -> Self {
        self.loop_back_to = Some(page);
        self
    }

    /// Return these ids without a title field.
    pub(crate) fn untitled(mut self, ids: &[u64]) -> Self {
        self.untitled.extend(ids);
        self
    }

    pub(crate) fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub(crate) fn fetch_calls(&self) -> Vec<Vec<ExternalId>> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkItemApi for MockApi {
    fn project(&self) -> &str {
        "Fabrikam"
    }

    async fn query_ids(
        &self,
        query: &Wiql,
        page_size: u32,
        continuation: Option<&ContinuationToken>,
    ) -> Result<IdPage> {
        self.queries.lock().unwrap().push((
            query.to_string(),
            page_size,
            continuation.map(|c| c.as_str().to_string()),
        ));

        let index = match continuation {
            None => 0,
            Some(token) => token
                .as_str()
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .expect("mock only issues page-N cursors"),
        };

        if self.fail_query_page == Some(index) {
            return Err(transport_503());
        }

        let ids = self.pages.get(index).cloned().unwrap_or_default();
        let next = if index + 1 < self.pages.len() {
            Some(index + 1)
        } else {
            self.loop_back_to
        };
        let continuation = next.and_then(|n| ContinuationToken::from_raw(Some(format!("page-{}", n))));

        Ok(IdPage {
            ids: ids.into_iter().map(ExternalId::new).collect(),
            continuation,
        })
    }

    async fn fetch_work_items(&self, ids: &[ExternalId]) -> Result<Vec<RemoteRecord>> {
        let call = self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.fetches.lock().unwrap().push(ids.to_vec());

        if self.fail_fetch_call == Some(call) {
            return Err(transport_503());
        }

        Ok(ids
            .iter()
            .map(|id| {
                let mut fields = Map::new();
                if !self.untitled.contains(&id.get()) {
                    fields.insert("System.Title".into(), json!(format!("Item {}", id)));
                }
                fields.insert("System.State".into(), json!("Active"));
                RemoteRecord::new(*id, fields)
            })
            .collect())
    }
}

/// Map-backed store with the same merge semantics as the file store.
#[derive(Default)]
pub(crate) struct MemoryStore {
    docs: Mutex<BTreeMap<(String, ExternalId), Map<String, Value>>>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub(crate) fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    /// Set a field outside the projection, as a local consumer might.
    pub(crate) fn annotate(&self, collection: &Collection, id: ExternalId, key: &str, value: Value) {
        let mut docs = self.docs.lock().unwrap();
        docs.entry((collection.as_str().to_string(), id))
            .or_default()
            .insert(key.to_string(), value);
    }

    pub(crate) fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }
}

#[async_trait]
impl MirrorStore for MemoryStore {
    async fn upsert(
        &self,
        collection: &Collection,
        id: ExternalId,
        fields: Map<String, Value>,
    ) -> Result<UpsertOutcome> {
        if self.fail_writes {
            return Err(StoreError::Io {
                message: "disk full".to_string(),
            }
            .into());
        }

        let mut docs = self.docs.lock().unwrap();
        let key = (collection.as_str().to_string(), id);
        let outcome = if docs.contains_key(&key) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        docs.entry(key).or_default().extend(fields);
        Ok(outcome)
    }

    async fn get(
        &self,
        collection: &Collection,
        id: ExternalId,
    ) -> Result<Option<MirrorDocument>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .get(&(collection.as_str().to_string(), id))
            .map(|doc| serde_json::from_value(Value::Object(doc.clone())).unwrap()))
    }

    async fn list(&self, collection: &Collection) -> Result<Vec<MirrorDocument>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .filter(|((c, _), _)| c == collection.as_str())
            .map(|(_, doc)| serde_json::from_value(Value::Object(doc.clone())).unwrap())
            .collect())
    }
}
