//! REST-backed work-item API.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use workmirror_core::error::{InvalidInputError, ProtocolError};
use workmirror_core::sync::MAX_CHUNK_SIZE;
use workmirror_core::types::API_VERSION;
use workmirror_core::{
    ApiBase, ContinuationToken, Credential, ExternalId, IdPage, RemoteRecord, Result, WorkItemApi,
    Wiql,
};

use crate::http::endpoints::*;
use crate::http::transport::RetryingTransport;

/// Work-item API for one organization and project, bound to one credential.
#[derive(Debug, Clone)]
pub struct RemoteApi {
    base: ApiBase,
    credential: Credential,
    transport: RetryingTransport,
}

impl RemoteApi {
    pub fn with_transport(base: ApiBase, credential: Credential, transport: RetryingTransport) -> Self {
        Self {
            base,
            credential,
            transport,
        }
    }

    pub fn organization(&self) -> &str {
        self.credential.organization()
    }

    fn url(&self, resource: &str) -> Url {
        self.base
            .wit_url(self.credential.organization(), self.credential.project(), resource)
    }
}

#[async_trait]
impl WorkItemApi for RemoteApi {
    fn project(&self) -> &str {
        self.credential.project()
    }

    #[instrument(skip(self, query), fields(org = %self.organization(), project = %self.project()))]
    async fn query_ids(
        &self,
        query: &Wiql,
        page_size: u32,
        continuation: Option<&ContinuationToken>,
    ) -> Result<IdPage> {
        let url = self.url(WIQL);
        let text = query.to_string();
        let body = WiqlRequest { query: &text };
        let top = page_size.to_string();
        let token = self.credential.access_token().as_str();

        let mut params = vec![("api-version", API_VERSION), ("$top", top.as_str())];
        if let Some(cursor) = continuation {
            params.push(("continuationToken", cursor.as_str()));
        }

        debug!(wiql = %text, has_cursor = continuation.is_some(), "submitting query");
        let response = self
            .transport
            .send(|http| {
                http.post(url.clone())
                    .basic_auth("", Some(token))
                    .header(ACCEPT, "application/json")
                    .query(&params)
                    .json(&body)
            })
            .await?;

        let page: WiqlResponse = decode(response, "wiql response").await?;
        Ok(IdPage {
            ids: page
                .work_items
                .into_iter()
                .map(|item| ExternalId::new(item.id))
                .collect(),
            continuation: ContinuationToken::from_raw(page.continuation_token),
        })
    }

    #[instrument(skip(self, ids), fields(org = %self.organization(), ids = ids.len()))]
    async fn fetch_work_items(&self, ids: &[ExternalId]) -> Result<Vec<RemoteRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_CHUNK_SIZE {
            return Err(InvalidInputError::Other {
                message: format!(
                    "{} ids requested in one call; the limit is {}",
                    ids.len(),
                    MAX_CHUNK_SIZE
                ),
            }
            .into());
        }

        let url = self.url(WORK_ITEMS);
        let joined = join_ids(ids);
        let token = self.credential.access_token().as_str();
        let params = [
            ("ids", joined.as_str()),
            ("api-version", API_VERSION),
            ("$expand", "all"),
        ];

        let response = self
            .transport
            .send(|http| {
                http.get(url.clone())
                    .basic_auth("", Some(token))
                    .header(ACCEPT, "application/json")
                    .query(&params)
            })
            .await?;

        let items: WorkItemsResponse = decode(response, "work items response").await?;
        Ok(items
            .value
            .into_iter()
            .map(|item| RemoteRecord::new(item.id, item.fields))
            .collect())
    }
}

async fn decode<T: DeserializeOwned>(response: Response, context: &'static str) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| ProtocolError::new(context, format!("failed to read body: {}", e)))?;
    serde_json::from_slice(&body).map_err(|e| ProtocolError::new(context, e.to_string()).into())
}
