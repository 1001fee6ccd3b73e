//! Cursor-paginated identifier enumeration.

use std::collections::HashSet;

use futures_core::Stream;
use futures_util::TryStreamExt;
use tracing::{debug, trace, warn};

use crate::error::{Error, ProtocolError};
use crate::query::Wiql;
use crate::traits::WorkItemApi;
use crate::types::{ContinuationToken, ExternalId, SourceQuery};
use crate::Result;

/// Identifiers requested per query page.
pub const DEFAULT_PAGE_SIZE: u32 = 2000;

/// Lazily yields the identifiers matching a [`SourceQuery`].
///
/// The sequence is finite, forward-only and strictly ascending. It cannot be
/// resumed; a new enumerator starts again from the first page.
pub struct IdEnumerator<'a, A: ?Sized> {
    api: &'a A,
    query: Wiql,
    page_size: u32,
}

impl<'a, A> IdEnumerator<'a, A>
where
    A: WorkItemApi + ?Sized,
{
    pub fn new(api: &'a A, query: &SourceQuery) -> Self {
        Self {
            query: Wiql::select_ids(api.project(), query),
            api,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the page-size hint sent with each query.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The query submitted on every page.
    pub fn query(&self) -> &Wiql {
        &self.query
    }

    /// Stream identifiers, following continuation cursors until exhausted.
    ///
    /// Any page failure ends the stream with [`Error::Enumeration`]; callers
    /// must discard what was already yielded.
    pub fn ids(self) -> impl Stream<Item = Result<ExternalId>> + Send + 'a {
        async_stream::try_stream! {
            let mut continuation: Option<ContinuationToken> = None;
            let mut sent: HashSet<ContinuationToken> = HashSet::new();
            let mut last: Option<ExternalId> = None;
            let mut pages = 0usize;

            loop {
                let page = self
                    .api
                    .query_ids(&self.query, self.page_size, continuation.as_ref())
                    .await
                    .map_err(|e| Error::enumeration(pages, e))?;
                pages += 1;
                trace!(page = pages, ids = page.ids.len(), "identifier page");

                for id in page.ids {
                    if last.is_some_and(|prev| id <= prev) {
                        warn!(%id, previous = %last.unwrap_or(id), "dropping out-of-order identifier");
                        continue;
                    }
                    last = Some(id);
                    yield id;
                }

                match page.continuation {
                    Some(next) if sent.contains(&next) => {
                        Err::<(), _>(Error::enumeration(
                            pages,
                            ProtocolError::new(
                                "query continuation",
                                format!("server repeated cursor '{}'", next),
                            )
                            .into(),
                        ))?;
                    }
                    Some(next) => {
                        sent.insert(next.clone());
                        continuation = Some(next);
                    }
                    None => break,
                }
            }

            debug!(pages, "enumeration complete");
        }
    }

    /// Drain the stream into one vector, or fail as a whole.
    pub async fn collect_all(self) -> Result<Vec<ExternalId>> {
        self.ids().try_collect().await
    }
}
