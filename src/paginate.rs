//! Cursor pagination for the v3 search endpoints.
//!
//! A page response carries its items plus a `pagination` object. While
//! `pagination.next` is non-empty, the same endpoint is called again with a
//! body of exactly `{"next": "<token>"}`.

use std::future::Future;

use serde::{de::DeserializeOwned, Deserialize};

use crate::{CancelToken, Executor, PreparedRequest, Result};

/// Pagination descriptor returned by multi-page endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    /// Opaque cursor; empty when there are no further pages.
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub next: String,
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub limit: u64,
    #[serde(default, deserialize_with = "crate::types::null_as_default")]
    pub total: u64,
}

/// One page of results and the cursor for the following page.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: String,
}

/// A decoded page envelope.
pub trait Paginated {
    type Item;

    fn into_page(self) -> Page<Self::Item>;
}

/// Calls `fetch` with no cursor, then with each returned cursor, until a page
/// reports an empty cursor. Items are concatenated in arrival order.
///
/// There is no page limit: a backend that never returns an empty cursor keeps
/// this looping. Any page error discards what was collected so far.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = None;

    loop {
        let page = fetch(cursor.take()).await?;
        items.extend(page.items);

        #[cfg(feature = "tracing")]
        tracing::debug!(items = items.len(), more = !page.next.is_empty(), "fetched page");

        if page.next.is_empty() {
            return Ok(items);
        }
        cursor = Some(page.next);
    }
}

/// Builds the follow-up request for `cursor`: same method, URL and headers as
/// `first`, body replaced by `{"next": cursor}`.
pub fn next_page_request(first: &PreparedRequest, cursor: &str) -> Result<PreparedRequest> {
    PreparedRequest {
        body: None,
        ..first.clone()
    }
    .with_json(&serde_json::json!({ "next": cursor }))
}

/// Runs `first` and every follow-up page through `executor`, decoding each
/// response as `E`.
pub async fn paginate<E>(
    executor: &Executor,
    first: &PreparedRequest,
    cancel: &CancelToken,
) -> Result<Vec<E::Item>>
where
    E: Paginated + DeserializeOwned,
{
    collect_pages(move |cursor| async move {
        let envelope: E = match cursor {
            None => executor.execute(first, cancel).await?,
            Some(cursor) => {
                let request = next_page_request(first, &cursor)?;
                executor.execute(&request, cancel).await?
            }
        };
        Ok(envelope.into_page())
    })
    .await
}
