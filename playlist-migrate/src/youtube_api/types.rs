//! Shared response envelope and pagination for the YouTube API client.

use serde::Deserialize;
use std::future::Future;

/// Largest page size any list endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

/// The envelope every `*.list` endpoint wraps its resources in.
///
/// Some endpoints (e.g. `captions.list`) omit paging fields entirely, so everything but `items`
/// is optional.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    /// Identifies the API resource's type, e.g. `youtube#playlistItemListResponse`.
    #[serde(default)]
    pub kind: String,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    /// Pass as `pageToken` to fetch the next page. Absent on the last page.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Paging details for lists of resources.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Clone, Copy, serde::Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "totalResults")]
    pub total_results: u32,
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
}

/// Follows `nextPageToken` until the last page and returns every item in order.
///
/// `fetch` is called with `None` for the first page and with the previous page's token after
/// that. Only forward pagination is supported. The first failing page aborts the walk.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> eyre::Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = eyre::Result<ListResponse<T>>>,
{
    let mut all = Vec::new();
    let mut page_token = None;
    loop {
        let page = fetch(page_token.take()).await?;
        all.extend(page.items);
        match page.next_page_token {
            Some(next) if !next.is_empty() => page_token = Some(next),
            _ => return Ok(all),
        }
    }
}
