//! Cursor-following aggregation over a page-fetch collaborator.

use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};

/// Largest page size the store accepts per request.
pub const MAX_PAGE_SIZE: usize = 100;

/// One page as returned by a fetch call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Aggregated results of [`collect_all_pages`].
///
/// `has_more`/`next_cursor` describe where fetching stopped. When
/// `truncated_by_cap` is set they only mean the cap was reached; more data
/// upstream is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectedPages<T> {
    pub results: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub truncated_by_cap: bool,
}

pub fn validate_page_size(page_size: usize) -> Result<usize> {
    match page_size {
        0 => Ok(MAX_PAGE_SIZE),
        size if size <= MAX_PAGE_SIZE => Ok(size),
        size => Err(Error::config_with_hint(
            format!("page size {size} exceeds the maximum of {MAX_PAGE_SIZE}"),
            "use --limit to cap the total number of results instead",
        )),
    }
}

/// Calls `fetch(cursor, page_size)` until the store reports no more pages or
/// `cap` results (when non-zero) have been gathered. A fetch error aborts the
/// whole collection; partial results are dropped.
pub fn collect_all_pages<T, F>(
    start_cursor: Option<String>,
    page_size: usize,
    cap: usize,
    mut fetch: F,
) -> Result<CollectedPages<T>>
where
    F: FnMut(Option<&str>, usize) -> anyhow::Result<Page<T>>,
{
    let page_size = validate_page_size(page_size)?;
    let mut results = Vec::new();
    let mut cursor = start_cursor.filter(|c| !c.is_empty());
    let mut requests = 0usize;

    loop {
        let request_size = if cap > 0 {
            page_size.min(cap - results.len())
        } else {
            page_size
        };
        requests += 1;
        debug!(
            "Fetching page {requests} (cursor {:?}, size {request_size})",
            cursor.as_deref()
        );
        let page = fetch(cursor.as_deref(), request_size)
            .map_err(|err| Error::upstream(format!("fetching page {requests}"), err))?;

        results.extend(page.results);
        cursor = page.next_cursor.filter(|c| !c.is_empty());
        let upstream_more = page.has_more && cursor.is_some();

        if cap > 0 && results.len() >= cap {
            let truncated = results.len() > cap || upstream_more;
            results.truncate(cap);
            return Ok(CollectedPages {
                results,
                next_cursor: cursor,
                has_more: upstream_more,
                truncated_by_cap: truncated,
            });
        }
        if !upstream_more {
            return Ok(CollectedPages {
                results,
                next_cursor: None,
                has_more: false,
                truncated_by_cap: false,
            });
        }
    }
}
