//! Page-by-page aggregation of listing endpoints.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::Result;

/// Accumulates pages until a target count is reached or the listing runs dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    target: usize,
    page_size: Option<usize>,
}

impl Paginator {
    /// Listing whose full pages always hold `page_size` items; a shorter page ends the listing.
    #[must_use]
    pub fn fixed(target: usize, page_size: usize) -> Self {
        Self {
            target,
            page_size: Some(page_size),
        }
    }

    /// Listing whose page size varies; only an empty page ends the listing.
    #[must_use]
    pub fn variable(target: usize) -> Self {
        Self {
            target,
            page_size: None,
        }
    }

    fn is_exhausted(&self, page_len: usize) -> bool {
        match self.page_size {
            Some(size) => page_len < size,
            None => page_len == 0,
        }
    }

    /// Fetch pages `1, 2, ...` until enough items are collected.
    ///
    /// Returns exactly `target` items when the listing had enough, otherwise everything it had.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by `fetch_page`; nothing collected so far is returned.
    pub async fn collect<T, F, Fut>(&self, mut fetch_page: F) -> Result<Vec<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let mut items = Vec::new();
        let mut page = 1u32;

        while items.len() < self.target {
            let batch = fetch_page(page).await?;
            let batch_len = batch.len();
            items.extend(batch);
            debug!(page, batch_len, collected = items.len(), target = self.target, "Fetched page");

            if items.len() < self.target && self.is_exhausted(batch_len) {
                debug!(page, collected = items.len(), "Listing exhausted before target");
                return Ok(items);
            }
            page += 1;
        }

        items.truncate(self.target);
        Ok(items)
    }
}

/// Fetch exactly `pages` pages and concatenate them.
///
/// # Errors
///
/// Returns the first error raised by `fetch_page`.
pub async fn collect_pages<T, F, Fut>(pages: u32, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    for page in 1..=pages {
        items.extend(fetch_page(page).await?);
    }
    Ok(items)
}

/// Clamp a requested count to what the platform reports as available.
pub fn clamp_target(requested: usize, max: usize, what: &str) -> usize {
    if requested > max {
        warn!(requested, max, what, "Requested count too large, reset to maximum");
        max
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::Error;

    /// Pages of `page_size` sequential numbers out of a supply of `supply` items.
    fn page_of(page: u32, page_size: usize, supply: usize) -> Vec<usize> {
        let start = (page as usize - 1) * page_size;
        (start..(start + page_size).min(supply)).collect()
    }

    #[tokio::test]
    async fn test_fixed_collects_exact_target() {
        let calls = Cell::new(0);
        let items = Paginator::fixed(45, 20)
            .collect(|page| {
                calls.set(calls.get() + 1);
                async move { Ok::<_, Error>(page_of(page, 20, usize::MAX)) }
            })
            .await
            .unwrap();

        assert_eq!(calls.get(), 3);
        assert_eq!(items.len(), 45);
        assert_eq!(items.first(), Some(&0));
        assert_eq!(items.last(), Some(&44));
    }

    #[tokio::test]
    async fn test_fixed_stops_on_short_page() {
        let calls = Cell::new(0);
        let items = Paginator::fixed(45, 20)
            .collect(|page| {
                calls.set(calls.get() + 1);
                async move { Ok::<_, Error>(page_of(page, 20, 37)) }
            })
            .await
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(items.len(), 37);
    }

    #[tokio::test]
    async fn test_variable_stops_on_empty_page() {
        let calls = Cell::new(0);
        let items = Paginator::variable(100)
            .collect(|page| {
                calls.set(calls.get() + 1);
                async move {
                    Ok::<_, Error>(match page {
                        1 => vec![1, 2, 3],
                        2 => vec![4],
                        _ => Vec::new(),
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(calls.get(), 3);
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_zero_target_issues_no_requests() {
        let calls = Cell::new(0);
        let items: Vec<usize> = Paginator::fixed(0, 20)
            .collect(|_| {
                calls.set(calls.get() + 1);
                async { Ok::<_, Error>(Vec::new()) }
            })
            .await
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_error_aborts_without_partial_result() {
        let result: Result<Vec<usize>> = Paginator::fixed(45, 20)
            .collect(|page| async move {
                if page == 2 {
                    Err(Error::Status {
                        status: 500,
                        url: "https://example.com".to_string(),
                    })
                } else {
                    Ok(page_of(page, 20, usize::MAX))
                }
            })
            .await;

        assert!(matches!(result, Err(Error::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_collect_pages_issues_exact_page_count() {
        let calls = Cell::new(0);
        let items = collect_pages(3, |page| {
            calls.set(calls.get() + 1);
            async move { Ok::<_, Error>(vec![page; 2]) }
        })
        .await
        .unwrap();

        assert_eq!(calls.get(), 3);
        assert_eq!(items, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_clamp_target() {
        assert_eq!(clamp_target(50, 30, "followers"), 30);
        assert_eq!(clamp_target(10, 30, "followers"), 10);
        assert_eq!(clamp_target(30, 30, "followers"), 30);
    }
}
