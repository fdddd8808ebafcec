//! Ordered "try each until one succeeds" combinators.
//!
//! Resolution chains (manifest locations, marketplace descriptor URLs,
//! repository naming patterns) are declared as constant lists and consumed
//! here, so the order is data rather than control flow.

use std::future::Future;

use futures::future::join_all;

/// First `Some` produced by `attempt`, trying candidates in order.
pub fn first_some_sync<I, T, R, F>(candidates: I, attempt: F) -> Option<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Option<R>,
{
    candidates.into_iter().find_map(attempt)
}

/// First `Some` produced by `attempt`, awaiting candidates one at a time.
pub async fn first_some<I, T, R, F, Fut>(candidates: I, mut attempt: F) -> Option<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Option<R>>,
{
    for candidate in candidates {
        if let Some(result) = attempt(candidate).await {
            return Some(result);
        }
    }
    None
}

/// Runs every attempt concurrently, then returns the first `Some` in
/// candidate order (not completion order).
pub async fn first_some_concurrent<I, T, R, F, Fut>(candidates: I, attempt: F) -> Option<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Option<R>>,
{
    join_all(candidates.into_iter().map(attempt))
        .await
        .into_iter()
        .flatten()
        .next()
}
