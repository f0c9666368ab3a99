use crate::{FetchFailure, FilterValue, Page, RequestId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The filter decoded from the address on this render.
    FilterObserved(FilterValue),
    /// User asked for the page after the last held one.
    FetchNextRequested,
    /// User asked to re-fetch page 1 in the background.
    RefreshRequested,
    /// User retried after a failure.
    RetryRequested,
    /// Consuming view unmounted or the user cancelled explicitly.
    CancelRequested,
    /// Drop every retained page sequence for inactive keys.
    CacheInvalidated,
    /// Engine completion for a page fetch.
    PageFetched {
        request_id: RequestId,
        result: Result<Page, FetchFailure>,
    },
    /// Engine reports the fetch was aborted (cancelled or timed out).
    FetchAborted { request_id: RequestId },
    /// Fallback for placeholder wiring.
    NoOp,
}
