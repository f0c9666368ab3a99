use crate::{FilterValue, RequestId};

/// Side effects requested by [`crate::update`]; the host executes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch listing page `page` for `filter`. The result must come back
    /// tagged with `request_id`.
    FetchPage {
        request_id: RequestId,
        filter: FilterValue,
        page: u32,
    },
    /// Abort an outstanding fetch and release its timer.
    CancelFetch { request_id: RequestId },
}
