use crate::{Cursor, FetchFailure, Item, Phase};

/// What a consuming view renders for the active key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedView {
    pub phase: Phase,
    /// Canonical query string of the active key.
    pub key: String,
    /// Items of all held pages, in fetch order.
    pub items: Vec<Item>,
    pub total_count: Option<u64>,
    pub page_count: usize,
    pub has_more: bool,
    pub next_cursor: Option<Cursor>,
    pub is_loading_initial: bool,
    pub is_fetching_more: bool,
    pub is_refreshing: bool,
    pub last_error: Option<FetchFailure>,
    pub dirty: bool,
}

impl FeedView {
    /// A fetch other than the initial load is in flight.
    pub fn is_updating_in_background(&self) -> bool {
        self.is_fetching_more || self.is_refreshing
    }

    pub fn can_retry(&self) -> bool {
        self.phase == Phase::Error
    }
}
