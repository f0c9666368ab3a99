use std::fmt;

use crate::cache::{PageCache, DEFAULT_RETAINED_KEYS};
use crate::view_model::FeedView;
use crate::{FilterValue, Page};

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No data for the active key yet.
    #[default]
    Idle,
    LoadingInitial,
    /// Pages held, nothing in flight.
    Ready,
    LoadingMore,
    /// Re-fetching page 1 while the held pages stay visible.
    Refreshing,
    /// Latest attempt failed; held pages stay visible.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    More,
    Refresh,
}

impl FetchKind {
    pub(crate) fn loading_phase(self) -> Phase {
        match self {
            FetchKind::Initial => Phase::LoadingInitial,
            FetchKind::More => Phase::LoadingMore,
            FetchKind::Refresh => Phase::Refreshing,
        }
    }
}

/// IO-agnostic failure reported for a page fetch. Status 0 means no response
/// was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub status: u16,
    pub message: String,
}

impl FetchFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        self.status == 0
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_network() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (HTTP {})", self.message, self.status)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingFetch {
    pub(crate) request_id: RequestId,
    pub(crate) kind: FetchKind,
    pub(crate) page: u32,
}

/// Paginated result state for the active filter key.
#[derive(Debug)]
pub struct FeedState {
    pub(crate) key: Option<FilterValue>,
    pub(crate) key_string: String,
    pub(crate) phase: Phase,
    pub(crate) pages: Vec<Page>,
    pub(crate) in_flight: Option<PendingFetch>,
    pub(crate) failed: Option<PendingFetch>,
    pub(crate) last_error: Option<FetchFailure>,
    pub(crate) next_request_id: RequestId,
    pub(crate) cache: PageCache,
    dirty: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::with_cache_capacity(DEFAULT_RETAINED_KEYS)
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` is the number of inactive keys whose pages are retained.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            key: None,
            key_string: String::new(),
            phase: Phase::Idle,
            pages: Vec::new(),
            in_flight: None,
            failed: None,
            last_error: None,
            next_request_id: 1,
            cache: PageCache::new(capacity),
            dirty: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Normalized filter identifying the active result set.
    pub fn key(&self) -> Option<&FilterValue> {
        self.key.as_ref()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn in_flight_request(&self) -> Option<RequestId> {
        self.in_flight.map(|pending| pending.request_id)
    }

    pub fn retained_keys(&self) -> usize {
        self.cache.len()
    }

    pub fn view(&self) -> FeedView {
        let next_cursor = self.pages.last().and_then(|page| page.next_cursor);
        FeedView {
            phase: self.phase,
            key: self.key_string.clone(),
            items: self
                .pages
                .iter()
                .flat_map(|page| page.items.iter().cloned())
                .collect(),
            total_count: self.pages.first().map(|page| page.total_count),
            page_count: self.pages.len(),
            has_more: next_cursor.is_some(),
            next_cursor,
            is_loading_initial: self.phase == Phase::LoadingInitial,
            is_fetching_more: self.phase == Phase::LoadingMore,
            is_refreshing: self.phase == Phase::Refreshing,
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Phase to fall back to when a fetch ends without a result.
    pub(crate) fn settled_phase(&self) -> Phase {
        if self.pages.is_empty() {
            Phase::Idle
        } else {
            Phase::Ready
        }
    }
}
