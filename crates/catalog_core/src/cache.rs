use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::Page;

pub(crate) const DEFAULT_RETAINED_KEYS: usize = 16;

/// Page sequences for keys that are not currently active, least recently
/// used evicted first. The active key's pages live in the state, not here.
pub(crate) struct PageCache {
    entries: LruCache<String, Vec<Page>>,
}

impl PageCache {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub(crate) fn store(&mut self, key: String, pages: Vec<Page>) {
        if pages.is_empty() {
            return;
        }
        self.entries.put(key, pages);
    }

    pub(crate) fn take(&mut self, key: &str) -> Option<Vec<Page>> {
        self.entries.pop(key)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for PageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache")
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .finish()
    }
}
