//! Keeps the navigable address as the only persisted copy of filter state.
//!
//! Reads decode the query portion of the current location; writes merge,
//! normalize and encode, then replace the current history entry.

use crate::filter::{self, FilterPatch, FilterValue, ResetOptions};

/// A navigable address with replaceable history, e.g. a browser location.
pub trait Navigator {
    /// Current location as `path[?query][#fragment]`.
    fn location(&self) -> String;
    /// Overwrites the current history entry without growing history.
    fn replace(&mut self, location: String);
}

/// In-memory history used by the app and by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNavigator {
    entries: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            entries: vec![location.into()],
        }
    }

    /// Appends a new entry, as a link click would.
    pub fn push(&mut self, location: impl Into<String>) {
        self.entries.push(location.into());
    }

    pub fn history_len(&self) -> usize {
        self.entries.len()
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> String {
        self.entries.last().cloned().unwrap_or_default()
    }

    fn replace(&mut self, location: String) {
        match self.entries.last_mut() {
            Some(current) => *current = location,
            None => self.entries.push(location),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSync {
    path: String,
}

impl AddressSync {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The active filter, decoded fresh from the address on every call.
    pub fn current_filter(&self, nav: &impl Navigator) -> FilterValue {
        let location = nav.location();
        filter::decode(query_part(&location))
    }

    /// Applies a control change and writes the canonical address.
    pub fn apply(&self, nav: &mut impl Navigator, patch: &FilterPatch) -> FilterValue {
        let current = self.current_filter(nav);
        let next = filter::normalize(&filter::merge(&current, patch));
        self.write(nav, &next);
        next
    }

    /// Clears search and identifier filters; keeps ordering/page size per `options`.
    pub fn reset(&self, nav: &mut impl Navigator, options: ResetOptions) -> FilterValue {
        let current = self.current_filter(nav);
        let next = filter::normalize(&filter::reset(&current, options));
        self.write(nav, &next);
        next
    }

    /// Address for `filter` under this path; the `?` is omitted when the query is empty.
    pub fn location_for(&self, filter: &FilterValue) -> String {
        let query = filter::encode(&filter::normalize(filter));
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }

    fn write(&self, nav: &mut impl Navigator, filter: &FilterValue) {
        let location = self.location_for(filter);
        if location != nav.location() {
            nav.replace(location);
        }
    }
}

fn query_part(location: &str) -> &str {
    let without_fragment = location.split('#').next().unwrap_or(location);
    without_fragment
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::query_part;

    #[test]
    fn query_part_ignores_fragment() {
        assert_eq!(query_part("/games?search=a#top"), "search=a");
        assert_eq!(query_part("/games#top"), "");
        assert_eq!(query_part("/games"), "");
    }
}
