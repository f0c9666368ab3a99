use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

const KEY_SEARCH: &str = "search";
const KEY_GENRES: &str = "genres";
const KEY_PLATFORMS: &str = "platforms";
const KEY_ORDERING: &str = "ordering";
const KEY_PAGE_SIZE: &str = "page_size";

/// Sort keys accepted by the listing endpoint. A `-` prefix means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    NameDesc,
    Released,
    ReleasedDesc,
    Added,
    AddedDesc,
    Created,
    CreatedDesc,
    Updated,
    UpdatedDesc,
    Rating,
    RatingDesc,
    Metacritic,
    MetacriticDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 14] = [
        SortKey::Name,
        SortKey::NameDesc,
        SortKey::Released,
        SortKey::ReleasedDesc,
        SortKey::Added,
        SortKey::AddedDesc,
        SortKey::Created,
        SortKey::CreatedDesc,
        SortKey::Updated,
        SortKey::UpdatedDesc,
        SortKey::Rating,
        SortKey::RatingDesc,
        SortKey::Metacritic,
        SortKey::MetacriticDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::NameDesc => "-name",
            SortKey::Released => "released",
            SortKey::ReleasedDesc => "-released",
            SortKey::Added => "added",
            SortKey::AddedDesc => "-added",
            SortKey::Created => "created",
            SortKey::CreatedDesc => "-created",
            SortKey::Updated => "updated",
            SortKey::UpdatedDesc => "-updated",
            SortKey::Rating => "rating",
            SortKey::RatingDesc => "-rating",
            SortKey::Metacritic => "metacritic",
            SortKey::MetacriticDesc => "-metacritic",
        }
    }

    /// Exact token match; anything outside the closed set yields `None`.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == token)
    }

    pub fn is_descending(self) -> bool {
        self.as_str().starts_with('-')
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key {0:?}")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

/// The user's search/filter/sort intent.
///
/// Absent fields mean "no constraint". Empty search text and empty identifier
/// lists are never stored; they collapse to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FilterValue {
    pub search: Option<String>,
    /// Genre identifiers (slug or numeric id in text form).
    pub genres: Option<Vec<String>>,
    pub platforms: Option<Vec<u32>>,
    pub ordering: Option<SortKey>,
    pub page_size: Option<u32>,
}

/// Partial overlay for [`merge`]. `None` leaves the base field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPatch {
    /// `Some("")` or whitespace clears the search.
    pub search: Option<String>,
    /// `Some(vec![])` clears the field.
    pub genres: Option<Vec<String>>,
    /// `Some(vec![])` clears the field.
    pub platforms: Option<Vec<u32>>,
    pub ordering: Option<Option<SortKey>>,
    pub page_size: Option<Option<u32>>,
}

impl FilterPatch {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn genres<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            genres: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn platforms(ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            platforms: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn ordering(key: Option<SortKey>) -> Self {
        Self {
            ordering: Some(key),
            ..Self::default()
        }
    }

    pub fn page_size(size: Option<u32>) -> Self {
        Self {
            page_size: Some(size),
            ..Self::default()
        }
    }
}

/// Which non-filter preferences survive a [`reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOptions {
    pub keep_ordering: bool,
    pub keep_page_size: bool,
}

impl Default for ResetOptions {
    fn default() -> Self {
        Self {
            keep_ordering: true,
            keep_page_size: true,
        }
    }
}

impl FilterValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Canonical form used both as cache key and as address query string.
    pub fn cache_key(&self) -> String {
        encode(&normalize(self))
    }
}

/// Parses a query string (with or without a leading `?`). Unknown keys and
/// unparseable values are dropped; this never fails.
pub fn decode(query: &str) -> FilterValue {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut search = None;
    let mut genres = None;
    let mut platforms = None;
    let mut ordering = None;
    let mut page_size = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            KEY_SEARCH if search.is_none() => search = Some(value.into_owned()),
            KEY_GENRES if genres.is_none() => genres = Some(value.into_owned()),
            KEY_PLATFORMS if platforms.is_none() => platforms = Some(value.into_owned()),
            KEY_ORDERING if ordering.is_none() => ordering = Some(value.into_owned()),
            KEY_PAGE_SIZE if page_size.is_none() => page_size = Some(value.into_owned()),
            _ => {}
        }
    }

    FilterValue {
        search: search.as_deref().and_then(clean_search),
        genres: genres.as_deref().and_then(parse_text_ids),
        platforms: platforms.as_deref().and_then(parse_numeric_ids),
        ordering: ordering.as_deref().and_then(SortKey::parse),
        page_size: page_size.as_deref().and_then(parse_page_size),
    }
}

/// Serializes present fields in a fixed order. Empty lists are omitted.
pub fn encode(filter: &FilterValue) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        out.append_pair(KEY_SEARCH, search);
    }
    if let Some(genres) = filter.genres.as_deref().filter(|ids| !ids.is_empty()) {
        out.append_pair(KEY_GENRES, &genres.join(","));
    }
    if let Some(platforms) = filter.platforms.as_deref().filter(|ids| !ids.is_empty()) {
        let csv = platforms
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        out.append_pair(KEY_PLATFORMS, &csv);
    }
    if let Some(ordering) = filter.ordering {
        out.append_pair(KEY_ORDERING, ordering.as_str());
    }
    if let Some(page_size) = filter.page_size.filter(|n| *n > 0) {
        out.append_pair(KEY_PAGE_SIZE, &page_size.to_string());
    }
    out.finish()
}

/// Sorts and de-duplicates identifier lists and trims the search text.
pub fn normalize(filter: &FilterValue) -> FilterValue {
    let genres = filter.genres.as_ref().and_then(|ids| {
        let mut ids: Vec<String> = ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && !id.contains(','))
            .map(ToOwned::to_owned)
            .collect();
        ids.sort();
        ids.dedup();
        non_empty(ids)
    });
    let platforms = filter.platforms.as_ref().and_then(|ids| {
        let mut ids = ids.clone();
        ids.sort_unstable();
        ids.dedup();
        non_empty(ids)
    });

    FilterValue {
        search: filter.search.as_deref().and_then(clean_search),
        genres,
        platforms,
        ordering: filter.ordering,
        page_size: filter.page_size.filter(|n| *n > 0),
    }
}

/// Overlays `patch` onto `base`, then collapses empty search and empty lists.
pub fn merge(base: &FilterValue, patch: &FilterPatch) -> FilterValue {
    let mut next = base.clone();
    if let Some(search) = &patch.search {
        next.search = Some(search.clone());
    }
    if let Some(genres) = &patch.genres {
        next.genres = Some(genres.clone());
    }
    if let Some(platforms) = &patch.platforms {
        next.platforms = Some(platforms.clone());
    }
    if let Some(ordering) = patch.ordering {
        next.ordering = ordering;
    }
    if let Some(page_size) = patch.page_size {
        next.page_size = page_size;
    }

    if next.search.as_deref().is_some_and(|s| s.trim().is_empty()) {
        next.search = None;
    }
    if next.genres.as_ref().is_some_and(Vec::is_empty) {
        next.genres = None;
    }
    if next.platforms.as_ref().is_some_and(Vec::is_empty) {
        next.platforms = None;
    }
    next
}

/// Drops search, genres and platforms; keeps ordering and page size per `options`.
pub fn reset(current: &FilterValue, options: ResetOptions) -> FilterValue {
    FilterValue {
        ordering: current.ordering.filter(|_| options.keep_ordering),
        page_size: current.page_size.filter(|_| options.keep_page_size),
        ..FilterValue::default()
    }
}

fn clean_search(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_text_ids(csv: &str) -> Option<Vec<String>> {
    let ids = csv
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    non_empty(ids)
}

fn parse_numeric_ids(csv: &str) -> Option<Vec<u32>> {
    let ids = csv
        .split(',')
        .filter_map(|id| id.trim().parse::<u32>().ok())
        .collect();
    non_empty(ids)
}

fn parse_page_size(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
