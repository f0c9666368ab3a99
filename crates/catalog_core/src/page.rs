use std::fmt;

use url::Url;

pub type ItemId = u64;

/// Continuation token: the upstream page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cursor(pub u32);

impl Cursor {
    pub const FIRST: Cursor = Cursor(1);

    pub fn page(self) -> u32 {
        self.0
    }

    /// Extracts the `page` query parameter from an upstream `next` link.
    /// A malformed link or a missing/invalid page number yields `None`.
    pub fn from_link(link: &str) -> Option<Self> {
        let url = Url::parse(link).ok()?;
        page_param(&url)
    }

    /// Like [`Cursor::from_link`], but a parseable link without a page number
    /// points at the first page (the upstream omits `page=1` in `previous`).
    pub fn from_previous_link(link: &str) -> Option<Self> {
        let url = Url::parse(link).ok()?;
        let has_page = url.query_pairs().any(|(key, _)| key == "page");
        if has_page {
            page_param(&url)
        } else {
            Some(Self::FIRST)
        }
    }
}

fn page_param(url: &Url) -> Option<Cursor> {
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|page| *page > 0)
        .map(Cursor)
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A genre or platform reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxon {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub image_url: Option<String>,
    pub released: Option<String>,
    pub rating: Option<f32>,
    pub metacritic: Option<u32>,
    pub genres: Vec<Taxon>,
    pub platforms: Vec<Taxon>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetail {
    pub item: Item,
    pub description: Option<String>,
    pub website: Option<String>,
}

/// One fetched batch from the listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub total_count: u64,
    pub next_cursor: Option<Cursor>,
    pub previous_cursor: Option<Cursor>,
}

impl Page {
    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }
}
