use std::fmt;

use catalog_core::{FilterValue, ItemDetail, ItemId, Page, Taxon};
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::client::{GetOptions, ParamValue, Params, UpstreamClient};
use crate::wire::{GameDetailDto, GameDto, ListResponse, TaxonDto};
use crate::UpstreamError;

/// Identifier accepted by the detail endpoint: numeric id or slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Id(ItemId),
    Slug(String),
}

impl ItemRef {
    /// Numeric text becomes an id, anything else a slug.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<ItemId>() {
            Ok(id) => ItemRef::Id(id),
            Err(_) => ItemRef::Slug(raw.to_string()),
        }
    }

    fn path(&self) -> String {
        match self {
            ItemRef::Id(id) => format!("games/{id}"),
            ItemRef::Slug(slug) => {
                // Form encoding turns spaces into '+', which is literal in a path.
                let encoded: String = form_urlencoded::byte_serialize(slug.as_bytes()).collect();
                format!("games/{}", encoded.replace('+', "%20"))
            }
        }
    }
}

impl From<ItemId> for ItemRef {
    fn from(id: ItemId) -> Self {
        ItemRef::Id(id)
    }
}

impl From<&str> for ItemRef {
    fn from(raw: &str) -> Self {
        ItemRef::parse(raw)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Id(id) => write!(f, "{id}"),
            ItemRef::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Option lists that feed the filter controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Taxonomy {
    Genres,
    Platforms,
}

impl Taxonomy {
    fn path(self) -> &'static str {
        match self {
            Taxonomy::Genres => "genres",
            Taxonomy::Platforms => "platforms",
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The operations the engine needs from the upstream catalog.
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    async fn list(
        &self,
        filter: &FilterValue,
        page: u32,
        options: &GetOptions,
    ) -> Result<Page, UpstreamError>;

    async fn detail(&self, item: &ItemRef, options: &GetOptions)
        -> Result<ItemDetail, UpstreamError>;

    async fn taxonomy(
        &self,
        kind: Taxonomy,
        page_size: Option<u32>,
        options: &GetOptions,
    ) -> Result<Vec<Taxon>, UpstreamError>;
}

/// Typed accessors over [`UpstreamClient`]. No caching or retry of its own.
#[derive(Debug, Clone)]
pub struct ResourceGateway {
    client: UpstreamClient,
}

impl ResourceGateway {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    pub async fn genres(
        &self,
        page_size: Option<u32>,
        options: &GetOptions,
    ) -> Result<Vec<Taxon>, UpstreamError> {
        self.taxonomy(Taxonomy::Genres, page_size, options).await
    }

    pub async fn platforms(
        &self,
        page_size: Option<u32>,
        options: &GetOptions,
    ) -> Result<Vec<Taxon>, UpstreamError> {
        self.taxonomy(Taxonomy::Platforms, page_size, options).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Params,
        options: &GetOptions,
    ) -> Result<T, UpstreamError> {
        self.client.get(path, params, options).await
    }
}

/// Listing parameters for `filter` at `page`.
pub fn list_params(filter: &FilterValue, page: u32) -> Params {
    Params::new()
        .set("page", page.max(1))
        .set_opt("page_size", filter.page_size)
        .set_opt("search", filter.search.clone())
        .set_opt("genres", filter.genres.as_ref().map(ParamValue::list))
        .set_opt("platforms", filter.platforms.as_ref().map(ParamValue::list))
        .set_opt("ordering", filter.ordering.map(|key| key.as_str()))
}

#[async_trait::async_trait]
impl Catalog for ResourceGateway {
    async fn list(
        &self,
        filter: &FilterValue,
        page: u32,
        options: &GetOptions,
    ) -> Result<Page, UpstreamError> {
        let params = list_params(filter, page);
        let response: ListResponse<GameDto> = self.fetch("games", &params, options).await?;
        Ok(Page::from(response))
    }

    async fn detail(
        &self,
        item: &ItemRef,
        options: &GetOptions,
    ) -> Result<ItemDetail, UpstreamError> {
        let response: GameDetailDto = self.fetch(&item.path(), &Params::new(), options).await?;
        Ok(ItemDetail::from(response))
    }

    async fn taxonomy(
        &self,
        kind: Taxonomy,
        page_size: Option<u32>,
        options: &GetOptions,
    ) -> Result<Vec<Taxon>, UpstreamError> {
        let params = Params::new().set_opt("page_size", page_size);
        let response: ListResponse<TaxonDto> = self.fetch(kind.path(), &params, options).await?;
        Ok(response.results.into_iter().map(Taxon::from).collect())
    }
}
