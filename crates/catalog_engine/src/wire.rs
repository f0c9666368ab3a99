//! Upstream response shapes. Decoded leniently, then validated into the
//! closed domain types of `catalog_core`.

use catalog_core::{Cursor, Item, ItemDetail, Page, Taxon};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default)]
    pub(crate) count: u64,
    #[serde(default)]
    pub(crate) next: Option<String>,
    #[serde(default)]
    pub(crate) previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub(crate) results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaxonDto {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlatformEntryDto {
    pub(crate) platform: TaxonDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameDto {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) background_image: Option<String>,
    #[serde(default)]
    pub(crate) released: Option<String>,
    #[serde(default)]
    pub(crate) rating: Option<f64>,
    #[serde(default)]
    pub(crate) metacritic: Option<i64>,
    #[serde(default)]
    pub(crate) genres: Option<Vec<TaxonDto>>,
    #[serde(default)]
    pub(crate) platforms: Option<Vec<PlatformEntryDto>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameDetailDto {
    #[serde(flatten)]
    pub(crate) game: GameDto,
    #[serde(default)]
    pub(crate) description_raw: Option<String>,
    #[serde(default)]
    pub(crate) website: Option<String>,
}

impl From<TaxonDto> for Taxon {
    fn from(dto: TaxonDto) -> Self {
        let name = non_blank(dto.name).unwrap_or_default();
        let slug = non_blank(dto.slug).unwrap_or_else(|| dto.id.to_string());
        Taxon {
            id: dto.id,
            name,
            slug,
        }
    }
}

impl From<GameDto> for Item {
    fn from(dto: GameDto) -> Self {
        Item {
            id: dto.id,
            name: non_blank(dto.name).unwrap_or_else(|| format!("#{}", dto.id)),
            image_url: non_blank(dto.background_image),
            released: non_blank(dto.released),
            rating: dto
                .rating
                .filter(|r| r.is_finite() && *r >= 0.0)
                .map(|r| r as f32),
            metacritic: dto
                .metacritic
                .and_then(|score| u32::try_from(score).ok()),
            genres: dto
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(Taxon::from)
                .collect(),
            platforms: dto
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|entry| Taxon::from(entry.platform))
                .collect(),
        }
    }
}

impl From<GameDetailDto> for ItemDetail {
    fn from(dto: GameDetailDto) -> Self {
        ItemDetail {
            item: Item::from(dto.game),
            description: non_blank(dto.description_raw),
            website: non_blank(dto.website),
        }
    }
}

impl From<ListResponse<GameDto>> for Page {
    fn from(dto: ListResponse<GameDto>) -> Self {
        Page {
            items: dto.results.into_iter().map(Item::from).collect(),
            total_count: dto.count,
            next_cursor: dto.next.as_deref().and_then(Cursor::from_link),
            previous_cursor: dto.previous.as_deref().and_then(Cursor::from_previous_link),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
