use std::sync::Arc;
use std::time::Duration;

use catalog_core::{Cursor, FilterValue, Item, ItemDetail, Page, Taxon};
use catalog_engine::{
    wait_or_cancel, AbortReason, Catalog, EngineEvent, EngineHandle, ErrorKind, GetOptions,
    ItemRef, Taxonomy, UpstreamError,
};

const WAIT: Duration = Duration::from_secs(5);

fn item(id: u64) -> Item {
    Item {
        id,
        name: format!("Game {id}"),
        image_url: None,
        released: None,
        rating: None,
        metacritic: None,
        genres: Vec::new(),
        platforms: Vec::new(),
    }
}

/// Answers immediately, or parks until cancelled when the search is "slow".
struct FakeCatalog;

#[async_trait::async_trait]
impl Catalog for FakeCatalog {
    async fn list(
        &self,
        filter: &FilterValue,
        page: u32,
        options: &GetOptions,
    ) -> Result<Page, UpstreamError> {
        if filter.search.as_deref() == Some("slow") {
            let token = options.cancel.clone().unwrap_or_default();
            wait_or_cancel(Duration::from_secs(60), &token).await?;
        }
        Ok(Page {
            items: vec![item(u64::from(page) * 10)],
            total_count: 30,
            next_cursor: (page < 3).then(|| Cursor(page + 1)),
            previous_cursor: None,
        })
    }

    async fn detail(
        &self,
        item_ref: &ItemRef,
        _options: &GetOptions,
    ) -> Result<ItemDetail, UpstreamError> {
        let id = match item_ref {
            ItemRef::Id(id) => *id,
            ItemRef::Slug(_) => 0,
        };
        Ok(ItemDetail {
            item: item(id),
            description: Some("desc".to_string()),
            website: None,
        })
    }

    async fn taxonomy(
        &self,
        kind: Taxonomy,
        page_size: Option<u32>,
        _options: &GetOptions,
    ) -> Result<Vec<Taxon>, UpstreamError> {
        let count = page_size.unwrap_or(2) as u64;
        Ok((1..=count)
            .map(|id| Taxon {
                id,
                name: format!("{kind} {id}"),
                slug: format!("{kind}-{id}"),
            })
            .collect())
    }
}

fn engine() -> EngineHandle {
    EngineHandle::with_catalog(Arc::new(FakeCatalog)).unwrap()
}

#[test]
fn fetch_page_reports_completion_with_request_id() {
    let engine = engine();
    engine.fetch_page(7, FilterValue::default(), 2);

    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::PageFetched { request_id, result }) => {
            assert_eq!(request_id, 7);
            let page = result.unwrap();
            assert_eq!(page.items[0].id, 20);
            assert_eq!(page.next_cursor, Some(Cursor(3)));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn cancel_aborts_the_in_flight_fetch() {
    let engine = engine();
    let slow = FilterValue {
        search: Some("slow".to_string()),
        ..FilterValue::default()
    };
    engine.fetch_page(1, slow, 1);
    engine.cancel(1);

    let event = engine.recv_timeout(WAIT).expect("aborted event");
    assert_eq!(event.request_id(), 1);
    match event {
        EngineEvent::PageFetched { result, .. } => {
            let err = result.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Aborted(AbortReason::Cancelled));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn cancelling_one_request_leaves_others_running() {
    let engine = engine();
    let slow = FilterValue {
        search: Some("slow".to_string()),
        ..FilterValue::default()
    };
    engine.fetch_page(1, slow, 1);
    engine.fetch_page(2, FilterValue::default(), 1);
    engine.cancel(1);

    let mut seen = Vec::new();
    for _ in 0..2 {
        let event = engine.recv_timeout(WAIT).expect("event");
        if let EngineEvent::PageFetched { request_id, result } = event {
            seen.push((request_id, result.is_ok()));
        }
    }
    seen.sort();
    assert_eq!(seen, vec![(1, false), (2, true)]);
}

#[test]
fn fetch_detail_reports_completion() {
    let engine = engine();
    engine.fetch_detail(3, ItemRef::Id(42));

    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::DetailFetched { request_id, result }) => {
            assert_eq!(request_id, 3);
            assert_eq!(result.unwrap().item.id, 42);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(engine.try_recv().is_none());
}

#[test]
fn fetch_taxonomy_reports_completion() {
    let engine = engine();
    engine.fetch_taxonomy(9, Taxonomy::Platforms, Some(3));

    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::TaxonomyFetched { request_id, result }) => {
            assert_eq!(request_id, 9);
            let taxa = result.unwrap();
            assert_eq!(taxa.len(), 3);
            assert_eq!(taxa[0].slug, "platforms-1");
        }
        other => panic!("unexpected event {other:?}"),
    }
}
