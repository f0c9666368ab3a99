use std::time::Duration;

use catalog_core::filter::decode;
use catalog_core::{Cursor, FilterValue};
use catalog_engine::{
    Catalog, ClientSettings, ErrorKind, GetOptions, ItemRef, ResourceGateway, UpstreamClient,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> ResourceGateway {
    let settings = ClientSettings {
        base_url: format!("{}/api", server.uri()),
        api_key: Some("test-key".to_string()),
        default_retry_after: Duration::from_millis(10),
        ..ClientSettings::default()
    };
    ResourceGateway::new(UpstreamClient::new(settings).unwrap())
}

fn games_page(server: &MockServer, next_page: Option<u32>) -> serde_json::Value {
    let next = next_page.map(|n| format!("{}/api/games?key=test-key&page={n}", server.uri()));
    json!({
        "count": 2,
        "next": next,
        "previous": null,
        "results": [
            {
                "id": 22511,
                "name": "The Legend of Zelda: Breath of the Wild",
                "background_image": "https://media.example/zelda.jpg",
                "released": "2017-03-03",
                "rating": 4.5,
                "metacritic": 97,
                "genres": [{"id": 4, "name": "Action", "slug": "action"}],
                "platforms": [{"platform": {"id": 7, "name": "Nintendo Switch", "slug": "nintendo-switch"}}]
            },
            {"id": 1, "name": "Zelda II", "genres": null, "platforms": null}
        ]
    })
}

#[tokio::test]
async fn list_translates_filter_into_query_and_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games"))
        .and(query_param("key", "test-key"))
        .and(query_param("page", "1"))
        .and(query_param("search", "zelda"))
        .and(query_param("genres", "4,51"))
        .and(query_param("ordering", "-rating"))
        .and(query_param_is_missing("platforms"))
        .and(query_param_is_missing("page_size"))
        .respond_with(ResponseTemplate::new(200).set_body_json(games_page(&server, Some(2))))
        .expect(1)
        .mount(&server)
        .await;

    let filter = decode("search=zelda&genres=4,51&ordering=-rating");
    let page = gateway(&server)
        .list(&filter, 1, &GetOptions::new())
        .await
        .expect("list ok");

    assert_eq!(page.total_count, 2);
    assert_eq!(page.next_cursor, Some(Cursor(2)));
    assert_eq!(page.previous_cursor, None);
    assert_eq!(page.items.len(), 2);
    let first = &page.items[0];
    assert_eq!(first.id, 22511);
    assert_eq!(first.released.as_deref(), Some("2017-03-03"));
    assert_eq!(first.platforms[0].name, "Nintendo Switch");
    assert!(page.items[1].genres.is_empty());
}

#[tokio::test]
async fn last_page_offers_no_continuation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(games_page(&server, None)))
        .mount(&server)
        .await;

    let filter = FilterValue {
        page_size: Some(20),
        ..FilterValue::default()
    };
    let page = gateway(&server)
        .list(&filter, 2, &GetOptions::new())
        .await
        .expect("list ok");
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn detail_by_id_and_slug() {
    let server = MockServer::start().await;
    let body = json!({
        "id": 3498,
        "slug": "grand-theft-auto-v",
        "name": "Grand Theft Auto V",
        "description_raw": "Rockstar Games went bigger.",
        "website": "",
        "metacritic": 92
    });
    Mock::given(method("GET"))
        .and(path("/api/games/3498"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/games/grand-theft-auto-v"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let by_id = gateway
        .detail(&ItemRef::Id(3498), &GetOptions::new())
        .await
        .expect("detail ok");
    assert_eq!(by_id.item.name, "Grand Theft Auto V");
    assert_eq!(by_id.description.as_deref(), Some("Rockstar Games went bigger."));
    assert_eq!(by_id.website, None);

    let by_slug = gateway
        .detail(&ItemRef::parse("grand-theft-auto-v"), &GetOptions::new())
        .await
        .expect("detail ok");
    assert_eq!(by_slug, by_id);
}

#[tokio::test]
async fn detail_propagates_upstream_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games/0"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .detail(&ItemRef::Id(0), &GetOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Status(404));
}

#[tokio::test]
async fn taxonomies_list_genres_and_platforms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/genres"))
        .and(query_param("page_size", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2, "next": null, "previous": null,
            "results": [
                {"id": 4, "name": "Action", "slug": "action", "games_count": 180000},
                {"id": 51, "name": "Indie", "slug": "indie"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/platforms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 4, "name": "PC", "slug": "pc"}]
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let genres = gateway
        .genres(Some(40), &GetOptions::new())
        .await
        .expect("genres ok");
    let slugs: Vec<_> = genres.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, vec!["action", "indie"]);

    let platforms = gateway
        .platforms(None, &GetOptions::new())
        .await
        .expect("platforms ok");
    assert_eq!(platforms.len(), 1);
    assert_eq!(platforms[0].name, "PC");
}
