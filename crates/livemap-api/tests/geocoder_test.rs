// Integration tests for `GeocoderClient` using wiremock.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use livemap_api::GeocoderClient;

async fn setup() -> (MockServer, GeocoderClient) {
    let server = MockServer::start().await;
    let client = GeocoderClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_search_preserves_provider_order() {
    let (server, client) = setup().await;

    let body = json!([
        { "display_name": "Hamburg, Deutschland", "lat": "53.55", "lon": "9.99", "type": "city" },
        { "display_name": "Hamburg, New York", "lat": "42.71", "lon": "-78.82", "type": "town" }
    ]);

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "hamburg"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let places = client.search("hamburg", 5).await.unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].display_name, "Hamburg, Deutschland");
    assert_eq!(places[1].lon, -78.82);
}

#[tokio::test]
async fn test_search_empty_result() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(client.search("xyzzy", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_provider_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.search("anything", 10).await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}
