use std::{sync::Arc, time::Duration};

use serde_json::json;
use sermondl_core::{
    DownloadOptions, RenderOptions, RenderedDiscoverer, Renderer, SermonError, SeriesDiscoverer,
    SiteConfig, WebDriverRenderer, build_client,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn renderer_for(server: &MockServer) -> WebDriverRenderer {
    let client = build_client(&DownloadOptions::default()).unwrap();
    WebDriverRenderer::new(client, &format!("{}/", server.uri()))
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": "abc123", "capabilities": {} }
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/abc123/url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn discovers_links_through_webdriver() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/abc123/execute/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": 2400 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/abc123/source"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": "<html><body><a href=\"/sermons/5\">five</a><a href=\"/about\">about</a></body></html>"
        })))
        .mount(&server)
        .await;

    let options = RenderOptions {
        settle: Duration::ZERO,
        timeout: Some(Duration::from_secs(10)),
    };
    let mut discoverer =
        RenderedDiscoverer::new(renderer_for(&server), Arc::new(SiteConfig::default()), options);

    let urls = discoverer
        .discover("beta.sermonaudio.com/series/155070/")
        .await
        .unwrap();
    assert_eq!(urls, vec!["https://beta.sermonaudio.com/sermons/5"]);
}

#[tokio::test]
async fn session_errors_surface_the_driver_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "session not created", "message": "chrome not found" }
        })))
        .mount(&server)
        .await;

    let mut renderer = renderer_for(&server);
    let err = renderer.open("https://example.com").await.unwrap_err();
    match err {
        SermonError::Renderer { reason } => assert!(reason.contains("chrome not found")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn evaluate_before_open_is_rejected() {
    let server = MockServer::start().await;
    let mut renderer = renderer_for(&server);
    assert!(renderer.evaluate("return 1;").await.is_err());
    // Closing without a session is a no-op.
    renderer.close().await.unwrap();
}
