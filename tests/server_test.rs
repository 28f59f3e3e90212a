mod support;

use std::sync::Arc;

use reqwest::{StatusCode, header};
use serde_json::{Value, json};
use support::{Upstream, pattern, relay_config, spawn_upstream};
use tuberelay::{
    configs::{Config, YouTubeConfig},
    server::AppState,
    transport,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn spawn_app(api_base: String, password: Option<&str>) -> String {
    let mut config = Config {
        youtube: YouTubeConfig {
            clients: vec!["IOS".to_string()],
            api_base,
            ..Default::default()
        },
        relay: relay_config(1000),
        ..Default::default()
    };
    config.server.password = password.map(str::to_string);

    let state = Arc::new(AppState::new(config).unwrap());
    let app = transport::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn version_reports_package() {
    let base = spawn_app("http://127.0.0.1:9".to_string(), None).await;
    let res = reqwest::get(format!("{base}/version")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("Tuberelay-Api-Version")
            .and_then(|v| v.to_str().ok()),
        Some("1")
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "tuberelay");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn password_guards_everything_but_version() {
    let base = spawn_app("http://127.0.0.1:9".to_string(), Some("secret")).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{base}/resolve?mediaId=abc123"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("Tuberelay-Api-Version"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing Authorization header");

    let res = client
        .get(format!("{base}/resolve?mediaId=abc123"))
        .header(header::AUTHORIZATION, "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid password");

    let res = client
        .get(format!("{base}/resolve?mediaId=abc123&kind=sideways"))
        .header(header::AUTHORIZATION, "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(format!("{base}/version")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn resolve_returns_single_audio_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtubei/v1/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": { "lengthSeconds": "212" },
            "streamingData": { "adaptiveFormats": [{
                "itag": 140,
                "url": "https://rr1.googlevideo.com/videoplayback?itag=140",
                "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"",
                "bitrate": 130000
            }] }
        })))
        .mount(&server)
        .await;

    let base = spawn_app(server.uri(), None).await;
    let res = reqwest::get(format!(
        "{base}/resolve?mediaId=https://youtu.be/abc123&kind=audio&quality=highest"
    ))
    .await
    .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["streamType"], "single");
    assert_eq!(body["url"], "https://rr1.googlevideo.com/videoplayback?itag=140");
    assert_eq!(body["audioContainer"], "mp4");
    assert!(body["videoContainer"].is_null());
    assert_eq!(body["durationSeconds"], 212);
}

#[tokio::test]
async fn resolve_reports_exhaustion_as_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtubei/v1/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "playabilityStatus": { "status": "ERROR", "reason": "Video unavailable" }
        })))
        .mount(&server)
        .await;

    let base = spawn_app(server.uri(), None).await;
    let res = reqwest::get(format!("{base}/resolve?mediaId=abc123"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Video unavailable"));
}

#[tokio::test]
async fn resolve_requires_media_id() {
    let base = spawn_app("http://127.0.0.1:9".to_string(), None).await;
    let res = reqwest::get(format!("{base}/resolve")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn crawl_returns_entries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtubei/v1/browse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": { "playlistMetadataRenderer": { "title": "Mix" } },
            "contents": [{
                "playlistVideoRenderer": {
                    "videoId": "one",
                    "title": { "simpleText": "First" },
                    "lengthSeconds": "61"
                }
            }]
        })))
        .mount(&server)
        .await;

    let base = spawn_app(server.uri(), None).await;
    let res = reqwest::get(format!("{base}/crawl?listingId=PLmix&maxPages=5"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "Mix");
    assert_eq!(body["entries"][0]["mediaId"], "one");
    assert_eq!(body["entries"][0]["durationSeconds"], 61);
    assert_eq!(body["entries"][0]["position"], 1);
}

#[tokio::test]
async fn crawl_rejects_bad_page_limit_as_json() {
    let base = spawn_app("http://127.0.0.1:9".to_string(), None).await;
    let res = reqwest::get(format!("{base}/crawl?listingId=PLmix&maxPages=abc"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(
        res.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"))
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid maxPages: 'abc'");
}

#[tokio::test]
async fn relay_ends_cleanly_when_upstream_stops_early() {
    let upstream = Arc::new(Upstream {
        eof_at: Some(3000),
        ..Upstream::new(10_000)
    });
    let media_url = spawn_upstream(upstream).await;
    let base = spawn_app("http://127.0.0.1:9".to_string(), None).await;

    let res = reqwest::Client::new()
        .get(format!("{base}/relay"))
        .query(&[("url", media_url.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(!res.headers().contains_key(header::CONTENT_LENGTH));
    let body = res.bytes().await.unwrap();
    assert_eq!(body.len(), 3000);
    assert_eq!(body.as_ref(), &pattern(10_000)[..3000]);
}

#[tokio::test]
async fn relay_serves_caller_range() {
    let upstream = Arc::new(Upstream::new(5000));
    let media_url = spawn_upstream(upstream).await;
    let base = spawn_app("http://127.0.0.1:9".to_string(), None).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{base}/relay"))
        .query(&[("url", media_url.as_str())])
        .header(header::RANGE, "bytes=1000-1999")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        res.headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok()),
        Some("bytes 1000-1999/5000")
    );
    assert_eq!(
        res.headers()
            .get(header::ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok()),
        Some("bytes")
    );
    let body = res.bytes().await.unwrap();
    assert_eq!(body.len(), 1000);
    assert_eq!(body.as_ref(), &pattern(5000)[1000..2000]);
}

#[tokio::test]
async fn relay_refuses_foreign_hosts() {
    let base = spawn_app("http://127.0.0.1:9".to_string(), None).await;
    let client = reqwest::Client::new();
    let res = client
        .get(format!("{base}/relay"))
        .query(&[("url", "https://example.org/file.mp4")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("example.org"));
}

#[tokio::test]
async fn relay_reports_unsatisfiable_range() {
    let upstream = Arc::new(Upstream::new(5000));
    let media_url = spawn_upstream(upstream).await;
    let base = spawn_app("http://127.0.0.1:9".to_string(), None).await;

    let res = reqwest::Client::new()
        .get(format!("{base}/relay"))
        .query(&[("url", media_url.as_str())])
        .header(header::RANGE, "bytes=9000-")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        res.headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok()),
        Some("bytes */5000")
    );
}
