use std::{
    collections::HashMap, net::SocketAddr, path::Path, sync::Arc,
    time::Duration,
};

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use reelcache_client::{
    HttpStreamingServer, RegistrationError, StreamingServer,
    VideoRegistrationCache, infra::testing::FakeBackend,
};
use serde_json::json;

async fn register(Query(params): Query<HashMap<String, String>>) -> Response {
    let Some(path) = params.get("path") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if path.ends_with("missing.mp4") {
        return StatusCode::NOT_FOUND.into_response();
    }
    if path.ends_with("garbled.mp4") {
        return "not json".into_response();
    }
    Json(json!({
        "id": "vid-1",
        "url": format!("http://stream.local/v/{}", urlencoding::encode(path)),
        "echo": path,
    }))
    .into_response()
}

async fn slow_health() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(2)).await;
    StatusCode::OK
}

async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route("/register", get(register))
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/slow/health", get(slow_health))
        .route(
            "/down/health",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn register_sends_encoded_path_and_decodes_registration() {
    let addr = spawn_stub().await;
    let server = HttpStreamingServer::new(&addr.to_string()).unwrap();

    let registration = server
        .register(Path::new("/media/My Clip #1.mp4"))
        .await
        .unwrap();

    assert_eq!(registration.id, "vid-1");
    assert_eq!(
        registration.url,
        format!(
            "http://stream.local/v/{}",
            urlencoding::encode("/media/My Clip #1.mp4")
        )
    );
}

#[tokio::test]
async fn non_success_status_includes_status_text() {
    let addr = spawn_stub().await;
    let server = HttpStreamingServer::new(&addr.to_string()).unwrap();

    let err = server
        .register(Path::new("/media/missing.mp4"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RegistrationError::Status {
            status: 404,
            status_text: "Not Found".to_string(),
        }
    );
    assert_eq!(err.to_string(), "Failed to register video: 404 Not Found");
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let addr = spawn_stub().await;
    let server = HttpStreamingServer::new(&addr.to_string()).unwrap();

    let err = server
        .register(Path::new("/media/garbled.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn health_probe_reflects_server_state() {
    let addr = spawn_stub().await;

    let up = HttpStreamingServer::new(&format!("http://{addr}")).unwrap();
    assert!(up.is_running().await);

    let down =
        HttpStreamingServer::new(&format!("http://{addr}/down")).unwrap();
    assert!(!down.is_running().await);

    let gone_addr = closed_port().await.to_string();
    let gone = HttpStreamingServer::new(&gone_addr).unwrap();
    assert!(!gone.is_running().await);
}

#[tokio::test]
async fn health_probe_times_out() {
    let addr = spawn_stub().await;
    let slow = HttpStreamingServer::new(&format!("http://{addr}/slow"))
        .unwrap()
        .with_health_timeout(Duration::from_millis(100));

    let started = std::time::Instant::now();
    assert!(!slow.is_running().await);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let server =
        HttpStreamingServer::new(&closed_port().await.to_string()).unwrap();

    let err = server.register(Path::new("/media/a.mp4")).await.unwrap_err();

    assert!(matches!(err, RegistrationError::Http(_)), "{err:?}");
}

#[tokio::test]
async fn registration_cache_falls_back_to_the_real_http_server() {
    let addr = spawn_stub().await;
    let backend = Arc::new(FakeBackend::default());
    let server = Arc::new(HttpStreamingServer::new(&addr.to_string()).unwrap());
    let cache = VideoRegistrationCache::new(backend.clone(), server);

    let url = cache.get_url("/media/a.mp4").await.unwrap();

    assert!(url.starts_with("http://stream.local/v/"));
    assert_eq!(backend.call_count("register_video"), 1);

    let err = cache.get_url("/media/missing.mp4").await.unwrap_err();
    assert!(err.to_string().contains("Not Found"));
    assert_eq!(cache.last_error(), Some(err.to_string()));
}
