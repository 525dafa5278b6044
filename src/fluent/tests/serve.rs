//! Host adapter tests: the dispatcher behind Axum and tower-http layers.

use super::{create_router, get_body_string, get_request, text};
use crate::{FluentRouter, Reply};
use axum::body::Body;
use http::{HeaderValue, StatusCode, header::SET_COOKIE};
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tower::ServiceExt;

fn ping_app() -> axum::Router {
    let mut router = create_router();
    router.get("/ping", text("pong"), ()).unwrap();
    router
        .post(
            "/echo",
            |request, res| {
                res.send(Reply::new(StatusCode::OK).with_body(request.body().to_vec()));
            },
            (),
        )
        .unwrap();
    router
        .get("/panic", |_, _| panic!("handler exploded"), ())
        .unwrap();
    router
        .get(
            "/login",
            |_, res| {
                res.set_header(SET_COOKIE, HeaderValue::from_static("session=abc"));
                res.append_header(SET_COOKIE, HeaderValue::from_static("theme=dark"));
                res.write(b"welcome");
                res.end();
            },
            (),
        )
        .unwrap();
    router.seal().unwrap().into_axum_router()
}

#[tokio::test]
async fn test_dispatches_through_axum() {
    let response = ping_app().oneshot(get_request("/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
    assert_eq!(get_body_string(response).await, "pong");
}

#[tokio::test]
async fn test_not_found_through_axum() {
    let response = ping_app().oneshot(get_request("/nope/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_body_string(response).await, "Not Found");
}

#[tokio::test]
async fn test_every_cookie_reaches_the_client() {
    let response = ping_app().oneshot(get_request("/login")).await.unwrap();
    let cookies: Vec<_> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies, ["session=abc", "theme=dark"]);
}

#[tokio::test]
async fn test_request_id_is_generated_and_echoed() {
    let response = ping_app().oneshot(get_request("/ping")).await.unwrap();
    let id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    let uuid = uuid::Uuid::parse_str(id).unwrap();
    assert_eq!(uuid.get_version_num(), 7);
}

#[tokio::test]
async fn test_request_id_is_preserved() {
    let request = http::Request::builder()
        .uri("/ping")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = ping_app().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
}

#[tokio::test]
async fn test_body_is_forwarded_within_limit() {
    let request = http::Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from("hello"))
        .unwrap();
    let response = ping_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "hello");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let request = http::Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from(vec![b'x'; 4096]))
        .unwrap();
    let response = ping_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_panicking_handler_yields_500() {
    let response = ping_app().oneshot(get_request("/panic")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value =
        serde_json::from_str(&get_body_string(response).await).unwrap();
    assert_eq!(body["error_code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_slow_dispatch_times_out() {
    let config: crate::Config = r#"
[http]
request_timeout = "50ms"
"#
    .parse()
    .unwrap();

    let mut router = FluentRouter::new(config).unwrap();
    router
        .get(
            "/slow",
            |_, res| {
                std::thread::sleep(Duration::from_millis(500));
                res.send(Reply::text(StatusCode::OK, "late"));
            },
            (),
        )
        .unwrap();
    let app = router.seal().unwrap().into_axum_router();

    let response = app.oneshot(get_request("/slow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

async fn raw_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    raw
}

#[tokio::test]
async fn test_serve_until_cancelled() {
    let mut router = create_router();
    router.get("/ping", text("pong"), ()).unwrap();
    router
        .get(
            "/whoami",
            |request, res| {
                let ip = request.client_ip().map(|ip| ip.to_string()).unwrap_or_default();
                res.send(Reply::text(StatusCode::OK, ip));
            },
            (),
        )
        .unwrap();
    let token = router.cancellation_token();
    let dispatcher = router.seal().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(dispatcher.serve(listener));

    let raw = raw_get(addr, "/ping").await;
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
    assert!(raw.ends_with("pong"), "{raw}");

    let raw = raw_get(addr, "/whoami").await;
    assert!(raw.ends_with("127.0.0.1"), "{raw}");

    token.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server stops after cancellation")
        .unwrap();
    assert!(result.is_ok());
}
