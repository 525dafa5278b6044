//! Basic dispatch tests: matching, ordering, not-found and handler contract.

use super::{create_config_with_toml, create_router, dispatch, text};
use crate::{ErrorKind, FluentRouter, HttpMethod, Outcome, Reply, ResponseSink};
use http::StatusCode;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tracing_test::traced_test;

#[test]
fn test_static_route_beats_earlier_param_route() {
    let mut router = create_router();
    router.get("/users/:id", text("show"), ()).unwrap();
    router.get("/users/new", text("new"), ()).unwrap();
    let dispatcher = router.seal().unwrap();

    let (_, response) = dispatch(&dispatcher, "GET", "/users/new");
    assert_eq!(response.body_text(), "new");

    let (outcome, response) = dispatch(&dispatcher, "GET", "/users/42");
    assert_eq!(response.body_text(), "show");
    assert_eq!(outcome.route().unwrap().route, "/users/:id");
}

#[test]
fn test_equal_specificity_keeps_registration_order() {
    let mut router = create_router();
    router.get("/:a/x", text("first"), ()).unwrap();
    router.get("/y/:b", text("second"), ()).unwrap();
    let dispatcher = router.seal().unwrap();

    let (_, response) = dispatch(&dispatcher, "GET", "/y/x");
    assert_eq!(response.body_text(), "first");
}

#[test]
fn test_sealed_table_is_in_specificity_order() {
    let mut router = create_router();
    router.get("/a/:x/:y", text("two"), ()).unwrap();
    router.get("/a/:x", text("one"), ()).unwrap();
    router.get("/a", text("zero"), ()).unwrap();
    router.post("/b/:x", text("one again"), ()).unwrap();
    let dispatcher = router.seal().unwrap();

    let order: Vec<_> = dispatcher.routes().into_iter().map(|r| r.route).collect();
    assert_eq!(order, ["/a", "/a/:x", "/b/:x", "/a/:x/:y"]);
}

#[test]
fn test_method_mismatch_continues_scanning() {
    let mut router = create_router();
    router.post("/items", text("create"), ()).unwrap();
    router.get("/:page", text("page"), ()).unwrap();
    let dispatcher = router.seal().unwrap();

    let (outcome, response) = dispatch(&dispatcher, "GET", "/items");
    assert_eq!(response.body_text(), "page");
    assert!(matches!(outcome, Outcome::Handled { .. }));

    let (outcome, response) = dispatch(&dispatcher, "PUT", "/items");
    assert_eq!(outcome, Outcome::NotFound);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
#[traced_test]
fn test_not_found_is_plain_text() {
    let dispatcher = create_router().seal().unwrap();
    let (outcome, response) = dispatch(&dispatcher, "GET", "/nope");

    assert_eq!(outcome, Outcome::NotFound);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.body_text(), "Not Found");
    assert!(logs_contain("No route matched GET /nope"));
}

#[test]
fn test_not_found_message_is_configurable() {
    let config = create_config_with_toml(
        r#"
[router]
not_found_message = "Nothing to see here"
"#,
    );
    let dispatcher = FluentRouter::new(config).unwrap().seal().unwrap();
    let (_, response) = dispatch(&dispatcher, "GET", "/");
    assert_eq!(response.body_text(), "Nothing to see here");
}

#[test]
fn test_params_reach_the_handler() {
    let mut router = create_router();
    router
        .get(
            "/users/:id",
            |request, res| {
                let id = request.param("id").unwrap_or_default();
                res.send(Reply::text(StatusCode::OK, format!("user {id}")));
            },
            (),
        )
        .unwrap();
    let dispatcher = router.seal().unwrap();

    let (_, response) = dispatch(&dispatcher, "GET", "/users/42");
    assert_eq!(response.body_text(), "user 42");
}

#[test]
fn test_segment_count_mismatch_is_not_found() {
    let mut router = create_router();
    router.get("/users/:id/:sub", text("deep"), ()).unwrap();
    let dispatcher = router.seal().unwrap();

    let (outcome, _) = dispatch(&dispatcher, "GET", "/users/42");
    assert_eq!(outcome, Outcome::NotFound);
}

#[test]
fn test_request_path_is_normalized() {
    let mut router = create_router();
    router.get("/", text("root"), ()).unwrap();
    router.get("orders/", text("orders"), ()).unwrap();
    let dispatcher = router.seal().unwrap();

    assert_eq!(dispatch(&dispatcher, "GET", "").1.body_text(), "root");
    assert_eq!(dispatch(&dispatcher, "GET", "/orders/").1.body_text(), "orders");
    assert_eq!(dispatch(&dispatcher, "GET", "/orders?x=1").1.body_text(), "orders");
}

#[test]
fn test_exactly_one_handler_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut router = create_router();
    for path in ["/a/:x", "/a/b", "/:y/b", "/:y/:z"] {
        let calls = Arc::clone(&calls);
        router
            .get(
                path,
                move |_, res| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    res.send(Reply::text(StatusCode::OK, "hit"));
                },
                (),
            )
            .unwrap();
    }
    let dispatcher = router.seal().unwrap();

    let (outcome, _) = dispatch(&dispatcher, "GET", "/a/b");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.route().unwrap().route, "/a/b");
}

#[test]
fn test_unsent_response_is_finished_by_dispatcher() {
    let mut router = create_router();
    router
        .get(
            "/csv",
            |_, res| {
                res.set_status(StatusCode::ACCEPTED);
                res.set_content_type("text/csv");
                res.write(b"a,b\n");
            },
            (),
        )
        .unwrap();
    router.get("/empty", |_, _| {}, ()).unwrap();
    let dispatcher = router.seal().unwrap();

    let (_, response) = dispatch(&dispatcher, "GET", "/csv");
    assert!(response.is_sent());
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.header("content-type"), Some("text/csv"));
    assert_eq!(response.body_text(), "a,b\n");

    let (_, response) = dispatch(&dispatcher, "GET", "/empty");
    assert!(response.is_sent());
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().is_empty());
}

#[test]
fn test_map_accepts_any_case() {
    let mut router = create_router();
    router.map("delete", "/orders/:id", text("gone"), ()).unwrap();
    let err = router.map("patch", "/orders/:id", text("nope"), ()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let routes = router.routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].method, HttpMethod::Delete);
}

#[test]
fn test_invalid_pattern_is_rejected_at_registration() {
    let mut router = create_router();
    let err = router.get("/users/:", text("x"), ()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPattern);
    assert!(router.routes().is_empty());
}

#[test]
fn test_request_view_in_handler() {
    let mut router = create_router();
    router
        .post(
            "/orders",
            |request, res| {
                let name = request.json_body()["name"].as_str().unwrap_or("?").to_string();
                let page = request.query_param("page").unwrap_or_default();
                res.send(Reply::text(StatusCode::CREATED, format!("{name}@{page}")));
            },
            (),
        )
        .unwrap();
    let dispatcher = router.seal().unwrap();

    let request = crate::Request::new("POST", "/orders?page=3").with_body(r#"{"name":"tea"}"#);
    let mut response = crate::BufferedResponse::new();
    dispatcher.resolve(request, &mut response);
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.body_text(), "tea@3");
}

#[test]
fn test_routes_endpoint_lists_table() {
    let config = create_config_with_toml(
        r#"
[router]
routes_endpoint = "/debug/routes"
"#,
    );
    let mut router = FluentRouter::new(config).unwrap();
    router.get("/users/:id", text("show"), ()).unwrap();
    router.post("/users", text("create"), ()).unwrap();
    let dispatcher = router.seal().unwrap();

    let (_, response) = dispatch(&dispatcher, "GET", "/debug/routes");
    assert_eq!(response.header("content-type"), Some("application/json"));
    let listing: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(
        listing,
        serde_json::json!([
            { "route": "/users", "method": "POST", "callback": "Closure" },
            { "route": "/debug/routes", "method": "GET", "callback": "Closure" },
            { "route": "/users/:id", "method": "GET", "callback": "Closure" },
        ])
    );
}

#[test]
fn test_dispatcher_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::Dispatcher>();
}
