//! Benchmarks for measuring dispatch overhead.
//!
//! These benchmarks measure route lookup and middleware chain cost in the
//! synchronous dispatcher, and the extra latency of the Axum host layers.

use axum::body::Body;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use http::StatusCode;
use kiwi_dispatch::{BufferedResponse, Config, Dispatcher, FluentRouter, Flow, Params, Reply, Request};
use std::hint::black_box;
use tower::ServiceExt;

fn test_config() -> Config {
    "".parse().unwrap()
}

/// A table of `size` static routes and `size` single-parameter routes.
fn build_dispatcher(size: usize, middleware: usize) -> Dispatcher {
    let mut router = FluentRouter::new(test_config()).unwrap();
    for i in 0..middleware {
        router.add_global_middleware(move |_: &Request, params: Params| {
            Flow::Continue(params.with(format!("m{i}"), "1"))
        });
    }
    for i in 0..size {
        router
            .get(
                &format!("/static/{i}"),
                |_, res| {
                    res.send(Reply::text(StatusCode::OK, "OK"));
                },
                (),
            )
            .unwrap();
        router
            .get(
                &format!("/items{i}/:id"),
                |_, res| {
                    res.send(Reply::text(StatusCode::OK, "OK"));
                },
                (),
            )
            .unwrap();
    }
    router.seal().unwrap()
}

/// Benchmark: route lookup as the table grows
fn bench_table_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_size");
    for size in [10, 100, 1000] {
        let dispatcher = build_dispatcher(size, 0);
        let last = format!("/items{}/42", size - 1);
        group.bench_with_input(BenchmarkId::new("last_param_route", size), &last, |b, path| {
            b.iter(|| {
                let mut response = BufferedResponse::new();
                black_box(dispatcher.resolve_path("GET", path, &mut response));
                black_box(response)
            })
        });
        group.bench_with_input(BenchmarkId::new("not_found", size), &size, |b, _| {
            b.iter(|| {
                let mut response = BufferedResponse::new();
                black_box(dispatcher.resolve_path("GET", "/missing/route/here", &mut response));
                black_box(response)
            })
        });
    }
    group.finish();
}

/// Benchmark: cost of the middleware chain
fn bench_middleware_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("middleware_chain");
    for depth in [0, 1, 5, 20] {
        let dispatcher = build_dispatcher(10, depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let mut response = BufferedResponse::new();
                black_box(dispatcher.resolve_path("GET", "/static/3", &mut response));
                black_box(response)
            })
        });
    }
    group.finish();
}

/// Benchmark: a full request through the Axum host
fn bench_axum_host(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = build_dispatcher(10, 1).into_axum_router();

    c.bench_function("axum_host", |b| {
        b.to_async(&rt).iter(|| async {
            let request = http::Request::builder()
                .uri("/items3/42")
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_table_size,
    bench_middleware_chain,
    bench_axum_host
);
criterion_main!(benches);
