//! Benchmarks for measuring dispatch overhead.
//!
//! These benchmarks measure pattern matching, route resolution across many
//! routes and the cost of middleware depth, to track regressions.

use axum::{body::Body, http::Request};
use axum_dispatch::{
    CompiledMatcher, Config, Dispatcher, MatchOptions, Next, RequestContext, ResponseView, Router,
    from_fn,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tower::ServiceExt;

fn test_config() -> Config {
    "".parse().unwrap()
}

fn test_request(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn terminal_router(routes: usize) -> Router {
    let mut router = Router::new();
    for index in 0..routes {
        router
            .get(
                &format!("/resource{index}/:id"),
                [from_fn(|mut ctx: RequestContext, _next: Next| async move {
                    ctx.res.text("OK");
                    ctx
                })],
            )
            .unwrap();
    }
    router
}

/// Benchmark: compiling and matching a single pattern
fn bench_matcher(c: &mut Criterion) {
    c.bench_function("compile_pattern", |b| {
        b.iter(|| {
            CompiledMatcher::compile(
                black_box("/users/:id(\\d+)/posts/:slug?"),
                MatchOptions::default(),
            )
            .unwrap()
        })
    });

    let matcher =
        CompiledMatcher::compile("/users/:id(\\d+)/posts/:slug?", MatchOptions::default())
            .unwrap();
    c.bench_function("exec_pattern", |b| {
        b.iter(|| matcher.exec(black_box("/users/42/posts/hello")))
    });
}

/// Benchmark: resolving the last of N routes
fn bench_route_count(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("route_count");

    for routes in [1usize, 10, 100] {
        let mut dispatcher = Dispatcher::new(test_config()).unwrap();
        dispatcher.mount(terminal_router(routes), "/api").unwrap();
        let path = format!("/api/resource{}/7", routes - 1);

        group.bench_with_input(BenchmarkId::from_parameter(routes), &routes, |b, _| {
            b.to_async(&rt).iter(|| async {
                let ctx = dispatcher.build_context(test_request(&path), ResponseView::default());
                black_box(dispatcher.dispatch_request(ctx).await)
            })
        });
    }
    group.finish();
}

/// Benchmark: global middleware depth in front of one route
fn bench_middleware_depth(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("middleware_depth");

    for depth in [0usize, 5, 20] {
        let mut dispatcher = Dispatcher::new(test_config()).unwrap();
        for _ in 0..depth {
            dispatcher.use_middleware(from_fn(|ctx: RequestContext, next: Next| next.run(ctx)));
        }
        dispatcher.mount(terminal_router(1), "/api").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.to_async(&rt).iter(|| async {
                let ctx =
                    dispatcher.build_context(test_request("/api/resource0/1"), ResponseView::default());
                black_box(dispatcher.dispatch_request(ctx).await)
            })
        });
    }
    group.finish();
}

/// Benchmark: full transport stack with `oneshot`
fn bench_transport(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut dispatcher = Dispatcher::new(test_config()).unwrap();
    dispatcher.mount(terminal_router(10), "/api").unwrap();
    let app = dispatcher.into_router();

    c.bench_function("transport_oneshot", |b| {
        b.to_async(&rt).iter(|| async {
            let response = app
                .clone()
                .oneshot(test_request("/api/resource9/1"))
                .await
                .unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_matcher,
    bench_route_count,
    bench_middleware_depth,
    bench_transport
);
criterion_main!(benches);
