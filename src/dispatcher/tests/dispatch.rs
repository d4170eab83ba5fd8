//! Tier ordering, short-circuiting and asynchronous handlers.

use super::*;
use crate::{MountOptions, Router};
use std::time::Duration;

#[tokio::test]
async fn test_tiers_run_global_router_route() {
    let log = new_log();
    let mut router = Router::new();
    router.use_middleware(recorder(&log, "C"));
    router
        .get("/x", [recorder(&log, "D"), responder(&log, "E")])
        .unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher
        .use_middleware(recorder(&log, "A"))
        .use_middleware(recorder(&log, "B"));
    dispatcher.mount(router, MountOptions::new()).unwrap();

    let ctx = dispatch(&dispatcher, Method::GET, "/x").await;

    assert_eq!(entries(&log), ["A", "B", "C", "D", "E"]);
    assert_eq!(body_text(&ctx).as_deref(), Some("E"));
    assert_eq!(ctx.route().unwrap().pattern, "/x");
}

#[tokio::test]
async fn test_global_short_circuit_skips_resolution() {
    let log = new_log();
    let mut router = Router::new();
    router.use_middleware(recorder(&log, "router"));
    router.get("/x", [responder(&log, "route")]).unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher
        .use_middleware(responder(&log, "gate"))
        .use_middleware(recorder(&log, "after-gate"));
    dispatcher.mount(router, MountOptions::new()).unwrap();

    let ctx = dispatch(&dispatcher, Method::GET, "/x").await;

    assert_eq!(entries(&log), ["gate"]);
    assert!(ctx.route().is_none());
    assert!(ctx.req.params.is_empty());
}

#[tokio::test]
async fn test_router_short_circuit_skips_route() {
    let log = new_log();
    let mut router = Router::new();
    router.use_middleware(responder(&log, "router"));
    router.get("/x", [responder(&log, "route")]).unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher.use_middleware(recorder(&log, "global"));
    dispatcher.mount(router, MountOptions::new()).unwrap();

    let ctx = dispatch(&dispatcher, Method::GET, "/x").await;

    assert_eq!(entries(&log), ["global", "router"]);
    assert_eq!(body_text(&ctx).as_deref(), Some("router"));
}

#[tokio::test]
async fn test_route_short_circuit_skips_rest_of_route() {
    let log = new_log();
    let mut router = Router::new();
    router
        .get(
            "/x",
            [
                recorder(&log, "first"),
                responder(&log, "second"),
                recorder(&log, "third"),
            ],
        )
        .unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher.mount(router, MountOptions::new()).unwrap();
    dispatch(&dispatcher, Method::GET, "/x").await;

    assert_eq!(entries(&log), ["first", "second"]);
}

#[tokio::test]
async fn test_mount_middleware_runs_between_parent_and_own() {
    let log = new_log();
    let mut child = Router::new();
    child.use_middleware(recorder(&log, "child"));
    child.get("/leaf", [responder(&log, "leaf")]).unwrap();

    let mut parent = Router::new();
    parent.use_middleware(recorder(&log, "parent"));
    parent
        .mount(
            child,
            MountOptions::at("/c").with_middleware(recorder(&log, "mount")),
        )
        .unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher.mount(parent, MountOptions::new()).unwrap();
    dispatch(&dispatcher, Method::GET, "/c/leaf").await;

    assert_eq!(entries(&log), ["parent", "mount", "child", "leaf"]);
}

#[tokio::test]
async fn test_outer_handler_resumes_after_inner_completes() {
    let log = new_log();
    let wrapping = {
        let log = Arc::clone(&log);
        from_fn(move |ctx: RequestContext, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push("before".into());
                let ctx = next.run(ctx).await;
                log.lock().unwrap().push("after".into());
                ctx
            }
        })
    };
    let mut router = Router::new();
    router.get("/x", [responder(&log, "route")]).unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher.use_middleware(wrapping);
    dispatcher.mount(router, MountOptions::new()).unwrap();
    dispatch(&dispatcher, Method::GET, "/x").await;

    assert_eq!(entries(&log), ["before", "route", "after"]);
}

#[tokio::test]
async fn test_async_handler_suspends_before_continuing() {
    let log = new_log();
    let slow = {
        let log = Arc::clone(&log);
        from_fn(move |ctx: RequestContext, next: Next| {
            let log = Arc::clone(&log);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                log.lock().unwrap().push("slow".into());
                next.run(ctx).await
            }
        })
    };
    let mut router = Router::new();
    router.get("/x", [responder(&log, "route")]).unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher.use_middleware(slow);
    dispatcher.mount(router, MountOptions::new()).unwrap();
    dispatch(&dispatcher, Method::GET, "/x").await;

    assert_eq!(entries(&log), ["slow", "route"]);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_state() {
    let echo = from_fn(|mut ctx: RequestContext, _next: Next| async move {
        let id = ctx.req.param("id").unwrap_or_default().to_string();
        if id == "slow" {
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        ctx.extensions.insert(id.clone());
        ctx.res.text(id);
        ctx
    });
    let mut router = Router::new();
    router.get("/echo/:id", [echo]).unwrap();

    let mut dispatcher = test_dispatcher();
    dispatcher.mount(router, MountOptions::new()).unwrap();

    let (slow, fast) = tokio::join!(
        dispatch(&dispatcher, Method::GET, "/echo/slow"),
        dispatch(&dispatcher, Method::GET, "/echo/fast"),
    );

    assert_eq!(body_text(&slow).as_deref(), Some("slow"));
    assert_eq!(slow.extensions.get::<String>().map(String::as_str), Some("slow"));
    assert_eq!(body_text(&fast).as_deref(), Some("fast"));
    assert_eq!(fast.req.param("id"), Some("fast"));
}

#[tokio::test]
async fn test_handlers_read_settings_through_app() {
    let greet = from_fn(|mut ctx: RequestContext, _next: Next| async move {
        let greeting = ctx
            .app()
            .get("greeting")
            .and_then(|v| v.as_str())
            .unwrap_or("none")
            .to_string();
        ctx.res.text(greeting);
        ctx
    });
    let mut router = Router::new();
    router.get("/greet", [greet]).unwrap();

    let mut dispatcher = Dispatcher::new(test_config().with_setting("greeting", "hi")).unwrap();
    dispatcher.mount(router, MountOptions::new()).unwrap();

    let ctx = dispatch(&dispatcher, Method::GET, "/greet").await;
    assert_eq!(body_text(&ctx).as_deref(), Some("hi"));
}
