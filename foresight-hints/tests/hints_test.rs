//! Integration tests for the resource hint manager: the concurrency ceiling,
//! priority order, route preloads and timeouts.

use std::sync::Arc;
use std::time::Duration;

use foresight_core::config::HintConfig;
use foresight_core::errors::HintError;
use foresight_core::models::{HintType, ResourceHint};
use foresight_hints::ResourceHintManager;
use proptest::prelude::*;
use test_fixtures::RecordingHintSink;

fn setup(config: HintConfig) -> (ResourceHintManager, Arc<RecordingHintSink>) {
    let sink = Arc::new(RecordingHintSink::new());
    let manager = ResourceHintManager::new(config, sink.clone()).unwrap();
    (manager, sink)
}

fn no_timeout(max_concurrent_loads: usize) -> HintConfig {
    HintConfig {
        max_concurrent_loads,
        hint_timeout_ms: 0,
        ..Default::default()
    }
}

fn preloads(n: usize) -> Vec<ResourceHint> {
    (0..n)
        .map(|i| ResourceHint::preload(format!("/chunk-{i}.js"), "script"))
        .collect()
}

/// Let spawned tasks run up to their next suspension.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[test]
fn cap_holds_until_a_resolution() {
    let (m, sink) = setup(no_timeout(6));
    m.add_hints(preloads(9));
    assert_eq!(m.applied_count(), 6);
    assert_eq!(m.pending_count(), 3);
    assert_eq!(sink.present().len(), 6);

    m.add_hint(ResourceHint::preload("/late.js", "script"));
    assert_eq!(m.applied_count(), 6);

    assert_eq!(m.on_resource_complete("/chunk-0.js"), 1);
    assert_eq!(m.applied_count(), 6);
    assert!(m.is_applied(HintType::Preload, "/chunk-6.js"));
    assert!(!sink.present_urls().contains(&"/chunk-0.js".to_string()));
}

#[test]
fn unknown_url_resolves_nothing() {
    let (m, _) = setup(no_timeout(2));
    m.add_hints(preloads(3));
    assert_eq!(m.on_resource_complete("/elsewhere.js"), 0);
    assert_eq!(m.applied_count(), 2);
}

#[test]
fn higher_priority_hints_are_applied_first() {
    let (m, sink) = setup(no_timeout(1));
    m.add_hint(ResourceHint::prefetch("/blocker"));
    m.add_hints([
        ResourceHint::dns_prefetch("https://cdn.example"),
        ResourceHint::prefetch("/next"),
        ResourceHint::preconnect("https://api.example"),
        ResourceHint::preload("/font.woff2", "font"),
    ]);
    for url in ["/blocker", "/font.woff2", "https://api.example", "/next"] {
        m.on_resource_complete(url);
    }

    let order: Vec<String> = sink.applied().into_iter().map(|h| h.url).collect();
    assert_eq!(
        order,
        vec![
            "/blocker",
            "/font.woff2",
            "https://api.example",
            "/next",
            "https://cdn.example",
        ]
    );
}

#[test]
fn without_auto_cleanup_declarations_stay() {
    let (m, sink) = setup(HintConfig {
        auto_cleanup: false,
        ..no_timeout(1)
    });
    m.add_hints([ResourceHint::prefetch("/a"), ResourceHint::prefetch("/b")]);
    m.on_resource_complete("/a");

    assert_eq!(sink.present_urls(), vec!["/a", "/b"]);
    assert!(sink.removed().is_empty());
    assert!(m.is_applied(HintType::Prefetch, "/b"));
}

#[test]
fn failure_frees_capacity() {
    let (m, _) = setup(no_timeout(1));
    m.add_hints([ResourceHint::prefetch("/a"), ResourceHint::prefetch("/b")]);
    assert_eq!(m.on_resource_failed("/a"), 1);
    assert!(m.is_applied(HintType::Prefetch, "/b"));
}

#[tokio::test(start_paused = true)]
async fn preload_route_resolves_when_preloads_complete() {
    let (m, sink) = setup(no_timeout(6));
    let resources = vec![
        ResourceHint::preload("/app.js", "script"),
        ResourceHint::preload("/app.css", "style"),
        ResourceHint::prefetch("/next-page"),
    ];
    let task = tokio::spawn({
        let m = m.clone();
        async move { m.preload_route(resources).await }
    });

    settle().await;
    assert!(m.is_applied(HintType::Preload, "/app.js"));
    assert!(m.is_applied(HintType::Preload, "/app.css"));
    assert!(!sink.present_urls().contains(&"/next-page".to_string()));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(m.is_applied(HintType::Prefetch, "/next-page"));
    assert!(!task.is_finished());

    m.on_resource_complete("/app.js");
    m.on_resource_complete("/app.css");
    assert_eq!(task.await.unwrap(), Ok(()));
}

#[tokio::test(start_paused = true)]
async fn typed_resolution_leaves_other_hints_for_the_url() {
    let (m, _) = setup(no_timeout(6));
    m.add_hint(ResourceHint::prefetch("/page"));
    let task = tokio::spawn({
        let m = m.clone();
        async move { m.preload_route(vec![ResourceHint::preload("/page", "document")]).await }
    });

    settle().await;
    assert!(m.on_hint_complete(HintType::Prefetch, "/page"));
    assert!(!m.on_hint_complete(HintType::Prefetch, "/page"));
    settle().await;
    assert!(!task.is_finished());
    assert!(m.is_applied(HintType::Preload, "/page"));

    assert!(m.on_hint_failed(HintType::Preload, "/page"));
    assert_eq!(
        task.await.unwrap(),
        Err(HintError::LoadFailed { url: "/page".into() })
    );
    assert_eq!(m.applied_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_preload_fails_only_its_waiter() {
    let (m, _) = setup(no_timeout(6));
    let task = tokio::spawn({
        let m = m.clone();
        async move {
            m.preload_route(vec![
                ResourceHint::preload("/ok.js", "script"),
                ResourceHint::preload("/broken.js", "script"),
            ])
            .await
        }
    });

    settle().await;
    m.on_resource_failed("/broken.js");
    assert_eq!(
        task.await.unwrap(),
        Err(HintError::LoadFailed {
            url: "/broken.js".into()
        })
    );

    // The sibling is still loading and resolves normally.
    assert!(m.is_applied(HintType::Preload, "/ok.js"));
    assert_eq!(m.on_resource_complete("/ok.js"), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_preload_reports_cancelled() {
    let (m, _) = setup(no_timeout(1));
    m.add_hint(ResourceHint::prefetch("/busy"));
    let task = tokio::spawn({
        let m = m.clone();
        async move { m.preload_route(vec![ResourceHint::preload("/queued.js", "script")]).await }
    });

    settle().await;
    assert!(m.is_pending(HintType::Preload, "/queued.js"));
    assert!(m.cancel_hint(HintType::Preload, "/queued.js"));
    assert_eq!(
        task.await.unwrap(),
        Err(HintError::Cancelled {
            url: "/queued.js".into()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn stuck_hints_time_out_and_free_capacity() {
    let (m, sink) = setup(HintConfig {
        max_concurrent_loads: 1,
        hint_timeout_ms: 1_000,
        ..Default::default()
    });
    m.add_hints([ResourceHint::preload("/stuck.js", "script"), ResourceHint::prefetch("/next")]);
    assert!(m.is_applied(HintType::Preload, "/stuck.js"));

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert!(m.is_applied(HintType::Preload, "/stuck.js"));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(!m.is_applied(HintType::Preload, "/stuck.js"));
    assert!(m.is_applied(HintType::Prefetch, "/next"));
    assert_eq!(sink.present_urls(), vec!["/next"]);
}

#[tokio::test(start_paused = true)]
async fn timeout_of_a_resolved_hint_is_ignored() {
    let (m, _) = setup(HintConfig {
        max_concurrent_loads: 1,
        hint_timeout_ms: 1_000,
        ..Default::default()
    });
    m.add_hint(ResourceHint::prefetch("/a"));
    tokio::time::sleep(Duration::from_millis(500)).await;
    m.on_resource_complete("/a");
    // Re-applied under a new id; the first timer must not retire it early.
    m.add_hint(ResourceHint::prefetch("/a"));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(m.is_applied(HintType::Prefetch, "/a"));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!m.is_applied(HintType::Prefetch, "/a"));
}

proptest! {
    #[test]
    fn applied_never_exceeds_cap(max in 1usize..8, extra in 0usize..8, completions in 0usize..10) {
        let (m, sink) = setup(no_timeout(max));
        let hints = preloads(max + extra);
        m.add_hints(hints.clone());
        prop_assert_eq!(m.applied_count(), max);

        for hint in hints.iter().take(completions) {
            m.on_resource_complete(&hint.url);
            prop_assert!(m.applied_count() <= max);
        }
        let remaining = (max + extra).saturating_sub(completions.min(max + extra));
        prop_assert_eq!(m.applied_count(), remaining.min(max));
        prop_assert_eq!(sink.present().len(), m.applied_count());
    }
}
