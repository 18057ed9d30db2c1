#![allow(clippy::unwrap_used)]
// Integration tests for `Session` against a wiremock backend: snapshot
// atomicity, namespace switching, the stale-fetch guard, and the event
// feed end to end.

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use modelfs_core::{ConsoleConfig, Phase, Session};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

// ── Helpers ─────────────────────────────────────────────────────────

fn model_json(name: &str, ns: &str, status: &str) -> serde_json::Value {
    json!({
        "name": name,
        "namespace": ns,
        "sourceRef": "hf-public",
        "versionsReady": 1,
        "versionsTotal": 1,
        "lastSyncTime": "2026-05-01T10:00:00Z",
        "status": status
    })
}

fn items(values: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "items": values })
}

/// Mount all four collection endpoints for one namespace.
async fn mount_collections(
    server: &MockServer,
    ns: &str,
    models: Vec<serde_json::Value>,
    delay: Option<Duration>,
) {
    for (route, body) in [
        ("/api/models", items(models)),
        ("/api/modelsources", items(vec![])),
        ("/api/errors", items(vec![])),
        ("/api/datasets", items(vec![])),
    ] {
        let mut template = ResponseTemplate::new(200).set_body_json(body);
        if let Some(d) = delay {
            template = template.set_delay(d);
        }
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("namespace", ns))
            .respond_with(template)
            .mount(server)
            .await;
    }
}

async fn mount_namespaces(server: &MockServer, names: &[&str]) {
    let values: Vec<serde_json::Value> = names.iter().map(|n| json!({"name": n})).collect();
    Mock::given(method("GET"))
        .and(path("/api/namespaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(values)))
        .mount(server)
        .await;
}

fn config(server: &MockServer, state_dir: &TempDir) -> ConsoleConfig {
    let mut config = ConsoleConfig::new(Url::parse(&server.uri()).unwrap());
    config.events_enabled = false;
    config.state_dir = Some(state_dir.path().to_path_buf());
    config
}

/// Poll until `check` passes or the timeout elapses.
async fn wait_for(check: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {WAIT_TIMEOUT:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ── Snapshot fetch ──────────────────────────────────────────────────

#[tokio::test]
async fn refresh_all_populates_the_store() {
    let server = MockServer::start().await;
    let state = TempDir::new().unwrap();
    mount_collections(
        &server,
        "model-system",
        vec![model_json("llama-3", "model-system", "READY")],
        None,
    )
    .await;

    let session = Session::new(config(&server, &state)).unwrap();
    session.refresh_all().await;

    let store = session.store();
    assert_eq!(store.model_count(), 1);
    assert_eq!(store.models_snapshot()[0].name, "llama-3");
    assert!(!store.is_loading());
    assert!(store.last_refresh().is_some());
}

#[tokio::test]
async fn partial_backend_failure_applies_nothing() {
    let server = MockServer::start().await;
    let state = TempDir::new().unwrap();

    // Seed the store from a healthy backend first.
    mount_collections(
        &server,
        "model-system",
        vec![model_json("seeded", "model-system", "READY")],
        None,
    )
    .await;
    let session = Session::new(config(&server, &state)).unwrap();
    session.refresh_all().await;
    assert_eq!(session.store().model_count(), 1);

    // Second backend: three reads succeed, datasets fails.
    server.reset().await;
    for (route, body) in [
        (
            "/api/models",
            items(vec![
                model_json("fresh-1", "model-system", "READY"),
                model_json("fresh-2", "model-system", "READY"),
            ]),
        ),
        ("/api/modelsources", items(vec![])),
        ("/api/errors", items(vec![])),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/datasets"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&server)
        .await;

    session.refresh_all().await;

    // Torn snapshot avoided: the models read succeeded but must not land.
    let store = session.store();
    assert_eq!(store.model_count(), 1);
    assert_eq!(store.models_snapshot()[0].name, "seeded");
    assert!(!store.is_loading());
}

// ── Namespace switching ─────────────────────────────────────────────

#[tokio::test]
async fn namespace_switch_replaces_collections_and_persists() {
    let server = MockServer::start().await;
    let state = TempDir::new().unwrap();
    mount_collections(
        &server,
        "model-system",
        vec![model_json("a-model", "model-system", "READY")],
        None,
    )
    .await;
    mount_collections(
        &server,
        "team-b",
        vec![model_json("b-model", "team-b", "PENDING")],
        None,
    )
    .await;

    let session = Session::new(config(&server, &state)).unwrap();
    session.refresh_all().await;
    assert_eq!(session.store().models_snapshot()[0].name, "a-model");

    session.set_namespace("team-b").await;

    // No record from the old namespace is visible in any collection.
    let models = session.store().models_snapshot();
    assert_eq!(models.len(), 1);
    assert!(models.iter().all(|m| m.namespace == "team-b"));
    assert_eq!(session.active_namespace(), "team-b");

    // The selection persisted: a fresh session starts in team-b.
    let reloaded = config(&server, &state);
    assert_eq!(reloaded.initial_namespace(), "team-b");
}

#[tokio::test]
async fn stale_snapshot_from_previous_namespace_is_discarded() {
    let server = MockServer::start().await;
    let state = TempDir::new().unwrap();

    // The old namespace answers slowly; the new one is instant.
    mount_collections(
        &server,
        "model-system",
        vec![model_json("stale", "model-system", "READY")],
        Some(Duration::from_millis(300)),
    )
    .await;
    mount_collections(
        &server,
        "team-b",
        vec![model_json("current", "team-b", "READY")],
        None,
    )
    .await;

    let session = Session::new(config(&server, &state)).unwrap();

    // Kick off the slow fetch, then switch namespaces before it lands.
    let slow = {
        let session = session.clone();
        tokio::spawn(async move { session.refresh_all().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.set_namespace("team-b").await;
    slow.await.unwrap();

    // The late model-system snapshot must not have overwritten team-b.
    let models = session.store().models_snapshot();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "current");
}

#[tokio::test]
async fn active_namespace_falls_back_when_no_longer_known() {
    let server = MockServer::start().await;
    let state = TempDir::new().unwrap();
    mount_namespaces(&server, &["team-x", "team-y"]).await;
    mount_collections(&server, "team-x", vec![], None).await;

    let session = Session::new(config(&server, &state)).unwrap();
    assert_eq!(session.active_namespace(), "model-system");

    session.refresh_namespaces().await;

    assert_eq!(session.active_namespace(), "team-x");
    let known: Vec<String> = session
        .known_namespaces()
        .iter()
        .map(|n| n.name.clone())
        .collect();
    assert_eq!(known, vec!["team-x", "team-y"]);
}

// ── Optimistic delete ───────────────────────────────────────────────

#[tokio::test]
async fn optimistic_delete_removes_locally_even_when_server_fails() {
    let server = MockServer::start().await;
    let state = TempDir::new().unwrap();
    mount_collections(
        &server,
        "model-system",
        vec![model_json("doomed", "model-system", "READY")],
        None,
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/models/model-system/doomed"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;

    let session = Session::new(config(&server, &state)).unwrap();
    session.refresh_all().await;
    assert_eq!(session.store().model_count(), 1);

    session.delete_model_optimistic("model-system", "doomed");

    // Removal is immediate, not gated on the DELETE round trip.
    assert_eq!(session.store().model_count(), 0);

    // And it stays removed -- a failed delete is not rolled back.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(session.store().model_count(), 0);
}

// ── Event feed ──────────────────────────────────────────────────────

#[tokio::test]
async fn event_feed_reconciles_into_the_store() {
    let server = MockServer::start().await;
    let state = TempDir::new().unwrap();
    mount_collections(
        &server,
        "model-system",
        vec![model_json("m1", "model-system", "PENDING")],
        None,
    )
    .await;
    mount_namespaces(&server, &["model-system"]).await;

    let frame = format!(
        "event: modified\ndata: {}\n\n",
        json!({
            "resource": "models",
            "action": "modified",
            "payload": model_json("m1", "model-system", "READY")
        })
    );
    Mock::given(method("GET"))
        .and(path("/api/sse"))
        .and(query_param("namespace", "model-system"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(frame, "text/event-stream"))
        .mount(&server)
        .await;

    let mut config = config(&server, &state);
    config.events_enabled = true;

    let session = Session::new(config).unwrap();
    session.start().await;

    // Snapshot delivered PENDING; the event flips it to READY in place.
    {
        let store = session.store().clone();
        wait_for(move || {
            let models = store.models_snapshot();
            models.len() == 1 && models[0].status == Phase::Ready
        })
        .await;
    }

    let models = session.store().models_snapshot();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "m1");

    session.shutdown().await;
}
