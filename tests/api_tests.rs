use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use fleet_status::config::environment::EnvironmentConfig;
use fleet_status::models::vehicle::{Vehicle, VehicleStatus};
use fleet_status::repositories::InMemoryVehicleStore;
use fleet_status::routes::{create_router, OPERATOR_HEADER};
use fleet_status::state::AppState;

struct TestApp {
    _dir: TempDir,
    router: Router,
}

fn create_test_app(environment: &str) -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = EnvironmentConfig {
        environment: environment.to_string(),
        audit_log_dir: dir.path().to_path_buf(),
        ..EnvironmentConfig::default()
    };
    let store = InMemoryVehicleStore::with_vehicles(vec![
        Vehicle::new(1, "BMW 4-Series", VehicleStatus::Good),
        Vehicle::new(2, "Audi RS6", VehicleStatus::Bad),
    ]);
    let state = AppState::new(config, Arc::new(store)).unwrap();
    TestApp {
        _dir: dir,
        router: create_router(state),
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, payload: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .header(OPERATOR_HEADER, "dispatcher")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app("development");
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["auditWriteFailures"], 0);
}

#[tokio::test]
async fn test_list_vehicles() {
    let app = create_test_app("development");
    let (status, body) = app.get("/api/vehicles").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["name"], "BMW 4-Series");
    assert_eq!(body["data"][0]["status"], "Хорошее");
}

#[tokio::test]
async fn test_resolve_returns_ranked_candidates() {
    let app = create_test_app("development");
    let (status, body) = app.post("/api/vehicles/resolve", json!({ "name": "bmw 4-series" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["vehicle"]["id"], 1);
    assert_eq!(body["data"][0]["similarity"], 1.0);
    assert_eq!(body["data"][0]["matchType"], "case-insensitive");
}

#[tokio::test]
async fn test_resolve_rejects_out_of_range_threshold() {
    let app = create_test_app("development");
    let (status, body) = app
        .post("/api/vehicles/resolve", json!({ "name": "Audi", "minSimilarity": 1.5 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_validation_endpoints() {
    let app = create_test_app("development");

    let (_, body) = app.post("/api/status/validate", json!({ "status": "  СРЕДНЕЕ " })).await;
    assert_eq!(body["data"]["isValid"], true);
    assert_eq!(body["data"]["normalizedStatus"], "Среднее");

    let (_, body) = app.post("/api/status/validate", json!({ "status": "" })).await;
    assert_eq!(body["data"]["isValid"], false);

    let (_, body) = app
        .post("/api/status/transition", json!({ "oldStatus": "good", "newStatus": "bad" }))
        .await;
    assert_eq!(body["data"]["isDowngrade"], true);
    assert!(body["data"]["warning"].is_string());

    let (status, _) = app
        .post("/api/status/transition", json!({ "oldStatus": "good", "newStatus": "shiny" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.post("/api/status/name", json!({ "name": "X" })).await;
    assert_eq!(body["data"]["isValid"], false);
}

#[tokio::test]
async fn test_single_update_and_vehicle_history() {
    let app = create_test_app("development");
    let (status, body) = app
        .post("/api/status/update", json!({ "carName": "Audi RS6", "status": "хорошее" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(body["data"]["oldStatus"], "Плохое");
    assert_eq!(body["data"]["newStatus"], "Хорошее");

    let (status, body) = app.get("/api/audit/vehicle/2?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["event"], "status_update");
    assert_eq!(entries[0]["operator"], "dispatcher");
    assert_eq!(entries[0]["source"], "http");
}

#[tokio::test]
async fn test_unknown_vehicle_carries_suggestions() {
    let app = create_test_app("development");
    let (status, body) = app
        .post("/api/status/update", json!({ "carName": "Audi", "status": "good" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["data"]["suggestions"][0], "Audi RS6");
}

#[tokio::test]
async fn test_batch_endpoint() {
    let app = create_test_app("development");
    let (status, body) = app
        .post(
            "/api/status/batch",
            json!([
                { "carName": "BMW 4-Series", "status": "среднее" },
                { "carName": "Audi RS6", "status": "плохое" },
                { "status": "good" }
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let report = &body["data"];
    assert_eq!(report["total"], 3);
    assert_eq!(report["summary"]["updated"], 1);
    assert_eq!(report["summary"]["unchanged"], 1);
    assert_eq!(report["summary"]["failed"], 1);
    assert!(report["reportText"].as_str().unwrap().contains("BMW 4-Series"));

    let batch_id = report["batchId"].as_str().unwrap();
    let (_, body) = app.get(&format!("/api/audit/batch/{}", batch_id)).await;
    let events: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(
        events,
        vec!["batch_start", "status_update", "status_update", "status_update", "batch_complete"]
    );
}

#[tokio::test]
async fn test_batch_rejects_non_array() {
    let app = create_test_app("development");
    let (status, body) = app.post("/api/status/batch", json!({ "carName": "Audi RS6" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_stats_window() {
    let app = create_test_app("development");
    app.post("/api/status/update", json!({ "carName": "Audi RS6", "status": "average" }))
        .await;
    app.post("/api/status/update", json!({ "carName": "Tesla", "status": "average" }))
        .await;

    let (status, body) = app
        .get("/api/audit/stats?start=2000-01-01T00:00:00Z&end=2100-01-01T00:00:00Z")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalUpdates"], 2);
    assert_eq!(body["data"]["successfulUpdates"], 1);
    assert_eq!(body["data"]["failedUpdates"], 1);

    let (status, _) = app
        .get("/api/audit/stats?start=2100-01-01T00:00:00Z&end=2000-01-01T00:00:00Z")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_archive_with_nothing_old() {
    let app = create_test_app("development");
    app.post("/api/status/update", json!({ "carName": "Audi RS6", "status": "average" }))
        .await;

    let (status, body) = app.post("/api/audit/archive", json!({ "daysToKeep": 30 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["archived"], 0);
    assert_eq!(body["data"]["retained"], 1);
}

#[tokio::test]
async fn test_clear_is_refused_in_production() {
    let app = create_test_app("production");
    let (status, body) = app
        .send(Request::delete("/api/audit").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let app = create_test_app("development");
    let (status, _) = app
        .send(Request::delete("/api/audit").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_count_outcomes() {
    let app = create_test_app("development");
    app.post("/api/status/update", json!({ "carName": "Audi RS6", "status": "good" }))
        .await;

    let (status, body) = app.get("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("fleet_status_status_updates_total"));
    assert!(text.contains("outcome=\"updated\""));
}

#[tokio::test]
async fn test_operator_in_body_overrides_header() {
    let app = create_test_app("development");
    app.post(
        "/api/status/update",
        json!({ "carName": "BMW 4-Series", "status": "average", "operator": "night-shift", "reason": "inspection" }),
    )
    .await;

    let (_, body) = app.get("/api/audit/vehicle/1").await;
    assert_eq!(body["data"][0]["operator"], "night-shift");
    assert_eq!(body["data"][0]["reason"], "inspection");
}
