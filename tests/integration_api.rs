//! API Integration Tests
//!
//! End-to-end coverage of the daily-reset trigger over a live database.
//! Wall-clock dependent: each test picks a fixed-offset zone whose local
//! midnight falls in the current invocation window so the run never
//! short-circuits (and one whose midnight is hours away when it should).

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware, Router,
};
use chrono::{Timelike, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tower::util::ServiceExt;

use lane_reset::api::{self, AppState};

mod common;

/// Fixed-offset zone whose local midnight occurs at the given UTC hour
fn zone_with_midnight_at(utc_hour: u32) -> Tz {
    let name = if utc_hour <= 12 {
        format!("Etc/GMT+{}", utc_hour)
    } else {
        format!("Etc/GMT-{}", 24 - utc_hour)
    };
    name.parse().expect("valid Etc zone")
}

/// Zones covering the current and next UTC hour, so the window never goes
/// empty even if the hour flips mid-test
fn due_now_zones() -> (Tz, Vec<Tz>) {
    let hour = Utc::now().hour();
    let current = zone_with_midnight_at(hour);
    let next = zone_with_midnight_at((hour + 1) % 24);
    (current, vec![current, next])
}

fn test_app(state: AppState) -> Router {
    let protected = api::create_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::cron_auth_middleware,
        ));

    Router::new()
        .route("/health", axum::routing::get(api::routes::health_check))
        .merge(protected)
        .with_state(state)
}

fn trigger_request(secret: Option<&str>) -> Request<Body> {
    let builder = Request::builder().method("POST").uri("/jobs/daily-reset");
    let builder = match secret {
        Some(secret) => builder.header("x-cron-secret", secret),
        None => builder,
    };
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_trigger_requires_cron_secret() {
    let pool = common::setup_test_db().await;
    let (default_zone, zones) = due_now_zones();
    let state = AppState::new(pool, common::test_config(default_zone, zones));
    let app = test_app(state);

    // Missing header
    let response = app.clone().oneshot(trigger_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error_code"], "missing_cron_secret");

    // Wrong secret
    let response = app
        .clone()
        .oneshot(trigger_request(Some("wrong-secret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error_code"], "invalid_cron_secret");
}

#[tokio::test]
async fn test_daily_reset_e2e_idempotent() {
    let pool = common::setup_test_db().await;
    let (default_zone, zones) = due_now_zones();
    // Agent without a stored timezone: always a candidate, resolved to the
    // default zone, so the run is deterministic at any wall-clock hour
    let agent_id = common::seed_agent(&pool, None).await;

    let state = AppState::new(pool.clone(), common::test_config(default_zone, zones));
    let app = test_app(state);

    // First invocation performs the rollover
    let response = app
        .clone()
        .oneshot(trigger_request(Some(common::TEST_CRON_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["resetCount"], 1, "first run must reset the agent");
    assert_eq!(json["skippedCount"], 0);
    assert_eq!(json["idempotent"], true);
    assert!(json.get("errors").is_none());

    assert_eq!(common::daily_state_rows(&pool, agent_id).await, 1);
    let reset_at: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT reset_at FROM agent_daily_state WHERE agent_id = $1")
            .bind(agent_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(reset_at.is_some());

    // Second invocation in the same local day is a no-op
    let response = app
        .clone()
        .oneshot(trigger_request(Some(common::TEST_CRON_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["resetCount"], 0, "second run must not double-reset");
    assert_eq!(json["skippedCount"], 1);
}

#[tokio::test]
async fn test_agent_without_membership_not_reset() {
    let pool = common::setup_test_db().await;
    let (default_zone, zones) = due_now_zones();
    let agent_id = common::seed_agent_without_agency(&pool, None).await;

    let state = AppState::new(pool.clone(), common::test_config(default_zone, zones));
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(trigger_request(Some(common::TEST_CRON_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    // Excluded: neither reset, skipped, nor errored
    assert_eq!(json["resetCount"], 0);
    assert_eq!(json["skippedCount"], 0);
    assert!(json.get("errors").is_none());
    assert_eq!(common::daily_state_rows(&pool, agent_id).await, 0);
}

#[tokio::test]
async fn test_no_zones_due_short_circuits() {
    let pool = common::setup_test_db().await;
    // A zone whose midnight is hours away from now in either direction
    let far_hour = (Utc::now().hour() + 6) % 24;
    let far_zone = zone_with_midnight_at(far_hour);
    let agent_id = common::seed_agent(&pool, None).await;

    let state = AppState::new(
        pool.clone(),
        common::test_config(far_zone, vec![far_zone]),
    );
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(trigger_request(Some(common::TEST_CRON_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json.get("utcHour").is_some());
    assert!(json.get("resetCount").is_none());

    // Zero store writes
    assert_eq!(common::daily_state_rows(&pool, agent_id).await, 0);
}

#[tokio::test]
async fn test_zone_gated_agent_not_reset() {
    let pool = common::setup_test_db().await;
    let (default_zone, mut zones) = due_now_zones();
    // Agent pinned to a zone whose midnight is far from this window
    let far_zone = zone_with_midnight_at((Utc::now().hour() + 6) % 24);
    zones.push(far_zone);
    let agent_id = common::seed_agent(&pool, Some(far_zone.name())).await;

    let state = AppState::new(pool.clone(), common::test_config(default_zone, zones));
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(trigger_request(Some(common::TEST_CRON_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["resetCount"], 0);
    assert_eq!(common::daily_state_rows(&pool, agent_id).await, 0);
}

#[tokio::test]
async fn test_health_check() {
    let pool = common::setup_test_db().await;
    let (default_zone, zones) = due_now_zones();
    let state = AppState::new(pool, common::test_config(default_zone, zones));
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
