use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use showtime_api::{app, ApiKeyGate, AppState};
use showtime_booking::BookingEngine;
use showtime_catalog::{InMemoryCatalog, SeatLedger};
use showtime_core::{CoreError, CoreResult, ManualClock, SeatId, Show, ShowCatalog, ShowId, ShowWindow};
use showtime_hold::{ExpirySweeper, HoldManager};
use showtime_store::EventProducer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const KEY: &str = "test-key";

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
    state: AppState,
}

fn show() -> Show {
    let starts_at = Utc::now() + Duration::days(2);
    Show {
        id: ShowId(1),
        movie_title: "Action Movie".to_string(),
        cinema: "Paris Central Cinema".to_string(),
        window: ShowWindow { starts_at, ends_at: starts_at + Duration::hours(2) },
        seats: ["A1", "A2", "A3", "B1", "B2"].into_iter().map(SeatId::from).collect(),
    }
}

fn test_app(keys: &[&str]) -> TestApp {
    test_app_with(Arc::new(InMemoryCatalog::from_shows([show()])), keys)
}

fn test_app_with(catalog: Arc<dyn ShowCatalog>, keys: &[&str]) -> TestApp {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let events = EventProducer::default();
    let holds = Arc::new(HoldManager::new(
        Arc::new(SeatLedger::new()),
        clock.clone(),
        events.clone(),
        Duration::minutes(5),
    ));
    let engine = Arc::new(BookingEngine::new(catalog, holds, 4));
    let state = AppState::new(engine, events, ApiKeyGate::new(keys.iter().map(|k| k.to_string())));

    TestApp { router: app(state.clone()), clock, state }
}

/// Catalog that can be switched into failing every lookup.
struct FlakyCatalog {
    inner: InMemoryCatalog,
    down: AtomicBool,
}

#[async_trait]
impl ShowCatalog for FlakyCatalog {
    async fn get_show(&self, show_id: ShowId) -> CoreResult<Option<Show>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CoreError::CatalogError("catalog offline".to_string()));
        }
        self.inner.get_show(show_id).await
    }

    async fn list_shows(&self) -> CoreResult<Vec<Show>> {
        self.inner.list_shows().await
    }
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri).header("x-api-key", KEY);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn hold(app: &TestApp, seats: &[&str]) -> (StatusCode, Value) {
    send(app, Method::POST, "/v1/bookings/hold", Some(json!({ "show_id": 1, "seat_ids": seats }))).await
}

async fn confirm(app: &TestApp, hold_id: &Value) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/v1/bookings/confirm",
        Some(json!({ "hold_id": hold_id, "user_name": "Jane Doe", "user_email": "jane@example.com" })),
    )
    .await
}

#[tokio::test]
async fn test_health_needs_no_key() {
    let app = test_app(&[KEY]);
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_key_gate() {
    let app = test_app(&[KEY]);

    let missing = Request::builder().uri("/v1/shows/1/seats").body(Body::empty()).unwrap();
    assert_eq!(app.router.clone().oneshot(missing).await.unwrap().status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/v1/shows/1/seats")
        .header("x-api-key", "nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.router.clone().oneshot(wrong).await.unwrap().status(), StatusCode::UNAUTHORIZED);

    let query = Request::builder()
        .uri(format!("/v1/shows/1/seats?api_dev_key={}", KEY))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.router.clone().oneshot(query).await.unwrap().status(), StatusCode::OK);

    let encoded = Request::builder()
        .uri("/v1/shows/1/seats?api_dev_key=test%2Dkey")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.router.clone().oneshot(encoded).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_open_gate_without_keys() {
    let app = test_app(&[]);
    let request = Request::builder().uri("/v1/shows/1/seats").body(Body::empty()).unwrap();
    assert_eq!(app.router.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_hold_confirm_and_lookup() {
    let app = test_app(&[KEY]);

    let (status, held) = hold(&app, &["A1", "A2"]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(held["show_id"], 1);
    assert_eq!(held["seat_ids"], json!(["A1", "A2"]));
    assert_eq!(held["status"], "ACTIVE");

    let (status, booked) = confirm(&app, &held["hold_id"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booked["status"], "CONFIRMED");
    assert_eq!(booked["seats"], json!(["A1", "A2"]));

    // retry returns the same booking
    let (status, again) = confirm(&app, &held["hold_id"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["booking_id"], booked["booking_id"]);

    let uri = format!("/v1/bookings/{}", booked["booking_id"].as_str().unwrap());
    let (status, booking) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["movie_title"], "Action Movie");
    assert_eq!(booking["user_email"], "jane@example.com");

    let (_, map) = send(&app, Method::GET, "/v1/shows/1/seats", None).await;
    assert_eq!(map["availability"]["booked"], 2);
    let a1 = map["seats"].as_array().unwrap().iter().find(|s| s["seat_id"] == "A1").unwrap();
    assert_eq!(a1["status"], "booked");
}

#[tokio::test]
async fn test_conflicting_hold_is_409() {
    let app = test_app(&[KEY]);
    hold(&app, &["B1"]).await;

    let (status, body) = hold(&app, &["B1", "B2"]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SEATS_UNAVAILABLE");
    assert_eq!(body["seats"], json!(["B1"]));
}

#[tokio::test]
async fn test_expired_hold_is_410_after_sweep() {
    let app = test_app(&[KEY]);
    let (_, held) = hold(&app, &["A3"]).await;

    app.clock.advance(Duration::minutes(6));
    let sweeper = ExpirySweeper::new(
        app.state.engine.holds().clone(),
        std::time::Duration::from_secs(1),
        Duration::hours(1),
    );
    assert_eq!(sweeper.sweep_once().await.expired, 1);

    let (status, body) = confirm(&app, &held["hold_id"]).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "HOLD_EXPIRED");

    let (_, map) = send(&app, Method::GET, "/v1/shows/1/seats", None).await;
    assert_eq!(map["availability"]["available"], 5);
}

#[tokio::test]
async fn test_cancel_hold() {
    let app = test_app(&[KEY]);
    let (_, held) = hold(&app, &["A1"]).await;
    let uri = format!("/v1/bookings/hold/{}", held["hold_id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (status, _) = hold(&app, &["A1"]).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_not_found_and_validation_errors() {
    let app = test_app(&[KEY]);

    let (status, body) = confirm(&app, &json!(uuid::Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "HOLD_NOT_FOUND");

    let uri = format!("/v1/bookings/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "BOOKING_NOT_FOUND");

    let (status, body) = send(&app, Method::GET, "/v1/bookings/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = hold(&app, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = hold(&app, &["A1", "Z9"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        send(&app, Method::POST, "/v1/bookings/hold", Some(json!({ "show_id": 99, "seat_ids": ["A1"] }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SHOW_NOT_FOUND");

    let (_, held) = hold(&app, &["B2"]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/bookings/confirm",
        Some(json!({ "hold_id": held["hold_id"], "user_name": "Jane", "user_email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_booking_lookup_survives_catalog_outage() {
    let catalog = Arc::new(FlakyCatalog { inner: InMemoryCatalog::from_shows([show()]), down: AtomicBool::new(false) });
    let app = test_app_with(catalog.clone(), &[KEY]);

    let (_, held) = hold(&app, &["A2"]).await;
    let (_, booked) = confirm(&app, &held["hold_id"]).await;
    catalog.down.store(true, Ordering::SeqCst);

    let uri = format!("/v1/bookings/{}", booked["booking_id"].as_str().unwrap());
    let (status, booking) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["seats"], json!(["A2"]));
    assert_eq!(booking["movie_title"], Value::Null);
    assert_eq!(booking["show_time"], Value::Null);
}
