//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use calendar_proxy::{AppState, BookingClient};
use practice_calendar::LayoutOptions;

/// Bookings of the week of 2024-03-04, wrapped the way the backend nests them.
pub fn week_bookings() -> Value {
    json!({
        "success": true,
        "data": {
            "data": [
                { "id": "a", "start": "2024-03-04T09:00:00", "end": "2024-03-04T09:30:00",
                  "title": "Checkup", "staffId": "s1", "staffName": "Dr. Huber" },
                { "id": "b", "start": "2024-03-04T09:00:00", "end": "2024-03-04T10:00:00",
                  "title": "Vaccination", "staffId": "s2", "staffName": "Nurse Berger",
                  "roomId": "r1", "roomName": "Room 1" },
                { "id": "c", "start": "2024-03-04T11:00:00", "end": "2024-03-04T11:45:00",
                  "title": "Lab review", "staffId": "s1", "staffName": "Dr. Huber" },
                { "id": "d", "start": "2024-03-05T08:00:00", "end": "2024-03-05T08:20:00",
                  "title": "Blood draw", "staffId": "s2", "staffName": "Nurse Berger" }
            ]
        },
        "message": "ok"
    })
}

/// Mocks `GET /bookings` for any window. `hits` is the exact number of calls
/// the test expects.
pub async fn mock_bookings(server: &mut ServerGuard, body: &Value, hits: usize) -> Mock {
    server
        .mock("GET", "/bookings")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(hits)
        .create_async()
        .await
}

/// Application state with a two-week horizon pointed at `backend_url`.
pub fn test_state(backend_url: &str) -> Arc<AppState> {
    Arc::new(AppState::new(
        BookingClient::new(backend_url),
        LayoutOptions::default(),
        2,
        16,
    ))
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, String, Option<String>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|value| value.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, String::from_utf8(body.to_vec()).unwrap(), content_type)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body, _) = get(app, uri).await;
    (status, serde_json::from_str(&body).unwrap_or(Value::Null))
}
