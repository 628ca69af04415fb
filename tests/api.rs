use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use cinema_seating::config::SelectionConfig;
use cinema_seating::models::Seat;
use cinema_seating::services::inventory::InMemorySeatInventory;
use cinema_seating::services::seat_validator::MessageLocale;
use cinema_seating::services::selection::InMemorySelectionStore;
use cinema_seating::{app, AppState};

// Зал 1: ряды A и B по 6 мест, B3 продано.
fn test_app() -> Router {
    let mut seats = Vec::new();
    for row in ["A", "B"] {
        for number in 1..=6 {
            seats.push(Seat::new(row, number, !(row == "B" && number == 3)));
        }
    }

    let settings = SelectionConfig {
        ttl_seconds: 600,
        max_seats: 8,
        locale: MessageLocale::En,
    };
    let state = AppState::with_backends(
        Arc::new(InMemorySeatInventory::with_room(1, seats)),
        Arc::new(InMemorySelectionStore::new()),
        &settings,
    );
    app(state)
}

fn request(method: &str, uri: &str, session: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header("X-Booking-Session", session.to_string());
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn readiness_with_in_memory_backends() {
    let app = test_app();
    let (status, body) = send(&app, request("GET", "/ready", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn validates_posted_layout() {
    let app = test_app();
    let payload = json!({
        "seats": [
            {"id": "C1", "row": "C", "number": 1, "isAvailable": true},
            {"id": "C2", "row": "C", "number": 2, "isAvailable": true},
            {"id": "C3", "row": "C", "number": 3, "isAvailable": true}
        ],
        "selectedSeatIds": ["C1", "C3"]
    });

    let (status, body) = send(&app, request("POST", "/api/seats/validate", None, Some(payload))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert_eq!(body["code"], "GAP_BETWEEN_SELECTIONS");
    assert!(body["message"].as_str().unwrap().contains("row C"));
}

#[tokio::test]
async fn empty_selection_is_valid_without_message() {
    let app = test_app();
    let payload = json!({
        "seats": [{"id": "A1", "row": "A", "number": 1, "isAvailable": true}],
        "selectedSeatIds": []
    });

    let (status, body) = send(&app, request("POST", "/api/seats/validate", None, Some(payload))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "isValid": true }));
}

#[tokio::test]
async fn validates_against_room_layout() {
    let app = test_app();
    let payload = json!({ "selectedSeatIds": ["B2", "B4"] });

    let (status, body) = send(&app, request("POST", "/api/rooms/1/validate", None, Some(payload))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert_eq!(body["code"], "AVOIDABLE_ORPHAN");
}

#[tokio::test]
async fn unknown_room_is_not_found() {
    let app = test_app();
    let (status, body) = send(&app, request("GET", "/api/rooms/99/seats", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn non_positive_room_id_is_rejected() {
    let app = test_app();
    let (status, _) = send(&app, request("GET", "/api/rooms/0/seats", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn room_seats_are_ordered() {
    let app = test_app();
    let (status, body) = send(&app, request("GET", "/api/rooms/1/seats", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roomId"], 1);

    let seats = body["seats"].as_array().unwrap();
    assert_eq!(seats.len(), 12);
    assert_eq!(seats[0]["id"], "A1");
    assert_eq!(seats[6]["id"], "B1");
    assert_eq!(seats[8]["isAvailable"], false);
}

#[tokio::test]
async fn select_flow_keeps_only_valid_selections() {
    let app = test_app();
    let session = Uuid::new_v4();

    let (status, body) = send(
        &app,
        request("PATCH", "/api/rooms/1/selection/select", Some(session), Some(json!({"seatId": "A1"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["isValid"], true);
    assert_eq!(body["selectedSeatIds"], json!(["A1"]));

    let (status, body) = send(
        &app,
        request("PATCH", "/api/rooms/1/selection/select", Some(session), Some(json!({"seatId": "A3"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["isValid"], false);
    assert_eq!(body["selectedSeatIds"], json!(["A1"]));

    let (status, body) = send(&app, request("GET", "/api/rooms/1/selection", Some(session), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session.to_string());
    assert_eq!(body["selectedSeatIds"], json!(["A1"]));
}

#[tokio::test]
async fn selection_requires_session_header() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request("PATCH", "/api/rooms/1/selection/select", None, Some(json!({"seatId": "A1"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn sold_seat_conflicts() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request("PATCH", "/api/rooms/1/selection/select", Some(Uuid::new_v4()), Some(json!({"seatId": "B3"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn empty_seat_id_fails_validation() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request("PATCH", "/api/rooms/1/selection/select", Some(Uuid::new_v4()), Some(json!({"seatId": ""}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn release_and_clear() {
    let app = test_app();
    let session = Uuid::new_v4();

    for seat in ["A1", "A2"] {
        send(
            &app,
            request("PATCH", "/api/rooms/1/selection/select", Some(session), Some(json!({"seatId": seat}))),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        request("PATCH", "/api/rooms/1/selection/release", Some(session), Some(json!({"seatId": "A1"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selectedSeatIds"], json!(["A2"]));

    let (status, _) = send(&app, request("DELETE", "/api/rooms/1/selection", Some(session), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, request("GET", "/api/rooms/1/selection", Some(session), None)).await;
    assert_eq!(body["selectedSeatIds"], json!([]));
}

#[tokio::test]
async fn cache_invalidation_is_a_no_op_without_cache() {
    let app = test_app();
    let (status, _) = send(&app, request("POST", "/api/rooms/1/cache/invalidate", None, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
