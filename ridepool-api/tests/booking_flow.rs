use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use ridepool_api::{app, AppState};
use ridepool_booking::BookingService;
use ridepool_store::app_config::{BookingRules, DiscoveryConfig};
use ridepool_store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let (notification_tx, _) = tokio::sync::broadcast::channel(16);
    let (location_tx, _) = tokio::sync::broadcast::channel(16);
    let store = Arc::new(MemoryStore::with_events(notification_tx.clone()));
    let bookings = Arc::new(BookingService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));

    app(AppState {
        store,
        bookings,
        notification_tx,
        location_tx,
        discovery: DiscoveryConfig {
            max_distance_km: 2.0,
            result_limit: 20,
            nearby_radius_km: 2.0,
        },
        booking_rules: BookingRules {
            max_seats_per_booking: 8,
        },
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/users",
        Some(json!({ "name": name, "phone": "+91-98100-00000", "rating": 4.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn create_offer(app: &Router, owner: &str, seats: i32) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/rides/offer",
        Some(json!({
            "user_id": owner,
            "origin_address": "Connaught Place",
            "origin_latitude": 28.6315,
            "origin_longitude": 77.2167,
            "destination_address": "Delhi University",
            "destination_latitude": 28.7041,
            "destination_longitude": 77.1025,
            "departure_time": "2026-09-01T08:30:00Z",
            "seats_available": seats,
            "price_per_seat": 120.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["ride_id"].as_str().unwrap().to_string()
}

async fn seats_available(app: &Router, owner: &str, ride_id: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::GET,
        &format!("/v1/rides/user/{}", owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == ride_id)
        .unwrap()["seats_available"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn test_booking_accept_cancel_round_trip_over_http() {
    let app = test_app();
    let driver = create_user(&app, "Dev").await;
    let passenger = create_user(&app, "Asha").await;
    let ride_id = create_offer(&app, &driver, 2).await;

    // Request a seat
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(json!({
            "ride_id": ride_id,
            "passenger_id": passenger,
            "seats_requested": 1,
            "message": "pick me up at the gate"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "pending");
    let booking_id = body["booking_id"].as_str().unwrap().to_string();
    assert_eq!(seats_available(&app, &driver, &ride_id).await, 2);

    // Driver accepts and the pool shrinks
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/bookings/{}/action?actor_id={}", booking_id, driver),
        Some(json!({ "action": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "accepted");
    assert_eq!(seats_available(&app, &driver, &ride_id).await, 1);

    // Passenger cancels and the pool is restored
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/bookings/{}/action?actor_id={}", booking_id, passenger),
        Some(json!({ "action": "cancel" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(seats_available(&app, &driver, &ride_id).await, 2);

    // The driver's inbox saw the request and the cancellation
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/v1/notifications/{}", driver),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"booking_request"));
    assert!(kinds.contains(&"booking_cancelled"));
}

#[tokio::test]
async fn test_unknown_action_token_is_bad_request() {
    let app = test_app();
    let driver = create_user(&app, "Dev").await;
    let passenger = create_user(&app, "Asha").await;
    let ride_id = create_offer(&app, &driver, 2).await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(json!({ "ride_id": ride_id, "passenger_id": passenger })),
    )
    .await;
    let booking_id = body["booking_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/bookings/{}/action?actor_id={}", booking_id, driver),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid action"));
}

#[tokio::test]
async fn test_self_booking_is_conflict() {
    let app = test_app();
    let driver = create_user(&app, "Dev").await;
    let ride_id = create_offer(&app, &driver, 2).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(json!({ "ride_id": ride_id, "passenger_id": driver })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_offer_discovery_ranks_by_destination_distance() {
    let app = test_app();
    let driver = create_user(&app, "Dev").await;

    let near = create_offer(&app, &driver, 2).await;
    // A second offer towards a destination ~12 km away from the query point
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/rides/offer",
        Some(json!({
            "user_id": driver,
            "origin_address": "Connaught Place",
            "origin_latitude": 28.6315,
            "origin_longitude": 77.2167,
            "destination_address": "Connaught Place",
            "destination_latitude": 28.6139,
            "destination_longitude": 77.2090,
            "departure_time": "2026-09-01T09:00:00Z",
            "seats_available": 3,
            "price_per_seat": 80.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/rides/offers?destination_lat=28.7041&destination_lng=77.1025&max_distance=5.0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    // Only the nearby destination survives the 5 km cut
    let rides = body["rides"].as_array().unwrap();
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0]["id"], near);
    assert!(rides[0]["distance_km"].as_f64().unwrap() <= 5.0);
    assert_eq!(rides[0]["owner_name"], "Dev");
}

#[tokio::test]
async fn test_ride_update_is_owner_only() {
    let app = test_app();
    let driver = create_user(&app, "Dev").await;
    let stranger = create_user(&app, "Sam").await;
    let ride_id = create_offer(&app, &driver, 2).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/v1/rides/{}?user_id={}", ride_id, stranger),
        Some(json!({ "price_per_seat": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/v1/rides/{}?user_id={}", ride_id, driver),
        Some(json!({ "price_per_seat": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_per_seat"], 50.0);
}

#[tokio::test]
async fn test_cancelled_ride_rejects_new_bookings() {
    let app = test_app();
    let driver = create_user(&app, "Dev").await;
    let passenger = create_user(&app, "Asha").await;
    let ride_id = create_offer(&app, &driver, 2).await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/v1/rides/{}?user_id={}", ride_id, driver),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/bookings",
        Some(json!({ "ride_id": ride_id, "passenger_id": passenger })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_nearby_users_respects_radius() {
    let app = test_app();
    let me = create_user(&app, "Me").await;
    let close = create_user(&app, "Close").await;
    let far = create_user(&app, "Far").await;

    for (user, lat, lon) in [
        (&me, 28.6139, 77.2090),
        (&close, 28.6200, 77.2100),
        (&far, 28.7041, 77.1025),
    ] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/location/update",
            Some(json!({ "user_id": user, "latitude": lat, "longitude": lon })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        &format!(
            "/v1/location/nearby?user_id={}&latitude=28.6139&longitude=77.2090&radius_km=2.0",
            me
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["user_id"], close);
}
