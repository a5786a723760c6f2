use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use ridepool_geo::{rank_by_proximity, Coordinate, ProximityOptions, Ranked};
use ridepool_shared::LocationUpdateEvent;
use ridepool_store::Presence;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct LocationUpdateRequest {
    user_id: Uuid,
    latitude: f64,
    longitude: f64,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyParams {
    user_id: Uuid,
    latitude: f64,
    longitude: f64,
    radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
struct NearbyResponse {
    users: Vec<Ranked<Presence>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/location/update", post(update_location))
        .route("/v1/location/nearby", get(nearby_users))
}

async fn update_location(
    State(state): State<AppState>,
    Json(req): Json<LocationUpdateRequest>,
) -> Result<Json<Presence>, AppError> {
    let position = Coordinate::new(req.latitude, req.longitude)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let presence = state
        .store
        .update_presence(req.user_id, position, req.address)
        .await;

    // Live subscribers are best effort; nobody listening is not an error.
    let _ = state.location_tx.send(LocationUpdateEvent {
        user_id: presence.user_id,
        latitude: position.latitude,
        longitude: position.longitude,
        address: presence.address.clone(),
        updated_at: presence.updated_at.timestamp(),
    });

    Ok(Json(presence))
}

async fn nearby_users(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<NearbyResponse>, AppError> {
    let reference = Coordinate::new(params.latitude, params.longitude)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let candidates = state
        .store
        .other_presences(params.user_id)
        .await
        .into_iter()
        .map(|p| (p.position, p));

    let users = rank_by_proximity(
        reference,
        candidates,
        ProximityOptions {
            max_distance_km: Some(
                params
                    .radius_km
                    .unwrap_or(state.discovery.nearby_radius_km),
            ),
            limit: None,
        },
    );

    Ok(Json(NearbyResponse { users }))
}
