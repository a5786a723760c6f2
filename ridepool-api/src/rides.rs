use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use ridepool_domain::{
    Place, Ride, RidePatch, RideRepository, RideStatus, RideType, UserRepository,
};
use ridepool_geo::{rank_by_proximity, Coordinate, ProximityOptions, Ranked};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct RideOfferCreate {
    user_id: Uuid,
    origin_address: String,
    origin_latitude: f64,
    origin_longitude: f64,
    destination_address: String,
    destination_latitude: f64,
    destination_longitude: f64,
    departure_time: DateTime<Utc>,
    #[serde(default = "default_seats")]
    seats_available: i32,
    price_per_seat: f64,
}

#[derive(Debug, Deserialize)]
struct RideRequestCreate {
    user_id: Uuid,
    origin_address: String,
    origin_latitude: f64,
    origin_longitude: f64,
    destination_address: String,
    destination_latitude: f64,
    destination_longitude: f64,
    departure_time: DateTime<Utc>,
    #[serde(default = "default_seats")]
    seats_needed: i32,
    max_price_per_seat: f64,
}

fn default_seats() -> i32 {
    1
}

#[derive(Debug, Serialize)]
struct RideCreatedResponse {
    ride_id: Uuid,
    origin: String,
    destination: String,
    status: RideStatus,
}

#[derive(Debug, Deserialize)]
struct DiscoveryParams {
    destination_lat: f64,
    destination_lng: f64,
    max_distance: Option<f64>,
    max_price: Option<f64>,
    min_price: Option<f64>,
    limit: Option<usize>,
}

/// A discovered ride decorated with owner display fields.
#[derive(Debug, Clone, Serialize)]
struct DiscoveredRide {
    #[serde(flatten)]
    ride: Ride,
    owner_name: String,
    owner_rating: f64,
}

#[derive(Debug, Serialize)]
struct DiscoveryResponse {
    rides: Vec<Ranked<DiscoveredRide>>,
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct UserRidesParams {
    ride_type: Option<RideType>,
    status: Option<RideStatus>,
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    user_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rides/offer", post(create_ride_offer))
        .route("/v1/rides/request", post(create_ride_request))
        .route("/v1/rides/offers", get(get_ride_offers))
        .route("/v1/rides/requests", get(get_ride_requests))
        .route("/v1/rides/user/{user_id}", get(get_user_rides))
        .route("/v1/rides/{ride_id}", put(update_ride))
        .route("/v1/rides/{ride_id}", delete(cancel_ride))
}

fn parse_place(address: String, latitude: f64, longitude: f64) -> Result<Place, AppError> {
    let position = Coordinate::new(latitude, longitude)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Place { address, position })
}

async fn create_ride_offer(
    State(state): State<AppState>,
    Json(req): Json<RideOfferCreate>,
) -> Result<Json<RideCreatedResponse>, AppError> {
    create_ride(
        &state,
        req.user_id,
        RideType::Offer,
        parse_place(req.origin_address, req.origin_latitude, req.origin_longitude)?,
        parse_place(
            req.destination_address,
            req.destination_latitude,
            req.destination_longitude,
        )?,
        req.departure_time,
        req.seats_available,
        req.price_per_seat,
    )
    .await
}

async fn create_ride_request(
    State(state): State<AppState>,
    Json(req): Json<RideRequestCreate>,
) -> Result<Json<RideCreatedResponse>, AppError> {
    create_ride(
        &state,
        req.user_id,
        RideType::Request,
        parse_place(req.origin_address, req.origin_latitude, req.origin_longitude)?,
        parse_place(
            req.destination_address,
            req.destination_latitude,
            req.destination_longitude,
        )?,
        req.departure_time,
        req.seats_needed,
        req.max_price_per_seat,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn create_ride(
    state: &AppState,
    user_id: Uuid,
    ride_type: RideType,
    origin: Place,
    destination: Place,
    departure_time: DateTime<Utc>,
    seats: i32,
    price_per_seat: f64,
) -> Result<Json<RideCreatedResponse>, AppError> {
    // 1. Verify the owner exists
    state
        .store
        .get_user(user_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // 2. Validate the seat pool
    if seats < 1 {
        return Err(AppError::BadRequest(
            "Seats must be at least 1".to_string(),
        ));
    }
    if price_per_seat < 0.0 {
        return Err(AppError::BadRequest(
            "Price must not be negative".to_string(),
        ));
    }

    // 3. Store the ride
    let ride = Ride::new(
        user_id,
        ride_type,
        origin,
        destination,
        departure_time,
        seats,
        price_per_seat,
    );
    state
        .store
        .create_ride(&ride)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(ride_id = %ride.id, ?ride_type, "ride created");

    Ok(Json(RideCreatedResponse {
        ride_id: ride.id,
        origin: ride.origin.address,
        destination: ride.destination.address,
        status: ride.status,
    }))
}

/// Price filter plus proximity ranking over active rides. Pure so the
/// discovery behavior is testable without a store.
fn rank_rides(
    rides: Vec<DiscoveredRide>,
    destination: Coordinate,
    max_distance_km: f64,
    limit: usize,
    price_ok: impl Fn(f64) -> bool,
) -> Vec<Ranked<DiscoveredRide>> {
    let candidates = rides
        .into_iter()
        .filter(|r| price_ok(r.ride.price_per_seat))
        .map(|r| (r.ride.destination.position, r));

    rank_by_proximity(
        destination,
        candidates,
        ProximityOptions {
            max_distance_km: Some(max_distance_km),
            limit: Some(limit),
        },
    )
}

async fn discover(
    state: &AppState,
    ride_type: RideType,
    params: DiscoveryParams,
    price_ok: impl Fn(f64) -> bool,
) -> Result<Json<DiscoveryResponse>, AppError> {
    let destination = Coordinate::new(params.destination_lat, params.destination_lng)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let rides = state
        .store
        .list_active(ride_type)
        .await
        .map_err(AppError::internal)?;

    // Decorate with owner display fields before ranking
    let mut decorated = Vec::with_capacity(rides.len());
    for ride in rides {
        let owner = state
            .store
            .get_user(ride.owner_id)
            .await
            .map_err(AppError::internal)?;
        let (owner_name, owner_rating) = match owner {
            Some(user) => (user.name, user.rating),
            None => ("Unknown".to_string(), 0.0),
        };
        decorated.push(DiscoveredRide {
            ride,
            owner_name,
            owner_rating,
        });
    }

    let ranked = rank_rides(
        decorated,
        destination,
        params.max_distance.unwrap_or(state.discovery.max_distance_km),
        params.limit.unwrap_or(state.discovery.result_limit),
        price_ok,
    );

    Ok(Json(DiscoveryResponse {
        total_count: ranked.len(),
        rides: ranked,
    }))
}

async fn get_ride_offers(
    State(state): State<AppState>,
    Query(params): Query<DiscoveryParams>,
) -> Result<Json<DiscoveryResponse>, AppError> {
    let max_price = params.max_price;
    discover(&state, RideType::Offer, params, |price| {
        max_price.map_or(true, |max| price <= max)
    })
    .await
}

async fn get_ride_requests(
    State(state): State<AppState>,
    Query(params): Query<DiscoveryParams>,
) -> Result<Json<DiscoveryResponse>, AppError> {
    // For requests the stored price is the passenger's ceiling; drivers
    // filter out requests paying less than their floor.
    let min_price = params.min_price;
    discover(&state, RideType::Request, params, |price| {
        min_price.map_or(true, |min| price >= min)
    })
    .await
}

async fn get_user_rides(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<UserRidesParams>,
) -> Result<Json<Vec<Ride>>, AppError> {
    state
        .store
        .get_user(user_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let rides = state
        .store
        .list_by_owner(user_id, params.ride_type, params.status)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(rides))
}

async fn load_owned_ride(state: &AppState, ride_id: Uuid, user_id: Uuid) -> Result<Ride, AppError> {
    let ride = state
        .store
        .get_ride(ride_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.owner_id != user_id {
        return Err(AppError::Forbidden(
            "Only the creator can modify this ride".to_string(),
        ));
    }

    Ok(ride)
}

async fn update_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
    Json(patch): Json<RidePatch>,
) -> Result<Json<Ride>, AppError> {
    let ride = load_owned_ride(&state, ride_id, owner.user_id).await?;

    if ride.is_terminal() {
        return Err(AppError::BadRequest(
            "Cannot update completed or cancelled ride".to_string(),
        ));
    }

    state
        .store
        .update_ride(ride_id, patch)
        .await
        .map_err(AppError::internal)?;

    let updated = state
        .store
        .get_ride(ride_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    Ok(Json(updated))
}

async fn cancel_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ride = load_owned_ride(&state, ride_id, owner.user_id).await?;

    if ride.status == RideStatus::Completed {
        return Err(AppError::BadRequest(
            "Cannot cancel completed ride".to_string(),
        ));
    }

    state
        .store
        .set_status(ride_id, RideStatus::Cancelled)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(ride_id = %ride_id, "ride cancelled");

    Ok(Json(
        serde_json::json!({ "message": "Ride cancelled successfully" }),
    ))
}
