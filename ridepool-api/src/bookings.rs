use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use ridepool_booking::{BookingAction, CreateBooking};
use ridepool_domain::{
    Booking, BookingRepository, BookingStatus, Place, Ride, RideRepository,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    ride_id: Uuid,
    passenger_id: Uuid,
    #[serde(default = "default_seats")]
    seats_requested: i32,
    pickup_location: Option<Place>,
    message: Option<String>,
}

fn default_seats() -> i32 {
    1
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: Uuid,
    ride_id: Uuid,
    driver_id: Uuid,
    seats_booked: i32,
    status: BookingStatus,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            ride_id: booking.ride_id,
            driver_id: booking.driver_id,
            seats_booked: booking.seats_booked,
            status: booking.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BookingActionRequest {
    action: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActorQuery {
    actor_id: Uuid,
}

#[derive(Debug, Serialize)]
struct BookingDetail {
    #[serde(flatten)]
    booking: Booking,
    ride: Option<Ride>,
}

#[derive(Debug, Deserialize)]
struct UserBookingsParams {
    status: Option<BookingStatus>,
    #[serde(default)]
    as_driver: bool,
    #[serde(default = "default_true")]
    as_passenger: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RideBookingsParams {
    status: Option<BookingStatus>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{booking_id}", get(get_booking))
        .route("/v1/bookings/{booking_id}/action", post(booking_action))
        .route("/v1/bookings/user/{user_id}", get(get_user_bookings))
        .route("/v1/bookings/ride/{ride_id}", get(get_ride_bookings))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    if req.seats_requested > state.booking_rules.max_seats_per_booking {
        return Err(AppError::BadRequest(format!(
            "Cannot request more than {} seats",
            state.booking_rules.max_seats_per_booking
        )));
    }

    let booking = state
        .bookings
        .create(CreateBooking {
            ride_id: req.ride_id,
            passenger_id: req.passenger_id,
            seats_requested: req.seats_requested,
            pickup_location: req.pickup_location,
            message: req.message,
        })
        .await?;

    Ok(Json(BookingResponse::from(&booking)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetail>, AppError> {
    let booking = state
        .store
        .get_booking(booking_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    // Enrich with the ride document when it still exists
    let ride = state
        .store
        .get_ride(booking.ride_id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(BookingDetail { booking, ride }))
}

async fn booking_action(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Query(actor): Query<ActorQuery>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let action = BookingAction::parse(&req.action)?;

    let booking = state
        .bookings
        .transition(booking_id, action, actor.actor_id, req.message)
        .await?;

    Ok(Json(BookingResponse::from(&booking)))
}

async fn get_user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<UserBookingsParams>,
) -> Result<Json<Vec<BookingDetail>>, AppError> {
    let mut bookings = Vec::new();

    if params.as_passenger {
        bookings.extend(
            state
                .store
                .list_by_passenger(user_id, params.status)
                .await
                .map_err(AppError::internal)?,
        );
    }
    if params.as_driver {
        bookings.extend(
            state
                .store
                .list_by_driver(user_id, params.status)
                .await
                .map_err(AppError::internal)?,
        );
    }
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut detailed = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let ride = state
            .store
            .get_ride(booking.ride_id)
            .await
            .map_err(AppError::internal)?;
        detailed.push(BookingDetail { booking, ride });
    }

    Ok(Json(detailed))
}

async fn get_ride_bookings(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Query(params): Query<RideBookingsParams>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .store
        .list_by_ride(ride_id, params.status)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(bookings))
}
