use crate::error::{BookingAction, BookingError};
use ridepool_domain::{
    Booking, BookingRepository, BookingStatus, Notification, NotificationKind, Notifier, Place,
    RideRepository, RideStatus, UserRepository,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Retries for the conditional seat write before giving up on a contended pool.
const SEAT_CAS_RETRIES: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub ride_id: Uuid,
    pub passenger_id: Uuid,
    pub seats_requested: i32,
    pub pickup_location: Option<Place>,
    pub message: Option<String>,
}

/// Owns the booking state machine and the ride's seat accounting.
///
/// Seats are reserved at accept time, not at request time: a ride can field
/// pending requests beyond nominal capacity, and the true constraint is
/// enforced only at the moment of commitment. Callers must therefore expect
/// `CapacityExceeded` from an accept even though the matching create
/// succeeded.
pub struct BookingService {
    rides: Arc<dyn RideRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
    pub fn new(
        rides: Arc<dyn RideRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            rides,
            bookings,
            users,
            notifier,
        }
    }

    /// Create a pending booking request and notify the ride owner.
    pub async fn create(&self, req: CreateBooking) -> Result<Booking, BookingError> {
        if req.seats_requested < 1 {
            return Err(BookingError::InvalidSeatCount(req.seats_requested));
        }

        // 1. Load the ride
        let ride = self
            .rides
            .get_ride(req.ride_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Ride".to_string()))?;

        if ride.status != RideStatus::Active {
            return Err(BookingError::Conflict(
                "Ride is no longer active".to_string(),
            ));
        }

        // 2. Self-booking check
        if ride.owner_id == req.passenger_id {
            return Err(BookingError::Conflict(
                "You cannot book your own ride".to_string(),
            ));
        }

        // 3. Advisory capacity check; nothing is reserved until accept
        if ride.seats_available < req.seats_requested {
            return Err(BookingError::CapacityExceeded {
                requested: req.seats_requested,
                available: ride.seats_available,
            });
        }

        // 4. One open booking per (ride, passenger)
        if self
            .bookings
            .find_active(req.ride_id, req.passenger_id)
            .await?
            .is_some()
        {
            return Err(BookingError::Conflict(
                "You already have an active booking for this ride".to_string(),
            ));
        }

        // 5. Passenger profile feeds the denormalized display fields
        let passenger = self
            .users
            .get_user(req.passenger_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Passenger".to_string()))?;

        // 6. Insert the booking
        let booking = Booking::new(
            ride.id,
            ride.owner_id,
            &passenger,
            req.seats_requested,
            req.pickup_location,
            req.message.clone(),
        );
        self.bookings.create_booking(&booking).await?;
        info!(booking_id = %booking.id, ride_id = %ride.id, "booking request created");

        // 7. Tell the driver
        self.dispatch(Notification::new(
            ride.owner_id,
            NotificationKind::BookingRequest,
            "New Booking Request",
            format!(
                "{} wants to book {} seat(s) on your ride",
                passenger.name, req.seats_requested
            ),
            json!({
                "booking_id": booking.id,
                "ride_id": ride.id,
                "passenger_id": passenger.id,
                "passenger_name": passenger.name,
                "seats_requested": req.seats_requested,
                "passenger_message": req.message,
            }),
        ))
        .await;

        Ok(booking)
    }

    /// Drive an open booking through accept, reject or cancel.
    pub async fn transition(
        &self,
        booking_id: Uuid,
        action: BookingAction,
        actor_id: Uuid,
        message: Option<String>,
    ) -> Result<Booking, BookingError> {
        // 1. Load the booking; terminal statuses are sinks
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking".to_string()))?;

        if !booking.status.is_open() {
            return Err(BookingError::InvalidState(booking.status));
        }

        match action {
            BookingAction::Accept => {
                if actor_id != booking.driver_id {
                    return Err(BookingError::Forbidden(
                        "Only the driver can accept booking requests".to_string(),
                    ));
                }
                if booking.status != BookingStatus::Pending {
                    return Err(BookingError::InvalidState(booking.status));
                }

                // 2. Commit seats through the conditional write
                self.reserve_seats(booking.ride_id, booking.seats_booked)
                    .await?;

                booking.mark_accepted(message.clone());
                self.bookings.update_booking(&booking).await?;
                info!(booking_id = %booking.id, "booking accepted");

                let driver_name = self.display_name(booking.driver_id, "The driver").await;
                self.dispatch(Notification::new(
                    booking.passenger_id,
                    NotificationKind::BookingAccepted,
                    "Booking Accepted!",
                    format!("{} accepted your booking request", driver_name),
                    json!({
                        "booking_id": booking.id,
                        "ride_id": booking.ride_id,
                        "driver_id": booking.driver_id,
                        "driver_message": message,
                    }),
                ))
                .await;
            }

            BookingAction::Reject => {
                if actor_id != booking.driver_id {
                    return Err(BookingError::Forbidden(
                        "Only the driver can reject booking requests".to_string(),
                    ));
                }
                if booking.status != BookingStatus::Pending {
                    return Err(BookingError::InvalidState(booking.status));
                }

                // No seats were reserved for a pending booking
                booking.mark_rejected(message.clone());
                self.bookings.update_booking(&booking).await?;
                info!(booking_id = %booking.id, "booking rejected");

                let driver_name = self.display_name(booking.driver_id, "The driver").await;
                self.dispatch(Notification::new(
                    booking.passenger_id,
                    NotificationKind::BookingRejected,
                    "Booking Declined",
                    format!("{} declined your booking request", driver_name),
                    json!({
                        "booking_id": booking.id,
                        "ride_id": booking.ride_id,
                        "driver_message": message,
                    }),
                ))
                .await;
            }

            BookingAction::Cancel => {
                if actor_id != booking.driver_id && actor_id != booking.passenger_id {
                    return Err(BookingError::Forbidden(
                        "You don't have permission to cancel this booking".to_string(),
                    ));
                }

                // 2. An accepted booking gave seats away; return them
                if booking.status == BookingStatus::Accepted {
                    self.release_seats(booking.ride_id, booking.seats_booked)
                        .await?;
                }

                booking.mark_cancelled(actor_id, message.clone());
                self.bookings.update_booking(&booking).await?;
                info!(booking_id = %booking.id, cancelled_by = %actor_id, "booking cancelled");

                let notify_user_id = if actor_id == booking.passenger_id {
                    booking.driver_id
                } else {
                    booking.passenger_id
                };
                let canceller_name = self.display_name(actor_id, "User").await;
                self.dispatch(Notification::new(
                    notify_user_id,
                    NotificationKind::BookingCancelled,
                    "Booking Cancelled",
                    format!("{} cancelled the booking", canceller_name),
                    json!({
                        "booking_id": booking.id,
                        "ride_id": booking.ride_id,
                        "cancelled_by": actor_id,
                        "message": message,
                    }),
                ))
                .await;
            }
        }

        Ok(booking)
    }

    /// Decrement the seat pool with a compare-and-swap retry loop.
    async fn reserve_seats(&self, ride_id: Uuid, seats: i32) -> Result<(), BookingError> {
        for _ in 0..SEAT_CAS_RETRIES {
            let ride = self
                .rides
                .get_ride(ride_id)
                .await?
                .ok_or_else(|| BookingError::NotFound("Ride".to_string()))?;

            if ride.is_terminal() {
                return Err(BookingError::Conflict(
                    "Ride is no longer active".to_string(),
                ));
            }

            let available = ride.seats_available;
            let new_available = available - seats;
            if new_available < 0 {
                return Err(BookingError::CapacityExceeded {
                    requested: seats,
                    available,
                });
            }

            if self
                .rides
                .compare_and_swap_seats(ride_id, available, new_available)
                .await?
            {
                return Ok(());
            }
        }

        Err(BookingError::Conflict(
            "Seat pool is contended, try again".to_string(),
        ))
    }

    /// Return seats to the pool, clamped to the ride's capacity.
    async fn release_seats(&self, ride_id: Uuid, seats: i32) -> Result<(), BookingError> {
        for _ in 0..SEAT_CAS_RETRIES {
            let ride = match self.rides.get_ride(ride_id).await? {
                Some(ride) => ride,
                // Ride document gone; nothing to return seats to.
                None => return Ok(()),
            };

            let available = ride.seats_available;
            let new_available = (available + seats).min(ride.seats_total);

            if self
                .rides
                .compare_and_swap_seats(ride_id, available, new_available)
                .await?
            {
                return Ok(());
            }
        }

        Err(BookingError::Conflict(
            "Seat pool is contended, try again".to_string(),
        ))
    }

    async fn display_name(&self, user_id: Uuid, fallback: &str) -> String {
        match self.users.get_user(user_id).await {
            Ok(Some(user)) => user.name,
            _ => fallback.to_string(),
        }
    }

    /// Fire-and-forget dispatch; a failed notification never rolls back the
    /// transition it decorates.
    async fn dispatch(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(user_id = %notification.user_id, "notification dispatch failed: {}", e);
        }
    }
}
