use crate::ride::Place;
use crate::user::UserProfile;
use chrono::{DateTime, Utc};
use ridepool_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    /// Open bookings are the only ones a transition may act on.
    pub fn is_open(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Accepted)
    }
}

/// A passenger's claim on seats of a ride.
///
/// Driver id and passenger display fields are denormalized at creation time
/// so booking lists render without extra lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub seats_booked: i32,
    pub status: BookingStatus,
    pub passenger_name: String,
    pub passenger_phone: Masked<String>,
    pub passenger_rating: f64,
    pub pickup_location: Option<Place>,
    pub passenger_message: Option<String>,
    pub driver_message: Option<String>,
    pub cancellation_message: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn new(
        ride_id: Uuid,
        driver_id: Uuid,
        passenger: &UserProfile,
        seats_booked: i32,
        pickup_location: Option<Place>,
        passenger_message: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ride_id,
            passenger_id: passenger.id,
            driver_id,
            seats_booked,
            status: BookingStatus::Pending,
            passenger_name: passenger.name.clone(),
            passenger_phone: passenger.phone.clone(),
            passenger_rating: passenger.rating,
            pickup_location,
            passenger_message,
            driver_message: None,
            cancellation_message: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
            accepted_at: None,
            rejected_at: None,
            cancelled_at: None,
        }
    }

    pub fn mark_accepted(&mut self, driver_message: Option<String>) {
        let now = Utc::now();
        self.status = BookingStatus::Accepted;
        self.driver_message = driver_message;
        self.accepted_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_rejected(&mut self, driver_message: Option<String>) {
        let now = Utc::now();
        self.status = BookingStatus::Rejected;
        self.driver_message = driver_message;
        self.rejected_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_cancelled(&mut self, actor_id: Uuid, message: Option<String>) {
        let now = Utc::now();
        self.status = BookingStatus::Cancelled;
        self.cancelled_by = Some(actor_id);
        self.cancellation_message = message;
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger() -> UserProfile {
        UserProfile::new("Asha".to_string(), "+91-98100-00000".to_string(), 4.7)
    }

    #[test]
    fn test_new_booking_is_pending_with_denormalized_fields() {
        let p = passenger();
        let booking = Booking::new(Uuid::new_v4(), Uuid::new_v4(), &p, 2, None, None);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.passenger_name, "Asha");
        assert_eq!(booking.passenger_id, p.id);
        assert!(booking.status.is_open());
    }

    #[test]
    fn test_terminal_statuses_are_not_open() {
        assert!(!BookingStatus::Rejected.is_open());
        assert!(!BookingStatus::Cancelled.is_open());
        assert!(BookingStatus::Pending.is_open());
        assert!(BookingStatus::Accepted.is_open());
    }

    #[test]
    fn test_cancel_records_actor_and_timestamps() {
        let p = passenger();
        let actor = p.id;
        let mut booking = Booking::new(Uuid::new_v4(), Uuid::new_v4(), &p, 1, None, None);
        booking.mark_cancelled(actor, Some("change of plans".to_string()));
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.cancelled_by, Some(actor));
        assert!(booking.cancelled_at.is_some());
    }
}
