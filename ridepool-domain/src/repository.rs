use crate::booking::{Booking, BookingStatus};
use crate::notification::Notification;
use crate::ride::{Place, Ride, RideStatus, RideType};
use crate::user::UserProfile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Owner-editable ride fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RidePatch {
    pub destination: Option<Place>,
    pub departure_time: Option<DateTime<Utc>>,
    pub price_per_seat: Option<f64>,
}

/// Repository trait for ride documents
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn get_ride(&self, id: Uuid) -> RepoResult<Option<Ride>>;

    async fn create_ride(&self, ride: &Ride) -> RepoResult<Uuid>;

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        ride_type: Option<RideType>,
        status: Option<RideStatus>,
    ) -> RepoResult<Vec<Ride>>;

    async fn list_active(&self, ride_type: RideType) -> RepoResult<Vec<Ride>>;

    async fn update_ride(&self, id: Uuid, patch: RidePatch) -> RepoResult<()>;

    async fn set_status(&self, id: Uuid, status: RideStatus) -> RepoResult<()>;

    /// Conditionally write the seat counter: succeeds only if the stored
    /// value still equals `expected`. This is the single atomic step the
    /// accept/cancel seat math is built on.
    async fn compare_and_swap_seats(&self, id: Uuid, expected: i32, new: i32) -> RepoResult<bool>;
}

/// Repository trait for booking documents
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>>;

    async fn create_booking(&self, booking: &Booking) -> RepoResult<Uuid>;

    /// The (ride, passenger) booking currently in `pending` or `accepted`
    /// state, if any. At most one can exist.
    async fn find_active(&self, ride_id: Uuid, passenger_id: Uuid) -> RepoResult<Option<Booking>>;

    async fn list_by_passenger(
        &self,
        passenger_id: Uuid,
        status: Option<BookingStatus>,
    ) -> RepoResult<Vec<Booking>>;

    async fn list_by_driver(
        &self,
        driver_id: Uuid,
        status: Option<BookingStatus>,
    ) -> RepoResult<Vec<Booking>>;

    async fn list_by_ride(
        &self,
        ride_id: Uuid,
        status: Option<BookingStatus>,
    ) -> RepoResult<Vec<Booking>>;

    async fn update_booking(&self, booking: &Booking) -> RepoResult<()>;
}

/// Repository trait for user profiles
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<UserProfile>>;

    async fn create_user(&self, user: &UserProfile) -> RepoResult<Uuid>;
}

/// Repository trait for the notification inbox
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> RepoResult<Vec<Notification>>;

    /// Returns false when the notification does not exist.
    async fn mark_read(&self, id: Uuid) -> RepoResult<bool>;
}

/// Outbound notification dispatch. Fire-and-forget: callers log failures and
/// never let them fail the surrounding state transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> RepoResult<()>;
}
