use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ridepool_domain::{
    Booking, BookingRepository, BookingStatus, Notification, NotificationRepository, Notifier,
    RepoResult, Ride, RidePatch, RideRepository, RideStatus, RideType, UserProfile, UserRepository,
};
use ridepool_geo::Coordinate;
use ridepool_shared::NotificationEvent;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Last-known position of a user, fed by the location endpoints.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Presence {
    pub user_id: Uuid,
    pub position: Coordinate,
    pub address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Collections {
    rides: HashMap<Uuid, Ride>,
    bookings: HashMap<Uuid, Booking>,
    users: HashMap<Uuid, UserProfile>,
    notifications: HashMap<Uuid, Notification>,
    presence: HashMap<Uuid, Presence>,
}

/// In-memory document store implementing every repository port behind one
/// lock. Stands in for the external document backend; swap in a remote
/// adapter without touching the services built on the ports.
pub struct MemoryStore {
    inner: RwLock<Collections>,
    events: Option<broadcast::Sender<NotificationEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
            events: None,
        }
    }

    /// Forward every stored notification onto a broadcast channel, so live
    /// subscribers (the SSE feed) see writes as they happen.
    pub fn with_events(events: broadcast::Sender<NotificationEvent>) -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
            events: Some(events),
        }
    }

    pub async fn update_presence(
        &self,
        user_id: Uuid,
        position: Coordinate,
        address: Option<String>,
    ) -> Presence {
        let presence = Presence {
            user_id,
            position,
            address,
            updated_at: Utc::now(),
        };
        let mut inner = self.inner.write().await;
        inner.presence.insert(user_id, presence.clone());
        presence
    }

    /// Everyone with a recorded position except the requesting user.
    pub async fn other_presences(&self, user_id: Uuid) -> Vec<Presence> {
        let inner = self.inner.read().await;
        inner
            .presence
            .values()
            .filter(|p| p.user_id != user_id)
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_desc(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bookings
}

#[async_trait]
impl RideRepository for MemoryStore {
    async fn get_ride(&self, id: Uuid) -> RepoResult<Option<Ride>> {
        let inner = self.inner.read().await;
        Ok(inner.rides.get(&id).cloned())
    }

    async fn create_ride(&self, ride: &Ride) -> RepoResult<Uuid> {
        let mut inner = self.inner.write().await;
        inner.rides.insert(ride.id, ride.clone());
        Ok(ride.id)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        ride_type: Option<RideType>,
        status: Option<RideStatus>,
    ) -> RepoResult<Vec<Ride>> {
        let inner = self.inner.read().await;
        let mut rides: Vec<Ride> = inner
            .rides
            .values()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| ride_type.map_or(true, |t| r.ride_type == t))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rides)
    }

    async fn list_active(&self, ride_type: RideType) -> RepoResult<Vec<Ride>> {
        let inner = self.inner.read().await;
        let mut rides: Vec<Ride> = inner
            .rides
            .values()
            .filter(|r| r.ride_type == ride_type && r.status == RideStatus::Active)
            .cloned()
            .collect();
        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rides)
    }

    async fn update_ride(&self, id: Uuid, patch: RidePatch) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        let ride = inner
            .rides
            .get_mut(&id)
            .ok_or_else(|| format!("ride {} not found", id))?;
        if let Some(destination) = patch.destination {
            ride.destination = destination;
        }
        if let Some(departure_time) = patch.departure_time {
            ride.departure_time = departure_time;
        }
        if let Some(price_per_seat) = patch.price_per_seat {
            ride.price_per_seat = price_per_seat;
        }
        ride.updated_at = Utc::now();
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: RideStatus) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        let ride = inner
            .rides
            .get_mut(&id)
            .ok_or_else(|| format!("ride {} not found", id))?;
        ride.status = status;
        ride.updated_at = Utc::now();
        Ok(())
    }

    async fn compare_and_swap_seats(&self, id: Uuid, expected: i32, new: i32) -> RepoResult<bool> {
        // Check and write under a single write-lock acquisition, which is
        // what makes this the atomic step of the seat accounting.
        let mut inner = self.inner.write().await;
        let ride = inner
            .rides
            .get_mut(&id)
            .ok_or_else(|| format!("ride {} not found", id))?;
        if ride.seats_available != expected {
            debug!(ride_id = %id, expected, actual = ride.seats_available, "seat CAS missed");
            return Ok(false);
        }
        ride.seats_available = new;
        ride.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.get(&id).cloned())
    }

    async fn create_booking(&self, booking: &Booking) -> RepoResult<Uuid> {
        let mut inner = self.inner.write().await;
        inner.bookings.insert(booking.id, booking.clone());
        Ok(booking.id)
    }

    async fn find_active(&self, ride_id: Uuid, passenger_id: Uuid) -> RepoResult<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner
            .bookings
            .values()
            .find(|b| {
                b.ride_id == ride_id && b.passenger_id == passenger_id && b.status.is_open()
            })
            .cloned())
    }

    async fn list_by_passenger(
        &self,
        passenger_id: Uuid,
        status: Option<BookingStatus>,
    ) -> RepoResult<Vec<Booking>> {
        let inner = self.inner.read().await;
        Ok(sorted_desc(
            inner
                .bookings
                .values()
                .filter(|b| b.passenger_id == passenger_id)
                .filter(|b| status.map_or(true, |s| b.status == s))
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_driver(
        &self,
        driver_id: Uuid,
        status: Option<BookingStatus>,
    ) -> RepoResult<Vec<Booking>> {
        let inner = self.inner.read().await;
        Ok(sorted_desc(
            inner
                .bookings
                .values()
                .filter(|b| b.driver_id == driver_id)
                .filter(|b| status.map_or(true, |s| b.status == s))
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_ride(
        &self,
        ride_id: Uuid,
        status: Option<BookingStatus>,
    ) -> RepoResult<Vec<Booking>> {
        let inner = self.inner.read().await;
        Ok(sorted_desc(
            inner
                .bookings
                .values()
                .filter(|b| b.ride_id == ride_id)
                .filter(|b| status.map_or(true, |s| b.status == s))
                .cloned()
                .collect(),
        ))
    }

    async fn update_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.bookings.contains_key(&booking.id) {
            return Err(format!("booking {} not found", booking.id).into());
        }
        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn create_user(&self, user: &UserProfile) -> RepoResult<Uuid> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id, user.clone());
        Ok(user.id)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>> {
        let inner = self.inner.read().await;
        let mut notifications: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_read(&self, id: Uuid) -> RepoResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.notifications.get_mut(&id) {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl Notifier for MemoryStore {
    async fn notify(&self, notification: &Notification) -> RepoResult<()> {
        {
            let mut inner = self.inner.write().await;
            inner
                .notifications
                .insert(notification.id, notification.clone());
        }

        if let Some(events) = &self.events {
            // No receivers is fine; the feed is best effort.
            let _ = events.send(NotificationEvent {
                notification_id: notification.id,
                user_id: notification.user_id,
                kind: serde_json::to_value(notification.kind)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
                title: notification.title.clone(),
                message: notification.message.clone(),
                payload: notification.data.clone(),
                created_at: notification.created_at.timestamp(),
            });
        }

        Ok(())
    }
}
