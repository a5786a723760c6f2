use chrono::{DateTime, Utc};
use ridepool_geo::Coordinate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether the owner is driving or looking for a driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RideType {
    Offer,
    Request,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Active,
    Completed,
    Cancelled,
}

/// An address paired with its coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub address: String,
    #[serde(flatten)]
    pub position: Coordinate,
}

/// A driver-offered or passenger-requested trip with a seat pool.
///
/// `seats_available` only moves when a booking is accepted or an accepted
/// booking is cancelled, and always stays within `0..=seats_total`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub ride_type: RideType,
    pub origin: Place,
    pub destination: Place,
    pub departure_time: DateTime<Utc>,
    pub seats_total: i32,
    pub seats_available: i32,
    pub price_per_seat: f64,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    pub fn new(
        owner_id: Uuid,
        ride_type: RideType,
        origin: Place,
        destination: Place,
        departure_time: DateTime<Utc>,
        seats: i32,
        price_per_seat: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            ride_type,
            origin,
            destination,
            departure_time,
            seats_total: seats,
            seats_available: seats,
            price_per_seat,
            status: RideStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Terminal rides are immutable to booking actions and owner edits.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RideStatus::Completed | RideStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_geo::Coordinate;

    fn place(lat: f64, lon: f64) -> Place {
        Place {
            address: "somewhere".to_string(),
            position: Coordinate::new(lat, lon).unwrap(),
        }
    }

    #[test]
    fn test_new_ride_starts_active_with_full_pool() {
        let ride = Ride::new(
            Uuid::new_v4(),
            RideType::Offer,
            place(28.61, 77.21),
            place(28.70, 77.10),
            Utc::now(),
            3,
            150.0,
        );
        assert_eq!(ride.status, RideStatus::Active);
        assert_eq!(ride.seats_available, 3);
        assert_eq!(ride.seats_total, 3);
        assert!(!ride.is_terminal());
    }

    #[test]
    fn test_status_wire_format_matches_store() {
        assert_eq!(
            serde_json::to_string(&RideStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&RideType::Offer).unwrap(),
            "\"offer\""
        );
    }
}
