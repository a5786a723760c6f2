use chrono::{DateTime, Utc};
use ridepool_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display-level profile attached to rides and bookings. No credentials here;
/// authentication is handled outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub phone: Masked<String>,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(name: String, phone: String, rating: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone: Masked(phone),
            rating,
            created_at: Utc::now(),
        }
    }
}
