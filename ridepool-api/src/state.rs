use ridepool_booking::BookingService;
use ridepool_shared::{LocationUpdateEvent, NotificationEvent};
use ridepool_store::app_config::{BookingRules, DiscoveryConfig};
use ridepool_store::MemoryStore;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub bookings: Arc<BookingService>,
    pub notification_tx: broadcast::Sender<NotificationEvent>,
    pub location_tx: broadcast::Sender<LocationUpdateEvent>,
    pub discovery: DiscoveryConfig,
    pub booking_rules: BookingRules,
}
