use ridepool_api::{app, AppState};
use ridepool_booking::BookingService;
use ridepool_store::MemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridepool_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ridepool_store::Config::load()?;
    tracing::info!("Starting ridepool API on port {}", config.server.port);

    // Broadcast channels feeding the SSE subscribers
    let (notification_tx, _) = tokio::sync::broadcast::channel(100);
    let (location_tx, _) = tokio::sync::broadcast::channel(100);

    // Document store and the services built on its ports
    let store = Arc::new(MemoryStore::with_events(notification_tx.clone()));
    let bookings = Arc::new(BookingService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));

    let app_state = AppState {
        store,
        bookings,
        notification_tx,
        location_tx,
        discovery: config.discovery.clone(),
        booking_rules: config.booking.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
